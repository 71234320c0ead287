#![no_main]

use bactlv_core::constructed::{ConstructedData, ParseArgs};
use bactlv_core::encoding::writer::Encode;
use bactlv_core::types::{ObjectType, PropertyId};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&selector, bytes)) = data.split_first() else {
        return;
    };
    let object_type = ObjectType::from_u16(u16::from(selector & 0x1F));
    let property = match selector >> 5 {
        0 => PropertyId::ObjectName,
        1 => PropertyId::StatusFlags,
        2 => PropertyId::ObjectList,
        3 => PropertyId::PresentValue,
        _ => PropertyId::Proprietary(512),
    };
    let mut args = ParseArgs::new(3, object_type, property);
    if selector & 0x80 != 0 {
        args = args.with_array_index(0);
    }
    if let Ok(value) = ConstructedData::parse(bytes, &args) {
        let encoded = value.to_bytes().expect("decoded values re-encode");
        assert_eq!(encoded, bytes);
    }
});
