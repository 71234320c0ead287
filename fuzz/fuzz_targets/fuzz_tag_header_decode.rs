#![no_main]

use bactlv_core::encoding::reader::ReadBuffer;
use bactlv_core::encoding::tag::TagHeader;
use bactlv_core::encoding::writer::Encode;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut r = ReadBuffer::new(data);
    if let Ok(header) = TagHeader::decode(&mut r) {
        let consumed = r.pos().byte_offset();
        let bytes = header.to_bytes().expect("decoded headers re-encode");
        assert_eq!(bytes, &data[..consumed]);
    }
});
