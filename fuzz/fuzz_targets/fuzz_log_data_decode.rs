#![no_main]

use bactlv_core::constructed::LogData;
use bactlv_core::encoding::writer::Encode;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(log) = LogData::parse(data, 1) {
        let encoded = log.to_bytes().expect("decoded values re-encode");
        assert_eq!(encoded, data);
        let _ = log.render_boxed();
    }
});
