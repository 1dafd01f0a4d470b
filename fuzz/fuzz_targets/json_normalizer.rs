#![no_main]

use honeywatch_core::pipeline::Normalizer;
use honeywatch_detection::normalizer::{JsonFieldMapping, JsonRecordNormalizer};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // 세 가지 필드 매핑 모두 같은 입력으로 시험
    for mapping in [
        JsonFieldMapping::default(),
        JsonFieldMapping::cloudwatch(),
        JsonFieldMapping::gcp(),
    ] {
        let _ = JsonRecordNormalizer::new(mapping).normalize(data);
    }
});
