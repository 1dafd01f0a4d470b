#![no_main]

use honeywatch_core::pipeline::Normalizer;
use honeywatch_detection::normalizer::S3AccessLogNormalizer;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let normalizer = S3AccessLogNormalizer::new();
    let _ = normalizer.normalize(data);
});
