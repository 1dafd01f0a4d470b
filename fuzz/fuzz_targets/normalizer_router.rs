#![no_main]

use honeywatch_detection::normalizer::{NormalizerRouter, normalize_batch};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let router = NormalizerRouter::with_defaults();
    // 줄 단위 배치: 엔트리 수 + 건너뛴 수 == 비어 있지 않은 줄 수
    let lines: Vec<&[u8]> = data.split(|&b| b == b'\n').collect();
    let non_blank = lines
        .iter()
        .filter(|l| !l.iter().all(u8::is_ascii_whitespace))
        .count();
    let batch = normalize_batch(&router, lines);
    assert_eq!(batch.entries.len() + batch.skipped, non_blank);
});
