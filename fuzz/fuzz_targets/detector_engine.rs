#![no_main]

use arbitrary::Arbitrary;
use chrono::{TimeDelta, TimeZone, Utc};
use libfuzzer_sys::fuzz_target;

use honeywatch_core::config::Thresholds;
use honeywatch_core::types::{AccessLogEntry, Operation};
use honeywatch_detection::run_all;

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzEntry {
    /// 기준 시각으로부터의 오프셋 (초, 하루 이내로 제한)
    offset_secs: u32,
    /// 작은 IP 풀에서 선택 (그룹이 생기도록)
    ip: u8,
    resource: u8,
    get: bool,
    status: u16,
    user_agent: String,
    bytes: Option<u64>,
}

fuzz_target!(|input: Vec<FuzzEntry>| {
    let base = match Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).single() {
        Some(t) => t,
        None => return,
    };

    // 엔트리 수 제한 (성능)
    let entries: Vec<AccessLogEntry> = input
        .iter()
        .take(256)
        .map(|e| AccessLogEntry {
            timestamp: base + TimeDelta::seconds(i64::from(e.offset_secs % 86_400)),
            source_ip: format!("10.0.0.{}", e.ip % 8),
            resource: format!("keys/{}.json", e.resource % 32),
            operation: if e.get { Operation::Get } else { Operation::Put },
            http_status: e.status,
            user_agent: e.user_agent.clone(),
            bytes_estimate: e.bytes,
        })
        .collect();

    let thresholds = Thresholds::default();
    let first = run_all(&entries, &thresholds);

    // 같은 입력은 같은 결과
    assert_eq!(first, run_all(&entries, &thresholds));

    // (종류, IP)당 최대 한 건
    let mut keys: Vec<_> = first.iter().map(|e| (e.event_type, e.source_ip.clone())).collect();
    let total = keys.len();
    keys.dedup();
    assert_eq!(keys.len(), total);
});
