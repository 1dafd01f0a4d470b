//! 패턴 탐지기 모음
//!
//! 각 탐지기는 core의 [`Detector`] trait을 구현하는 상태 없는 구조체입니다.
//! 분석 창 전체 배치를 받아 출발지 IP별로 묶고, 조건을 만족하는 IP마다
//! 최대 하나의 [`SecurityEvent`](honeywatch_core::types::SecurityEvent)를 만듭니다.
//!
//! 공통 규칙:
//! - `source_ip`가 빈 엔트리는 어떤 그룹에도 속하지 않습니다.
//! - 슬라이딩 창 탐지기는 시간순으로 창을 훑어 처음 만족한 창만 보고합니다.
//! - 시간 범위가 0 이하이면 비율 필드는 생략합니다.
//! - IP 그룹은 `BTreeMap`으로 관리하여 결과 순서가 입력 순서에 의존하지 않습니다.

mod abnormal_hours;
mod beaconing;
mod bulk_download;
mod credential_stuffing;
mod data_exfiltration;
mod failed_access;
mod port_scanning;
mod rapid_access;
mod suspicious_user_agent;

pub use abnormal_hours::AbnormalHoursDetector;
pub use beaconing::BeaconingDetector;
pub use bulk_download::BulkDownloadDetector;
pub use credential_stuffing::CredentialStuffingDetector;
pub use data_exfiltration::DataExfiltrationDetector;
pub use failed_access::FailedAccessDetector;
pub use port_scanning::PortScanningDetector;
pub use rapid_access::RapidAccessDetector;
pub use suspicious_user_agent::SuspiciousUserAgentDetector;

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, TimeDelta, Utc};
use honeywatch_core::pipeline::Detector;
use honeywatch_core::types::AccessLogEntry;

/// 실행 순서대로 정렬된 기본 탐지기 목록
///
/// 순서는 [`EventType::ALL`](honeywatch_core::types::EventType::ALL)과 같습니다.
pub fn default_detectors() -> Vec<Box<dyn Detector>> {
    vec![
        Box::new(BulkDownloadDetector),
        Box::new(RapidAccessDetector),
        Box::new(AbnormalHoursDetector),
        Box::new(SuspiciousUserAgentDetector),
        Box::new(FailedAccessDetector),
        Box::new(CredentialStuffingDetector),
        Box::new(DataExfiltrationDetector),
        Box::new(PortScanningDetector),
        Box::new(BeaconingDetector),
    ]
}

/// 조건을 만족하는 엔트리를 출발지 IP별로 묶습니다.
///
/// 각 그룹은 타임스탬프 순으로 정렬됩니다. 같은 시각의 엔트리는 리소스,
/// User-Agent, 상태 코드 순으로 정렬하여 입력 순서에 의존하지 않습니다.
pub(crate) fn group_by_ip<'a, F>(
    entries: &'a [AccessLogEntry],
    keep: F,
) -> BTreeMap<&'a str, Vec<&'a AccessLogEntry>>
where
    F: Fn(&AccessLogEntry) -> bool,
{
    let mut groups: BTreeMap<&str, Vec<&AccessLogEntry>> = BTreeMap::new();
    for entry in entries {
        if entry.source_ip.is_empty() || !keep(entry) {
            continue;
        }
        groups.entry(entry.source_ip.as_str()).or_default().push(entry);
    }
    for group in groups.values_mut() {
        group.sort_by(|a, b| {
            (a.timestamp, &a.resource, &a.user_agent, a.http_status, a.bytes_estimate).cmp(&(
                b.timestamp,
                &b.resource,
                &b.user_agent,
                b.http_status,
                b.bytes_estimate,
            ))
        });
    }
    groups
}

/// 두 시각 사이의 초 (밀리초 정밀도)
pub(crate) fn span_secs(first: DateTime<Utc>, last: DateTime<Utc>) -> f64 {
    (last - first).num_milliseconds() as f64 / 1000.0
}

/// 소수 둘째 자리 반올림
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `count / span`을 계산합니다. 범위가 0 이하이면 `None`.
pub(crate) fn rate(count: f64, span: f64) -> Option<f64> {
    (span > 0.0).then(|| round2(count / span))
}

/// 시간순 정렬된 그룹에서 `threshold`개 엔트리가 `window` 안에 들어오는
/// 첫 번째 창을 찾습니다.
///
/// 창은 시작 엔트리부터 `window` 안에 있는 모든 엔트리를 포함하도록
/// 확장되어 반환됩니다.
pub(crate) fn first_dense_window<'g, 'a>(
    sorted: &'g [&'a AccessLogEntry],
    threshold: usize,
    window: TimeDelta,
) -> Option<&'g [&'a AccessLogEntry]> {
    if threshold == 0 || sorted.len() < threshold {
        return None;
    }
    (0..=sorted.len() - threshold)
        .find(|&i| sorted[i + threshold - 1].timestamp - sorted[i].timestamp <= window)
        .map(|start| window_from(sorted, start, window))
}

/// `start`부터 `window` 안에 있는 엔트리 구간
fn window_from<'g, 'a>(
    sorted: &'g [&'a AccessLogEntry],
    start: usize,
    window: TimeDelta,
) -> &'g [&'a AccessLogEntry] {
    let origin = sorted[start].timestamp;
    let len = sorted[start..]
        .iter()
        .take_while(|e| e.timestamp - origin <= window)
        .count();
    &sorted[start..start + len]
}

/// 엔트리 묶음이 가리키는 대상 요약
///
/// 고유 리소스가 하나면 그 키를, 여러 개면 `"N resources"`를 돌려줍니다.
pub(crate) fn resource_summary(entries: &[&AccessLogEntry]) -> String {
    let unique: BTreeSet<&str> = entries.iter().map(|e| e.resource.as_str()).collect();
    match unique.len() {
        1 => unique.into_iter().next().unwrap_or_default().to_owned(),
        n => format!("{n} resources"),
    }
}

/// 설정값 초를 `TimeDelta`로 변환합니다. 범위를 넘으면 최대값으로 고정합니다.
pub(crate) fn secs(value: u64) -> TimeDelta {
    i64::try_from(value)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .unwrap_or(TimeDelta::MAX)
}
