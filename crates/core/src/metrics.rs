//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 크레이트는 이 상수를 사용하여 `metrics::counter!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//! 레코더가 설치되지 않으면 기록은 아무 동작도 하지 않습니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `honeywatch_`
//! - 단계명: `normalize_`, `detection_`, `store_`, `alerts_`, `pass_`
//! - 접미어: `_total` (counter), `_seconds` (histogram)
//!
//! # 사용 예시
//!
//! ```ignore
//! use honeywatch_core::metrics as hw_metrics;
//!
//! metrics::counter!(hw_metrics::STORE_EVENTS_STORED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 이벤트 종류 레이블 키 (bulk_download, rapid_access, ...)
pub const LABEL_EVENT_TYPE: &str = "event_type";

/// 심각도 레이블 키 (low, medium, high, critical)
pub const LABEL_SEVERITY: &str = "severity";

/// 알림 채널 레이블 키 (slack, email, log)
pub const LABEL_CHANNEL: &str = "channel";

/// 입력 형식 레이블 키 (s3, json)
pub const LABEL_FORMAT: &str = "format";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

// ─── Normalize ─────────────────────────────────────────────────────

/// 정규화에 성공한 엔트리 수 (counter)
pub const NORMALIZE_ENTRIES_TOTAL: &str = "honeywatch_normalize_entries_total";

/// 정규화 실패로 제외된 레코드 수 (counter)
pub const NORMALIZE_SKIPPED_TOTAL: &str = "honeywatch_normalize_skipped_total";

// ─── Detection ─────────────────────────────────────────────────────

/// 탐지된 이벤트 수 (counter, label: event_type, severity)
pub const DETECTION_EVENTS_TOTAL: &str = "honeywatch_detection_events_total";

/// 탐지 엔진 실행 시간 (histogram, 초)
pub const DETECTION_DURATION_SECONDS: &str = "honeywatch_detection_duration_seconds";

// ─── Store ─────────────────────────────────────────────────────────

/// 새로 저장된 이벤트 수 (counter)
pub const STORE_EVENTS_STORED_TOTAL: &str = "honeywatch_store_events_stored_total";

/// 중복으로 판정된 이벤트 수 (counter)
pub const STORE_DUPLICATES_TOTAL: &str = "honeywatch_store_duplicates_total";

// ─── Alerts ────────────────────────────────────────────────────────

/// 전송된 알림 수 (counter, label: channel, result)
pub const ALERTS_NOTIFICATIONS_TOTAL: &str = "honeywatch_alerts_notifications_total";

// ─── Pass ──────────────────────────────────────────────────────────

/// 완료된 분석 패스 수 (counter, label: result)
pub const PASS_RUNS_TOTAL: &str = "honeywatch_pass_runs_total";

/// 분석 패스 전체 실행 시간 (histogram, 초)
pub const PASS_DURATION_SECONDS: &str = "honeywatch_pass_duration_seconds";

/// 결과 없이 중단된 탐지기 태스크 수 (counter, label: event_type)
pub const DETECTION_DETECTOR_FAILURES_TOTAL: &str = "honeywatch_detection_detector_failures_total";

/// 모든 메트릭의 설명을 등록합니다.
///
/// 레코더 설치 직후 한 번 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(
        NORMALIZE_ENTRIES_TOTAL,
        "Total number of access log records normalized"
    );
    describe_counter!(
        NORMALIZE_SKIPPED_TOTAL,
        "Total number of malformed access log records skipped"
    );
    describe_counter!(
        DETECTION_EVENTS_TOTAL,
        "Security events produced by detectors (by event_type, severity)"
    );
    describe_counter!(
        DETECTION_DETECTOR_FAILURES_TOTAL,
        "Detector tasks that ended without a result (by event_type)"
    );
    describe_histogram!(
        DETECTION_DURATION_SECONDS,
        "Detector engine latency per analysis pass in seconds"
    );
    describe_counter!(
        STORE_EVENTS_STORED_TOTAL,
        "Security events stored for the first time"
    );
    describe_counter!(
        STORE_DUPLICATES_TOTAL,
        "Security events suppressed as duplicates of an overlapping window"
    );
    describe_counter!(
        ALERTS_NOTIFICATIONS_TOTAL,
        "Notification attempts per channel (by channel, result)"
    );
    describe_counter!(
        PASS_RUNS_TOTAL,
        "Completed analysis passes (by result)"
    );
    describe_histogram!(
        PASS_DURATION_SECONDS,
        "End-to-end analysis pass latency in seconds"
    );
}
