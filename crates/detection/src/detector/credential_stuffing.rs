//! 자격 증명 대입 공격 탐지

use honeywatch_core::config::Thresholds;
use honeywatch_core::pipeline::Detector;
use honeywatch_core::types::{AccessLogEntry, EventType, SecurityEvent};

use super::{first_dense_window, group_by_ip, rate, resource_summary, round2, secs, span_secs};

/// 인증 실패(401/403)가 `credential_stuffing_threshold`건 이상
/// `credential_stuffing_window_secs` 안에 몰린 경우
pub struct CredentialStuffingDetector;

impl Detector for CredentialStuffingDetector {
    fn event_type(&self) -> EventType {
        EventType::CredentialStuffing
    }

    fn detect(&self, entries: &[AccessLogEntry], thresholds: &Thresholds) -> Vec<SecurityEvent> {
        let window = secs(thresholds.credential_stuffing_window_secs);

        group_by_ip(entries, |e| matches!(e.http_status, 401 | 403))
            .into_iter()
            .filter_map(|(ip, failures)| {
                let burst =
                    first_dense_window(&failures, thresholds.credential_stuffing_threshold, window)?;
                let first = burst.first()?;
                let last = burst.last()?;
                let span = span_secs(first.timestamp, last.timestamp);

                let mut event = SecurityEvent::new(
                    self.event_type(),
                    last.timestamp,
                    ip,
                    resource_summary(burst),
                )
                .with_detail("failed_attempts", burst.len())
                .with_detail("time_span", round2(span));
                if let Some(r) = rate(burst.len() as f64, span) {
                    event = event.with_detail("attack_rate", r);
                }
                Some(event)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use honeywatch_core::types::{DetailValue, Severity};

    #[test]
    fn fires_on_burst_of_auth_failures() {
        let entries: Vec<_> = (0..6)
            .map(|i| with_status(entry("198.51.100.7", i * 5), if i % 2 == 0 { 401 } else { 403 }))
            .collect();
        let events = CredentialStuffingDetector.detect(&entries, &Thresholds::default());

        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.severity, Severity::High);
        assert_eq!(event.details["failed_attempts"], DetailValue::Integer(6));
        assert_eq!(event.details["time_span"], DetailValue::Float(25.0));
        assert_eq!(event.details["attack_rate"], DetailValue::Float(0.24));
    }

    #[test]
    fn not_found_does_not_count() {
        let entries: Vec<_> = (0..6)
            .map(|i| with_status(entry("198.51.100.7", i), 404))
            .collect();
        assert!(CredentialStuffingDetector
            .detect(&entries, &Thresholds::default())
            .is_empty());
    }

    #[test]
    fn slow_failures_do_not_fire() {
        let entries: Vec<_> = (0..6)
            .map(|i| with_status(entry("198.51.100.7", i * 30), 401))
            .collect();
        assert!(CredentialStuffingDetector
            .detect(&entries, &Thresholds::default())
            .is_empty());
    }

    #[test]
    fn threshold_boundary() {
        let failures = |n: i64| -> Vec<AccessLogEntry> {
            (0..n).map(|i| with_status(entry("198.51.100.7", i), 401)).collect()
        };
        assert!(CredentialStuffingDetector
            .detect(&failures(4), &Thresholds::default())
            .is_empty());
        let events = CredentialStuffingDetector.detect(&failures(5), &Thresholds::default());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].details["failed_attempts"], DetailValue::Integer(5));
    }

    #[test]
    fn window_bound_is_inclusive() {
        // 5건이 정확히 60초 -> 탐지, 61초 -> 미탐지
        let spread = |last: i64| -> Vec<AccessLogEntry> {
            [0, 10, 20, 30, last]
                .iter()
                .map(|&s| with_status(entry("198.51.100.7", s), 403))
                .collect()
        };
        assert_eq!(
            CredentialStuffingDetector.detect(&spread(60), &Thresholds::default()).len(),
            1
        );
        assert!(CredentialStuffingDetector
            .detect(&spread(61), &Thresholds::default())
            .is_empty());
    }
}
