//! 주기적 접근(비코닝) 탐지

use honeywatch_core::config::Thresholds;
use honeywatch_core::pipeline::Detector;
use honeywatch_core::types::{AccessLogEntry, EventType, SecurityEvent};

use super::{group_by_ip, round2, span_secs};

/// 요청 간격이 거의 일정한 IP를 찾습니다.
///
/// 요청이 `beaconing_min_samples`개 이상이고, 간격의 변동계수
/// (모표준편차 / 평균)가 `beaconing_max_cv` 미만이면 보고합니다.
/// 평균 간격이 0 이하이면 (모든 요청이 같은 시각) 보고하지 않습니다.
pub struct BeaconingDetector;

impl Detector for BeaconingDetector {
    fn event_type(&self) -> EventType {
        EventType::BeaconingPattern
    }

    fn detect(&self, entries: &[AccessLogEntry], thresholds: &Thresholds) -> Vec<SecurityEvent> {
        group_by_ip(entries, |_| true)
            .into_iter()
            .filter(|(_, requests)| requests.len() >= thresholds.beaconing_min_samples)
            .filter_map(|(ip, requests)| {
                let intervals: Vec<f64> = requests
                    .windows(2)
                    .map(|pair| span_secs(pair[0].timestamp, pair[1].timestamp))
                    .collect();
                let cv = coefficient_of_variation(&intervals)?;
                if cv >= thresholds.beaconing_max_cv {
                    return None;
                }

                let mean = intervals.iter().sum::<f64>() / intervals.len() as f64;
                let last = requests.last()?;

                Some(
                    SecurityEvent::new(
                        self.event_type(),
                        last.timestamp,
                        ip,
                        format!("{} requests", requests.len()),
                    )
                        .with_detail("average_interval_seconds", round2(mean))
                        .with_detail("interval_cv", round2(cv))
                        .with_detail("request_count", requests.len())
                        .with_detail("pattern_type", "automated_scheduled"),
                )
            })
            .collect()
    }
}

/// 변동계수. 표본이 없거나 평균이 0 이하이면 `None`.
fn coefficient_of_variation(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    if mean <= 0.0 {
        return None;
    }
    let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    Some(variance.sqrt() / mean)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use honeywatch_core::types::{DetailValue, Severity};

    #[test]
    fn fires_on_fixed_interval() {
        let entries: Vec<_> = (0..6).map(|i| entry("10.9.8.7", i * 300)).collect();
        let events = BeaconingDetector.detect(&entries, &Thresholds::default());

        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.severity, Severity::Medium);
        assert_eq!(event.details["average_interval_seconds"], DetailValue::Float(300.0));
        assert_eq!(event.details["interval_cv"], DetailValue::Float(0.0));
        assert_eq!(event.details["request_count"], DetailValue::Integer(6));
        assert_eq!(
            event.details["pattern_type"],
            DetailValue::Text("automated_scheduled".to_owned())
        );
    }

    #[test]
    fn small_jitter_still_fires() {
        let offsets = [0, 301, 599, 902, 1198, 1500];
        let entries: Vec<_> = offsets.iter().map(|&s| entry("10.9.8.7", s)).collect();
        assert_eq!(BeaconingDetector.detect(&entries, &Thresholds::default()).len(), 1);
    }

    #[test]
    fn irregular_intervals_do_not_fire() {
        let offsets = [0, 10, 400, 420, 1500, 1600];
        let entries: Vec<_> = offsets.iter().map(|&s| entry("10.9.8.7", s)).collect();
        assert!(BeaconingDetector.detect(&entries, &Thresholds::default()).is_empty());
    }

    #[test]
    fn too_few_samples_do_not_fire() {
        let entries: Vec<_> = (0..4).map(|i| entry("10.9.8.7", i * 300)).collect();
        assert!(BeaconingDetector.detect(&entries, &Thresholds::default()).is_empty());
    }

    #[test]
    fn simultaneous_requests_do_not_fire() {
        let entries: Vec<_> = (0..8).map(|_| entry("10.9.8.7", 0)).collect();
        assert!(BeaconingDetector.detect(&entries, &Thresholds::default()).is_empty());
    }

    #[test]
    fn cv_of_constant_series_is_zero() {
        assert_eq!(coefficient_of_variation(&[5.0, 5.0, 5.0]), Some(0.0));
        assert_eq!(coefficient_of_variation(&[]), None);
        assert_eq!(coefficient_of_variation(&[0.0, 0.0]), None);
    }
}
