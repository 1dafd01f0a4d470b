//! 업무 외 시간 접근 탐지

use chrono::Timelike;
use honeywatch_core::config::Thresholds;
use honeywatch_core::pipeline::Detector;
use honeywatch_core::types::{AccessLogEntry, EventType, SecurityEvent};

use super::{group_by_ip, resource_summary};

/// UTC `[off_hours_start, off_hours_end)` 시간대 요청이 `off_hours_min_count`건 이상인 경우
pub struct AbnormalHoursDetector;

impl Detector for AbnormalHoursDetector {
    fn event_type(&self) -> EventType {
        EventType::AbnormalHours
    }

    fn detect(&self, entries: &[AccessLogEntry], thresholds: &Thresholds) -> Vec<SecurityEvent> {
        let hours = thresholds.off_hours_start..thresholds.off_hours_end;

        group_by_ip(entries, |e| hours.contains(&e.timestamp.hour()))
            .into_iter()
            .filter(|(_, group)| group.len() >= thresholds.off_hours_min_count)
            .filter_map(|(ip, group)| {
                let first = group.first()?;
                let last = group.last()?;
                Some(
                    SecurityEvent::new(self.event_type(), last.timestamp, ip, resource_summary(&group))
                        .with_detail("access_count", group.len())
                        .with_detail(
                            "time_range",
                            format!(
                                "{:02}:00-{:02}:00 UTC",
                                thresholds.off_hours_start, thresholds.off_hours_end
                            ),
                        )
                        .with_detail("first_access", first.timestamp.to_rfc3339())
                        .with_detail("last_access", last.timestamp.to_rfc3339()),
                )
            })
            .collect()
    }
}
