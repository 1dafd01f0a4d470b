//! 자동화 도구 User-Agent 탐지

use honeywatch_core::config::Thresholds;
use honeywatch_core::pipeline::Detector;
use honeywatch_core::types::{AccessLogEntry, EventType, SecurityEvent};

use super::group_by_ip;

/// User-Agent에 자동화 도구 패턴이 들어 있는 요청이 한 건이라도 있는 경우
///
/// 비교는 대소문자를 구분하지 않는 부분 문자열 일치입니다.
pub struct SuspiciousUserAgentDetector;

impl SuspiciousUserAgentDetector {
    fn matched_pattern<'p>(user_agent: &str, patterns: &'p [String]) -> Option<&'p str> {
        let ua = user_agent.to_lowercase();
        patterns
            .iter()
            .find(|p| ua.contains(&p.to_lowercase()))
            .map(String::as_str)
    }
}

impl Detector for SuspiciousUserAgentDetector {
    fn event_type(&self) -> EventType {
        EventType::SuspiciousUserAgent
    }

    fn detect(&self, entries: &[AccessLogEntry], thresholds: &Thresholds) -> Vec<SecurityEvent> {
        let patterns = &thresholds.suspicious_user_agents;

        group_by_ip(entries, |e| Self::matched_pattern(&e.user_agent, patterns).is_some())
            .into_iter()
            .filter_map(|(ip, group)| {
                let first = group.first()?;
                let last = group.last()?;
                let pattern = Self::matched_pattern(&first.user_agent, patterns)?;
                let noun = if group.len() == 1 { "request" } else { "requests" };

                Some(
                    SecurityEvent::new(
                        self.event_type(),
                        last.timestamp,
                        ip,
                        format!("{} {noun}", group.len()),
                    )
                    .with_detail("user_agent", first.user_agent.as_str())
                    .with_detail("matched_pattern", pattern)
                    .with_detail("request_count", group.len())
                    .with_detail("reason", "automated tool detected"),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use honeywatch_core::types::DetailValue;

    fn with_ua(mut e: AccessLogEntry, ua: &str) -> AccessLogEntry {
        e.user_agent = ua.to_owned();
        e
    }

    #[test]
    fn detects_tool_user_agents_case_insensitively() {
        let entries = vec![
            with_ua(entry("10.0.0.1", 0), "curl/7.68.0"),
            with_ua(entry("10.0.0.2", 1), "Python-urllib/3.11"),
            with_ua(entry("10.0.0.3", 2), "Mozilla/5.0 (X11; Linux x86_64)"),
        ];
        let events = SuspiciousUserAgentDetector.detect(&entries, &Thresholds::default());

        let ips: Vec<_> = events.iter().map(|e| e.source_ip.as_str()).collect();
        assert_eq!(ips, vec!["10.0.0.1", "10.0.0.2"]);
        assert_eq!(
            events[1].details["matched_pattern"],
            DetailValue::Text("python".to_owned())
        );
    }

    #[test]
    fn one_event_per_ip_with_request_count() {
        let entries: Vec<_> = (0..4)
            .map(|i| with_ua(entry("10.0.0.1", i), "Wget/1.21"))
            .collect();
        let events = SuspiciousUserAgentDetector.detect(&entries, &Thresholds::default());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].resource, "4 requests");
        assert_eq!(events[0].details["request_count"], DetailValue::Integer(4));
        assert_eq!(events[0].timestamp, t(3));
    }

    #[test]
    fn custom_pattern_list_is_respected() {
        let thresholds = Thresholds {
            suspicious_user_agents: vec!["Nikto".to_owned()],
            ..Thresholds::default()
        };
        let entries = vec![
            with_ua(entry("10.0.0.1", 0), "curl/7.68.0"),
            with_ua(entry("10.0.0.2", 0), "Mozilla/5.00 (Nikto/2.1.6)"),
        ];
        let events = SuspiciousUserAgentDetector.detect(&entries, &thresholds);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].source_ip, "10.0.0.2");
    }
}
