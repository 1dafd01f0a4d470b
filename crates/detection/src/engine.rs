//! 탐지 엔진 -- 모든 탐지기를 정해진 순서로 실행하고 결과를 합칩니다.
//!
//! 엔진 출력은 `(event_type, source_ip, timestamp)` 순으로 정렬되므로
//! 입력 엔트리 순서와 무관하게 같은 배치에는 같은 결과를 돌려줍니다.
//!
//! # 사용 예시
//! ```ignore
//! let engine = DetectorEngine::default();
//! let events = engine.run_all(&entries, &config.detection);
//! ```

use std::sync::Arc;
use std::time::Instant;

use honeywatch_core::config::Thresholds;
use honeywatch_core::metrics as hw_metrics;
use honeywatch_core::pipeline::Detector;
use honeywatch_core::types::{AccessLogEntry, EventType, SecurityEvent};
use tracing::{debug, error};

use crate::detector::default_detectors;

/// [`DetectorEngine::run_all_concurrent`]의 결과
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConcurrentRun {
    /// 정렬된 이벤트
    pub events: Vec<SecurityEvent>,
    /// 태스크가 실패해 결과가 빠진 탐지기
    pub failed_detectors: Vec<EventType>,
}

/// 탐지기 실행 코디네이터
pub struct DetectorEngine {
    /// 실행 순서대로 정렬된 탐지기
    detectors: Vec<Arc<dyn Detector>>,
}

impl Default for DetectorEngine {
    fn default() -> Self {
        Self::new(default_detectors().into_iter().map(Arc::from).collect())
    }
}

impl DetectorEngine {
    /// 주어진 탐지기 목록으로 엔진을 생성합니다.
    pub fn new(detectors: Vec<Arc<dyn Detector>>) -> Self {
        Self { detectors }
    }

    /// 실행 순서대로의 이벤트 종류
    pub fn event_types(&self) -> Vec<EventType> {
        self.detectors.iter().map(|d| d.event_type()).collect()
    }

    /// 모든 탐지기를 현재 스레드에서 순서대로 실행합니다.
    pub fn run_all(&self, entries: &[AccessLogEntry], thresholds: &Thresholds) -> Vec<SecurityEvent> {
        let started = Instant::now();

        let events = self
            .detectors
            .iter()
            .flat_map(|detector| {
                let found = detector.detect(entries, thresholds);
                debug!(
                    detector = detector.event_type().as_str(),
                    events = found.len(),
                    "detector finished"
                );
                found
            })
            .collect();

        finish(events, entries.len(), started)
    }

    /// 탐지기마다 블로킹 태스크를 하나씩 띄워 병렬로 실행합니다.
    ///
    /// 모든 태스크가 끝나면 이벤트는 [`run_all`](Self::run_all)과 같습니다.
    /// 태스크가 실패한 탐지기는 `failed_detectors`에 남고 메트릭으로 집계됩니다.
    pub async fn run_all_concurrent(
        &self,
        entries: Arc<[AccessLogEntry]>,
        thresholds: Arc<Thresholds>,
    ) -> ConcurrentRun {
        let started = Instant::now();

        let handles: Vec<_> = self
            .detectors
            .iter()
            .map(|detector| {
                let detector = Arc::clone(detector);
                let entries = Arc::clone(&entries);
                let thresholds = Arc::clone(&thresholds);
                let event_type = detector.event_type();
                let handle = tokio::task::spawn_blocking(move || {
                    detector.detect(&entries, &thresholds)
                });
                (event_type, handle)
            })
            .collect();

        let mut events = Vec::new();
        let mut failed_detectors = Vec::new();
        for (event_type, handle) in handles {
            match handle.await {
                Ok(found) => events.extend(found),
                Err(e) => {
                    error!(detector = event_type.as_str(), error = %e, "detector task failed");
                    metrics::counter!(
                        hw_metrics::DETECTION_DETECTOR_FAILURES_TOTAL,
                        hw_metrics::LABEL_EVENT_TYPE => event_type.as_str()
                    )
                    .increment(1);
                    failed_detectors.push(event_type);
                }
            }
        }

        ConcurrentRun {
            events: finish(events, entries.len(), started),
            failed_detectors,
        }
    }
}

/// 기본 탐지기 세트로 배치를 검사합니다.
pub fn run_all(entries: &[AccessLogEntry], thresholds: &Thresholds) -> Vec<SecurityEvent> {
    DetectorEngine::default().run_all(entries, thresholds)
}

fn finish(mut events: Vec<SecurityEvent>, entry_count: usize, started: Instant) -> Vec<SecurityEvent> {
    events.sort_by(|a, b| {
        (a.event_type, &a.source_ip, a.timestamp).cmp(&(b.event_type, &b.source_ip, b.timestamp))
    });

    for event in &events {
        metrics::counter!(
            hw_metrics::DETECTION_EVENTS_TOTAL,
            hw_metrics::LABEL_EVENT_TYPE => event.event_type.as_str(),
            hw_metrics::LABEL_SEVERITY => event.severity.as_str()
        )
        .increment(1);
    }
    metrics::histogram!(hw_metrics::DETECTION_DURATION_SECONDS)
        .record(started.elapsed().as_secs_f64());

    debug!(entries = entry_count, events = events.len(), "detection complete");
    events
}
