//! Honeywatch 공통 크레이트
//!
//! 허니 토큰 접근 로그 분석에 쓰이는 도메인 타입, 확장 trait, 에러, 설정,
//! 메트릭 이름을 정의합니다. 탐지(`honeywatch-detection`)와
//! 저장/알림(`honeywatch-alerting`) 크레이트는 모두 이 크레이트만 공유합니다.

pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod types;

// --- 주요 타입 re-export ---
// 각 모듈의 핵심 타입을 크레이트 루트에서 바로 사용할 수 있도록 합니다.

// 에러
pub use error::{
    ChannelError, ConfigError, HoneywatchError, IngestionError, NormalizeError, PassError,
    StoreError,
};

// 설정
pub use config::{HoneywatchConfig, Thresholds};

// 파이프라인 trait
pub use pipeline::{
    BoxFuture, Detector, DynNotificationChannel, EventStore, LogSource, NotificationChannel,
    Normalizer, StoredEvent,
};

// 도메인 타입
pub use types::{
    AccessLogEntry, DetailValue, EventType, Operation, SecurityEvent, Severity, TimeRange,
};
