//! Honeywatch 탐지 크레이트
//!
//! # 모듈 구성
//!
//! - [`normalizer`]: S3 액세스 로그, JSON 레코드(CloudWatch/GCP 매핑 포함) 정규화 및 자동 감지 라우터
//! - [`detector`]: 9가지 접근 패턴 탐지기
//! - [`engine`]: 탐지기 실행 순서, 결과 정렬, 병렬 실행
//! - [`source`]: 파일/디렉토리 기반 로그 소스
//!
//! # 아키텍처
//!
//! ```text
//! FileLogSource -> NormalizerRouter -> DetectorEngine -> Vec<SecurityEvent>
//!      |                 |                  |
//!  file / dir      S3 / JSON mapping   9 detectors, sorted output
//! ```

pub mod detector;
pub mod engine;
pub mod normalizer;
pub mod source;

// --- 주요 타입 re-export ---

// 엔진
pub use engine::{ConcurrentRun, DetectorEngine, run_all};

// 탐지기
pub use detector::default_detectors;

// 정규화
pub use normalizer::{
    JsonFieldMapping, JsonRecordNormalizer, NormalizedBatch, NormalizerRouter,
    S3AccessLogNormalizer, normalize_batch,
};

// 소스
pub use source::FileLogSource;
