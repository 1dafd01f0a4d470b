//! 에러 타입 -- 도메인별 에러 정의
//!
//! 분석 패스의 실패 등급을 타입으로 구분합니다.
//!
//! | 에러 | 범위 | 처리 |
//! |------|------|------|
//! | [`IngestionError`] | 패스 전체 | 탐지 전에 중단, 이벤트 없음 |
//! | [`NormalizeError`] | 레코드 하나 | 레코드를 버리고 계수 |
//! | [`StoreError`] | 패스 전체 | 알림 전에 중단 |
//! | [`ChannelError`] | 채널 하나 | 보고서에 기록, 재시도 없음 |
//!
//! 중복 이벤트는 에러가 아니며 `UpsertOutcome::Duplicate`로 표현됩니다.

/// Honeywatch 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum HoneywatchError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 로그 수집 에러
    #[error("ingestion error: {0}")]
    Ingestion(#[from] IngestionError),

    /// 레코드 정규화 에러
    #[error("normalize error: {0}")]
    Normalize(#[from] NormalizeError),

    /// 이벤트 저장소 에러
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// 알림 채널 에러
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 로그 소스 수집 에러
///
/// 소스에 접근할 수 없거나 응답 자체가 손상된 경우입니다.
/// 해당 패스는 탐지 없이 중단되고 다음 주기에 다시 시도됩니다.
#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    /// 소스 접근 불가
    #[error("log source '{source_name}' unavailable: {reason}")]
    Unavailable { source_name: String, reason: String },

    /// 소스 응답 손상
    #[error("log source '{source_name}' returned malformed data: {reason}")]
    Malformed { source_name: String, reason: String },
}

/// 레코드 하나의 정규화 실패
///
/// 패스를 중단하지 않습니다. 해당 레코드만 제외됩니다.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    /// 레코드 구조가 형식에 맞지 않음
    #[error("{format}: malformed record: {reason}")]
    Malformed { format: String, reason: String },

    /// 필수 필드 누락
    #[error("{format}: missing required field '{field}'")]
    MissingField { format: String, field: String },

    /// 필드 값 해석 실패
    #[error("{format}: invalid value for '{field}': {reason}")]
    InvalidField {
        format: String,
        field: String,
        reason: String,
    },

    /// 입력 데이터 초과
    #[error("input too large: {size} bytes (max: {max})")]
    TooLarge { size: usize, max: usize },
}

/// 이벤트 저장소 에러
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// 저장소 접근 불가
    #[error("event store unavailable: {0}")]
    Unavailable(String),

    /// 레코드 직렬화/역직렬화 실패
    #[error("event record serialization failed: {0}")]
    Serialization(String),
}

/// 알림 채널 전송 에러
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// 요청 전송 실패 (연결, 타임아웃 등)
    #[error("{channel}: transport failed: {reason}")]
    Transport { channel: String, reason: String },

    /// 원격 서비스가 요청을 거부함
    #[error("{channel}: rejected with status {status}: {body}")]
    Rejected {
        channel: String,
        status: u16,
        body: String,
    },
}

/// 분석 패스 실패
///
/// 두 변형 모두 다음 주기에 재시도할 수 있는 실패입니다.
#[derive(Debug, thiserror::Error)]
pub enum PassError {
    /// 로그 수집 단계에서 실패
    #[error("pass aborted during ingestion: {0}")]
    Ingestion(#[from] IngestionError),

    /// 이벤트 저장 단계에서 실패 (알림 전)
    #[error("pass aborted during store: {0}")]
    Store(#[from] StoreError),
}

impl From<PassError> for HoneywatchError {
    fn from(err: PassError) -> Self {
        match err {
            PassError::Ingestion(e) => Self::Ingestion(e),
            PassError::Store(e) => Self::Store(e),
        }
    }
}
