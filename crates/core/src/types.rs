//! 도메인 타입 -- 시스템 전역에서 사용되는 공통 타입
//!
//! 정규화된 접근 로그([`AccessLogEntry`])와 탐지 결과([`SecurityEvent`])는
//! 모든 크레이트가 공유하는 교환 형식입니다. 백엔드별 차이는 정규화 단계에서
//! 흡수되고, 탐지기는 이 타입만 봅니다.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// 오브젝트 스토리지 요청 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    /// 오브젝트 다운로드
    Get,
    /// 오브젝트 업로드
    Put,
    /// 메타데이터 조회
    Head,
    /// 그 밖의 요청 (DELETE, LIST 등)
    Other,
}

impl Operation {
    /// HTTP 메서드 또는 `REST.GET.OBJECT` 형식의 동사를 해석합니다.
    ///
    /// 대소문자를 구분하지 않으며, 알 수 없는 값은 `Other`가 됩니다.
    pub fn from_verb(verb: &str) -> Self {
        match verb.to_ascii_uppercase().as_str() {
            "GET" => Self::Get,
            "PUT" => Self::Put,
            "HEAD" => Self::Head,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Put => write!(f, "PUT"),
            Self::Head => write!(f, "HEAD"),
            Self::Other => write!(f, "OTHER"),
        }
    }
}

/// 정규화된 접근 로그 엔트리
///
/// 백엔드별 레코드를 하나의 형식으로 통합합니다. 패스가 소유하며 불변입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessLogEntry {
    /// 요청 시각 (UTC)
    pub timestamp: DateTime<Utc>,
    /// 요청 출발지 IP (문자열 그대로 보존)
    pub source_ip: String,
    /// 대상 오브젝트 키
    pub resource: String,
    /// 요청 종류
    pub operation: Operation,
    /// HTTP 상태 코드
    pub http_status: u16,
    /// User-Agent 헤더
    pub user_agent: String,
    /// 전송 바이트 추정치 (백엔드가 제공할 때만)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes_estimate: Option<u64>,
}

impl AccessLogEntry {
    /// 2xx 응답 여부
    pub fn is_successful(&self) -> bool {
        (200..300).contains(&self.http_status)
    }

    /// 성공한 GET 요청 여부
    pub fn is_successful_get(&self) -> bool {
        self.operation == Operation::Get && self.is_successful()
    }
}

impl fmt::Display for AccessLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} status={}",
            self.timestamp.to_rfc3339(),
            self.source_ip,
            self.operation,
            self.resource,
            self.http_status,
        )
    }
}

/// 심각도 레벨
///
/// `Ord` 구현으로 심각도 비교가 가능합니다 (`Low < Medium < High < Critical`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// 낮은 심각도
    #[default]
    Low,
    /// 중간 심각도
    Medium,
    /// 높은 심각도
    High,
    /// 치명적 -- 즉시 대응 필요
    Critical,
}

impl Severity {
    /// 높은 심각도부터 나열한 전체 목록
    pub const DESCENDING: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    /// 문자열에서 심각도를 파싱합니다.
    ///
    /// 대소문자를 구분하지 않습니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" | "med" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" | "crit" => Some(Self::Critical),
            _ => None,
        }
    }

    /// 즉시 알림 대상 여부 (high, critical)
    pub fn is_immediate(&self) -> bool {
        *self >= Self::High
    }

    /// 메트릭 레이블 등에 쓰는 소문자 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 탐지기 종류
///
/// 탐지기마다 하나의 변형이 있으며, 선언 순서가 엔진의 실행 순서이자
/// 결과 정렬 순서입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    BulkDownload,
    RapidAccess,
    AbnormalHours,
    SuspiciousUserAgent,
    FailedAccessAttempts,
    CredentialStuffing,
    DataExfiltration,
    PortScanning,
    BeaconingPattern,
}

impl EventType {
    /// 전체 이벤트 종류 (실행 순서)
    pub const ALL: [EventType; 9] = [
        EventType::BulkDownload,
        EventType::RapidAccess,
        EventType::AbnormalHours,
        EventType::SuspiciousUserAgent,
        EventType::FailedAccessAttempts,
        EventType::CredentialStuffing,
        EventType::DataExfiltration,
        EventType::PortScanning,
        EventType::BeaconingPattern,
    ];

    /// 이벤트 종류별 고정 심각도
    pub fn severity(&self) -> Severity {
        match self {
            Self::DataExfiltration => Severity::Critical,
            Self::BulkDownload | Self::FailedAccessAttempts | Self::CredentialStuffing => {
                Severity::High
            }
            Self::RapidAccess
            | Self::AbnormalHours
            | Self::SuspiciousUserAgent
            | Self::PortScanning
            | Self::BeaconingPattern => Severity::Medium,
        }
    }

    /// 직렬화 형식과 같은 snake_case 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BulkDownload => "bulk_download",
            Self::RapidAccess => "rapid_access",
            Self::AbnormalHours => "abnormal_hours",
            Self::SuspiciousUserAgent => "suspicious_user_agent",
            Self::FailedAccessAttempts => "failed_access_attempts",
            Self::CredentialStuffing => "credential_stuffing",
            Self::DataExfiltration => "data_exfiltration",
            Self::PortScanning => "port_scanning",
            Self::BeaconingPattern => "beaconing_pattern",
        }
    }

    /// 사람이 읽는 제목 (`"Bulk Download"`)
    pub fn title(&self) -> &'static str {
        match self {
            Self::BulkDownload => "Bulk Download",
            Self::RapidAccess => "Rapid Access",
            Self::AbnormalHours => "Abnormal Hours",
            Self::SuspiciousUserAgent => "Suspicious User Agent",
            Self::FailedAccessAttempts => "Failed Access Attempts",
            Self::CredentialStuffing => "Credential Stuffing",
            Self::DataExfiltration => "Data Exfiltration",
            Self::PortScanning => "Port Scanning",
            Self::BeaconingPattern => "Beaconing Pattern",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 이벤트 상세 정보의 스칼라 값
///
/// JSON으로 그대로 직렬화됩니다. 정수는 `Integer`, 소수는 `Float`로 읽힙니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DetailValue {
    Integer(u64),
    Float(f64),
    Text(String),
}

impl fmt::Display for DetailValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

impl From<u64> for DetailValue {
    fn from(v: u64) -> Self {
        Self::Integer(v)
    }
}

impl From<usize> for DetailValue {
    fn from(v: usize) -> Self {
        Self::Integer(v as u64)
    }
}

impl From<f64> for DetailValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for DetailValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for DetailValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// 탐지 결과 보안 이벤트
///
/// 심각도는 `event_type`에서 결정됩니다. `timestamp`는 탐지에 기여한
/// 마지막 엔트리의 시각입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityEvent {
    /// 이벤트 종류
    pub event_type: EventType,
    /// 심각도
    pub severity: Severity,
    /// 마지막 기여 엔트리 시각
    pub timestamp: DateTime<Utc>,
    /// 출발지 IP
    pub source_ip: String,
    /// 대상 요약 (`"14 files"` 또는 오브젝트 키)
    pub resource: String,
    /// 탐지 근거 (건수, 시간 범위, 비율 등)
    #[serde(default)]
    pub details: BTreeMap<String, DetailValue>,
    /// 리전
    #[serde(default)]
    pub region: String,
}

impl SecurityEvent {
    /// 이벤트 종류의 고정 심각도로 새 이벤트를 만듭니다.
    pub fn new(
        event_type: EventType,
        timestamp: DateTime<Utc>,
        source_ip: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            event_type,
            severity: event_type.severity(),
            timestamp,
            source_ip: source_ip.into(),
            resource: resource.into(),
            details: BTreeMap::new(),
            region: String::new(),
        }
    }

    /// 상세 항목을 추가합니다.
    pub fn with_detail(mut self, key: &str, value: impl Into<DetailValue>) -> Self {
        self.details.insert(key.to_owned(), value.into());
        self
    }

    /// 리전을 설정합니다.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }
}

impl fmt::Display for SecurityEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} from {} ({})",
            self.severity, self.event_type, self.source_ip, self.resource,
        )
    }
}

/// 반개구간 `[start, end)` UTC 시간 범위
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// `end`에서 `lookback`만큼 거슬러 올라간 범위를 만듭니다.
    ///
    /// 표현 가능한 최소 시각보다 앞서면 최소 시각에서 시작합니다.
    pub fn ending_at(end: DateTime<Utc>, lookback: TimeDelta) -> Self {
        Self {
            start: end
                .checked_sub_signed(lookback)
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            end,
        }
    }

    /// `t`가 범위 안에 있는지 확인합니다.
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t < self.end
    }

    /// 범위 시작을 `granularity_secs` 단위로 내림한 버킷 시각
    ///
    /// 겹치는 분석 창이 같은 버킷에 떨어지도록 이벤트 식별자에 사용됩니다.
    /// 단위가 0이거나 내림에 실패하면 시작 시각을 그대로 돌려줍니다.
    pub fn bucket_start(&self, granularity_secs: u64) -> DateTime<Utc> {
        let Ok(secs) = i64::try_from(granularity_secs) else {
            return self.start;
        };
        if secs == 0 {
            return self.start;
        }
        TimeDelta::try_seconds(secs)
            .and_then(|step| self.start.duration_trunc(step).ok())
            .unwrap_or(self.start)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}
