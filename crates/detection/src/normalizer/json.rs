//! JSON 접근 로그 정규화기
//!
//! 필드 이름 매핑을 통해 JSON 한 줄짜리 레코드를 [`AccessLogEntry`]로 변환합니다.
//! 백엔드마다 필드 이름이 다르므로 매핑 프리셋을 제공합니다.
//!
//! # 지원 형식
//! - 기본 형식: `AccessLogEntry`를 그대로 직렬화한 모양
//! - CloudWatch Logs Insights 결과 행 ([`JsonFieldMapping::cloudwatch`])
//! - GCP Cloud Storage 요청 로그 ([`JsonFieldMapping::gcp`])
//!
//! 중첩 필드는 dot notation으로 지정합니다 (예: `"httpRequest.remoteIp"`).
//!
//! # 사용 예시
//! ```ignore
//! use honeywatch_detection::normalizer::{JsonFieldMapping, JsonRecordNormalizer};
//! use honeywatch_core::pipeline::Normalizer;
//!
//! let normalizer = JsonRecordNormalizer::new(JsonFieldMapping::cloudwatch());
//! let raw = br#"{"@timestamp":"2024-01-15 03:12:00.000","remoteip":"1.2.3.4","key":"aws_keys.json","operation":"REST.GET.OBJECT","httpstatus":"200","useragent":"curl/7.68"}"#;
//! let entry = normalizer.normalize(raw)?;
//! assert_eq!(entry.source_ip, "1.2.3.4");
//! ```

use chrono::{DateTime, NaiveDateTime, Utc};
use honeywatch_core::error::NormalizeError;
use honeywatch_core::pipeline::Normalizer;
use honeywatch_core::types::{AccessLogEntry, Operation};

/// JSON 필드 매핑 설정
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonFieldMapping {
    /// 매핑 이름 (에러 메시지와 메트릭 레이블에 사용)
    pub name: String,
    /// 타임스탬프 필드명
    pub timestamp_field: String,
    /// 출발지 IP 필드명
    pub source_ip_field: String,
    /// 오브젝트 키 필드명
    pub resource_field: String,
    /// 요청 종류 필드명 (`GET` 또는 `REST.GET.OBJECT`)
    pub operation_field: String,
    /// HTTP 상태 코드 필드명
    pub status_field: String,
    /// User-Agent 필드명
    pub user_agent_field: String,
    /// 전송 바이트 필드명 (없으면 `None`)
    pub bytes_field: Option<String>,
}

impl Default for JsonFieldMapping {
    fn default() -> Self {
        Self {
            name: "json".to_owned(),
            timestamp_field: "timestamp".to_owned(),
            source_ip_field: "source_ip".to_owned(),
            resource_field: "resource".to_owned(),
            operation_field: "operation".to_owned(),
            status_field: "http_status".to_owned(),
            user_agent_field: "user_agent".to_owned(),
            bytes_field: Some("bytes_estimate".to_owned()),
        }
    }
}

impl JsonFieldMapping {
    /// CloudWatch Logs Insights 결과 행 매핑
    pub fn cloudwatch() -> Self {
        Self {
            name: "cloudwatch".to_owned(),
            timestamp_field: "@timestamp".to_owned(),
            source_ip_field: "remoteip".to_owned(),
            resource_field: "key".to_owned(),
            operation_field: "operation".to_owned(),
            status_field: "httpstatus".to_owned(),
            user_agent_field: "useragent".to_owned(),
            bytes_field: Some("bytessent".to_owned()),
        }
    }

    /// GCP Cloud Storage 요청 로그 매핑
    pub fn gcp() -> Self {
        Self {
            name: "gcp".to_owned(),
            timestamp_field: "timestamp".to_owned(),
            source_ip_field: "httpRequest.remoteIp".to_owned(),
            resource_field: "resource.labels.object_name".to_owned(),
            operation_field: "httpRequest.requestMethod".to_owned(),
            status_field: "httpRequest.status".to_owned(),
            user_agent_field: "httpRequest.userAgent".to_owned(),
            bytes_field: Some("httpRequest.responseSize".to_owned()),
        }
    }
}

/// JSON 레코드 정규화기
pub struct JsonRecordNormalizer {
    /// 필드 매핑 설정
    mapping: JsonFieldMapping,
    /// 최대 허용 입력 크기 (바이트)
    max_input_size: usize,
}

impl Default for JsonRecordNormalizer {
    fn default() -> Self {
        Self::new(JsonFieldMapping::default())
    }
}

impl JsonRecordNormalizer {
    /// 커스텀 필드 매핑으로 새 정규화기를 생성합니다.
    pub fn new(mapping: JsonFieldMapping) -> Self {
        Self {
            mapping,
            max_input_size: 64 * 1024, // 64KB
        }
    }

    /// 최대 입력 크기를 설정합니다.
    pub fn with_max_input_size(mut self, size: usize) -> Self {
        self.max_input_size = size;
        self
    }

    /// 매핑 설정을 반환합니다.
    pub fn mapping(&self) -> &JsonFieldMapping {
        &self.mapping
    }

    /// dot notation 경로로 값을 찾습니다.
    fn lookup<'v>(value: &'v serde_json::Value, field: &str) -> Option<&'v serde_json::Value> {
        // 평탄한 키에 점이 들어 있는 경우(`@timestamp` 등)를 먼저 확인
        if let Some(v) = value.get(field) {
            return Some(v);
        }
        field
            .split('.')
            .try_fold(value, |current, part| current.get(part))
    }

    /// 문자열, 숫자, 불리언 값을 문자열로 꺼냅니다.
    fn extract_string(value: &serde_json::Value, field: &str) -> Option<String> {
        match Self::lookup(value, field)? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn missing(&self, field: &str) -> NormalizeError {
        NormalizeError::MissingField {
            format: self.mapping.name.clone(),
            field: field.to_owned(),
        }
    }

    fn invalid(&self, field: &str, reason: impl Into<String>) -> NormalizeError {
        NormalizeError::InvalidField {
            format: self.mapping.name.clone(),
            field: field.to_owned(),
            reason: reason.into(),
        }
    }
}

impl Normalizer for JsonRecordNormalizer {
    fn format_name(&self) -> &str {
        &self.mapping.name
    }

    fn normalize(&self, raw: &[u8]) -> Result<AccessLogEntry, NormalizeError> {
        if raw.len() > self.max_input_size {
            return Err(NormalizeError::TooLarge {
                size: raw.len(),
                max: self.max_input_size,
            });
        }

        let value: serde_json::Value =
            serde_json::from_slice(raw).map_err(|e| NormalizeError::Malformed {
                format: self.mapping.name.clone(),
                reason: e.to_string(),
            })?;

        // 최상위가 JSON 객체여야 합니다
        if !value.is_object() {
            return Err(NormalizeError::Malformed {
                format: self.mapping.name.clone(),
                reason: "expected JSON object at top level".to_owned(),
            });
        }

        let m = &self.mapping;

        let raw_ts = Self::extract_string(&value, &m.timestamp_field)
            .ok_or_else(|| self.missing(&m.timestamp_field))?;
        let timestamp = parse_timestamp(&raw_ts)
            .ok_or_else(|| self.invalid(&m.timestamp_field, format!("unrecognized timestamp '{raw_ts}'")))?;

        let source_ip = Self::extract_string(&value, &m.source_ip_field)
            .ok_or_else(|| self.missing(&m.source_ip_field))?;

        let raw_status = Self::extract_string(&value, &m.status_field)
            .ok_or_else(|| self.missing(&m.status_field))?;
        let http_status = raw_status
            .trim()
            .parse::<u16>()
            .map_err(|e| self.invalid(&m.status_field, e.to_string()))?;

        let operation = Self::extract_string(&value, &m.operation_field)
            .map(|op| parse_operation(&op))
            .unwrap_or(Operation::Other);

        let resource = Self::extract_string(&value, &m.resource_field).unwrap_or_default();
        let user_agent = Self::extract_string(&value, &m.user_agent_field).unwrap_or_default();

        // 크기 필드는 선택 사항이며 숫자가 아니면 무시합니다
        let bytes_estimate = m
            .bytes_field
            .as_deref()
            .and_then(|f| Self::extract_string(&value, f))
            .and_then(|s| s.trim().parse::<u64>().ok());

        Ok(AccessLogEntry {
            timestamp,
            source_ip,
            resource,
            operation,
            http_status,
            user_agent,
            bytes_estimate,
        })
    }
}

/// 요청 종류 문자열을 해석합니다.
///
/// `GET` 같은 HTTP 메서드와 `REST.GET.OBJECT` 같은 S3 operation 모두 지원합니다.
pub(crate) fn parse_operation(raw: &str) -> Operation {
    let mut parts = raw.split('.');
    match (parts.next(), parts.next()) {
        (Some(_), Some(verb)) => Operation::from_verb(verb),
        (Some(verb), None) => Operation::from_verb(verb),
        _ => Operation::Other,
    }
}

/// 타임스탬프 문자열을 파싱합니다.
///
/// 지원 형식:
/// - RFC 3339 (ISO 8601): `2024-01-15T12:00:00Z`
/// - 오프셋 없는 날짜시각 (UTC로 간주): `2024-01-15 12:00:00.000`
/// - Unix timestamp (초): `1705320000`
/// - Unix timestamp (밀리초): `1705320000000`
pub(crate) fn parse_timestamp(timestamp: &str) -> Option<DateTime<Utc>> {
    let timestamp = timestamp.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(timestamp, format) {
            return Some(naive.and_utc());
        }
    }

    // 10자리 = 초, 13자리 = 밀리초
    let ts_num = timestamp.parse::<i64>().ok()?;
    if ts_num > 9_999_999_999 {
        DateTime::from_timestamp_millis(ts_num)
    } else {
        DateTime::from_timestamp(ts_num, 0)
    }
}
