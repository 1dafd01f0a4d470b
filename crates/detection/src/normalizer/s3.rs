//! Amazon S3 server access log 정규화기
//!
//! S3 서버 액세스 로그 한 줄을 [`AccessLogEntry`]로 변환합니다.
//!
//! # 라인 형식
//! ```text
//! OWNER BUCKET [06/Feb/2019:00:00:38 +0000] REMOTE_IP REQUESTER REQUEST_ID OPERATION KEY
//!   "REQUEST_URI" STATUS ERROR_CODE BYTES_SENT OBJECT_SIZE TOTAL_TIME TURNAROUND
//!   "REFERER" "USER_AGENT" VERSION_ID ...
//! ```
//!
//! - `[...]`와 `"..."`로 감싼 필드는 공백을 포함할 수 있습니다.
//! - 값이 없는 필드는 `-`로 기록됩니다.
//! - `USER_AGENT` 이후의 필드는 버전에 따라 늘어나므로 무시합니다.

use chrono::{DateTime, Utc};
use honeywatch_core::error::NormalizeError;
use honeywatch_core::pipeline::Normalizer;
use honeywatch_core::types::AccessLogEntry;

use super::json::parse_operation;

const FORMAT: &str = "s3";

/// 필드 위치
const IDX_TIME: usize = 2;
const IDX_REMOTE_IP: usize = 3;
const IDX_OPERATION: usize = 6;
const IDX_KEY: usize = 7;
const IDX_STATUS: usize = 9;
const IDX_BYTES_SENT: usize = 11;
const IDX_OBJECT_SIZE: usize = 12;
const IDX_USER_AGENT: usize = 16;

/// S3 server access log 정규화기
pub struct S3AccessLogNormalizer {
    /// 최대 허용 입력 크기 (바이트)
    max_input_size: usize,
}

impl Default for S3AccessLogNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl S3AccessLogNormalizer {
    /// 기본 설정으로 새 정규화기를 생성합니다.
    pub fn new() -> Self {
        Self {
            max_input_size: 16 * 1024, // 16KB
        }
    }

    /// 최대 입력 크기를 설정합니다.
    pub fn with_max_input_size(mut self, size: usize) -> Self {
        self.max_input_size = size;
        self
    }

    fn malformed(reason: impl Into<String>) -> NormalizeError {
        NormalizeError::Malformed {
            format: FORMAT.to_owned(),
            reason: reason.into(),
        }
    }

    fn invalid(field: &str, reason: impl Into<String>) -> NormalizeError {
        NormalizeError::InvalidField {
            format: FORMAT.to_owned(),
            field: field.to_owned(),
            reason: reason.into(),
        }
    }
}

impl Normalizer for S3AccessLogNormalizer {
    fn format_name(&self) -> &str {
        FORMAT
    }

    fn normalize(&self, raw: &[u8]) -> Result<AccessLogEntry, NormalizeError> {
        if raw.len() > self.max_input_size {
            return Err(NormalizeError::TooLarge {
                size: raw.len(),
                max: self.max_input_size,
            });
        }

        let line = std::str::from_utf8(raw).map_err(|e| Self::malformed(e.to_string()))?;
        let fields = tokenize(line.trim())?;

        if fields.len() <= IDX_STATUS {
            return Err(Self::malformed(format!(
                "expected at least {} fields, got {}",
                IDX_STATUS + 1,
                fields.len()
            )));
        }

        let timestamp = parse_s3_time(fields[IDX_TIME])
            .ok_or_else(|| Self::invalid("time", format!("unrecognized time '{}'", fields[IDX_TIME])))?;

        let source_ip = match fields[IDX_REMOTE_IP] {
            "-" => String::new(),
            ip => ip.to_owned(),
        };

        let operation = parse_operation(fields[IDX_OPERATION]);

        let resource = match fields[IDX_KEY] {
            "-" => String::new(),
            key => key.to_owned(),
        };

        let http_status = fields[IDX_STATUS]
            .parse::<u16>()
            .map_err(|e| Self::invalid("http_status", e.to_string()))?;

        // 전송 바이트가 없으면 오브젝트 크기로 대체합니다
        let bytes_estimate = [IDX_BYTES_SENT, IDX_OBJECT_SIZE]
            .iter()
            .filter_map(|&idx| fields.get(idx))
            .find_map(|v| v.parse::<u64>().ok());

        let user_agent = match fields.get(IDX_USER_AGENT).copied() {
            Some("-") | None => String::new(),
            Some(ua) => ua.to_owned(),
        };

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

/// 라인을 필드로 나눕니다.
///
/// `[...]`와 `"..."` 안의 공백은 구분자로 취급하지 않으며,
/// 감싼 문자는 결과에서 제외됩니다.
fn tokenize(line: &str) -> Result<Vec<&str>, NormalizeError> {
    let mut fields = Vec::with_capacity(24);
    let mut rest = line.trim_start();

    while !rest.is_empty() {
        let (field, remainder) = match rest.as_bytes()[0] {
            b'[' => split_enclosed(&rest[1..], ']')?,
            b'"' => split_enclosed(&rest[1..], '"')?,
            _ => match rest.find(' ') {
                Some(pos) => (&rest[..pos], &rest[pos..]),
                None => (rest, ""),
            },
        };
        fields.push(field);
        rest = remainder.trim_start();
    }

    Ok(fields)
}

fn split_enclosed(s: &str, close: char) -> Result<(&str, &str), NormalizeError> {
    let end = s.find(close).ok_or_else(|| {
        S3AccessLogNormalizer::malformed(format!("unterminated field, expected '{close}'"))
    })?;
    Ok((&s[..end], &s[end + close.len_utf8()..]))
}

/// `06/Feb/2019:00:00:38 +0000` 형식을 파싱합니다.
fn parse_s3_time(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(raw, "%d/%b/%Y:%H:%M:%S %z")
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
