//! 접근 로그 정규화 모듈 -- 백엔드별 레코드를 [`AccessLogEntry`]로 변환
//!
//! [`NormalizerRouter`]는 등록된 정규화기를 순서대로 시도하여 첫 번째 성공 결과를
//! 사용합니다. 각 정규화기는 core의 [`Normalizer`] trait을 구현합니다.
//!
//! # 지원 형식
//! - S3 server access log ([`S3AccessLogNormalizer`])
//! - JSON 레코드 + 필드 매핑 ([`JsonRecordNormalizer`])
//!
//! # 사용 예시
//! ```ignore
//! use honeywatch_detection::normalizer::{normalize_batch, NormalizerRouter};
//!
//! let router = NormalizerRouter::with_defaults();
//! let batch = normalize_batch(&router, lines.iter().map(|l| l.as_bytes()));
//! println!("{} entries, {} skipped", batch.entries.len(), batch.skipped);
//! ```

pub mod json;
pub mod s3;

pub use json::{JsonFieldMapping, JsonRecordNormalizer};
pub use s3::S3AccessLogNormalizer;

use honeywatch_core::error::{ConfigError, NormalizeError};
use honeywatch_core::metrics as hw_metrics;
use honeywatch_core::pipeline::Normalizer;
use honeywatch_core::types::AccessLogEntry;
use tracing::debug;

/// 정규화기 라우터 -- 레코드 형식을 자동 감지하여 적절한 정규화기를 선택합니다.
///
/// 모든 정규화기가 실패하면 마지막 에러를 반환합니다.
pub struct NormalizerRouter {
    /// 등록된 정규화기 목록 (순서대로 시도)
    normalizers: Vec<Box<dyn Normalizer>>,
}

impl Default for NormalizerRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl NormalizerRouter {
    /// 빈 라우터를 생성합니다.
    pub fn new() -> Self {
        Self {
            normalizers: Vec::new(),
        }
    }

    /// 기본 정규화기 세트 (S3 + JSON 기본/CloudWatch/GCP)로 라우터를 생성합니다.
    pub fn with_defaults() -> Self {
        Self::new()
            .register(Box::new(S3AccessLogNormalizer::new()))
            .register(Box::new(JsonRecordNormalizer::default()))
            .register(Box::new(JsonRecordNormalizer::new(
                JsonFieldMapping::cloudwatch(),
            )))
            .register(Box::new(JsonRecordNormalizer::new(JsonFieldMapping::gcp())))
    }

    /// 설정의 `analysis.log_format` 값으로 라우터를 만듭니다.
    ///
    /// `auto`는 [`with_defaults`](Self::with_defaults)와 같습니다.
    pub fn for_format(format: &str) -> Result<Self, ConfigError> {
        let router = match format {
            "auto" => Self::with_defaults(),
            "s3" => Self::new().register(Box::new(S3AccessLogNormalizer::new())),
            "json" => Self::new().register(Box::new(JsonRecordNormalizer::default())),
            "cloudwatch" => Self::new().register(Box::new(JsonRecordNormalizer::new(
                JsonFieldMapping::cloudwatch(),
            ))),
            "gcp" => Self::new().register(Box::new(JsonRecordNormalizer::new(
                JsonFieldMapping::gcp(),
            ))),
            other => {
                return Err(ConfigError::InvalidValue {
                    field: "analysis.log_format".to_owned(),
                    reason: format!("unsupported log format '{other}'"),
                });
            }
        };
        Ok(router)
    }

    /// 정규화기를 등록합니다. 등록 순서대로 시도됩니다.
    pub fn register(mut self, normalizer: Box<dyn Normalizer>) -> Self {
        self.normalizers.push(normalizer);
        self
    }

    /// 등록된 형식 이름 목록
    pub fn formats(&self) -> Vec<&str> {
        self.normalizers.iter().map(|n| n.format_name()).collect()
    }
}

impl Normalizer for NormalizerRouter {
    fn format_name(&self) -> &str {
        "router"
    }

    fn normalize(&self, raw: &[u8]) -> Result<AccessLogEntry, NormalizeError> {
        let mut last_error = None;

        for normalizer in &self.normalizers {
            match normalizer.normalize(raw) {
                Ok(entry) => return Ok(entry),
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error.unwrap_or_else(|| NormalizeError::Malformed {
            format: "router".to_owned(),
            reason: "no normalizers registered".to_owned(),
        }))
    }
}

/// 배치 정규화 결과
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NormalizedBatch {
    /// 정규화된 엔트리
    pub entries: Vec<AccessLogEntry>,
    /// 손상되어 제외된 레코드 수
    pub skipped: usize,
}

/// 레코드 묶음을 정규화합니다.
///
/// 실패한 레코드는 debug 로그를 남기고 건너뛰며, 배치 전체를 중단하지 않습니다.
/// 빈 레코드(공백만 있는 줄)는 건너뛴 것으로 세지 않습니다.
pub fn normalize_batch<'a, N, I>(normalizer: &N, records: I) -> NormalizedBatch
where
    N: Normalizer + ?Sized,
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut batch = NormalizedBatch::default();

    for (index, raw) in records.into_iter().enumerate() {
        if raw.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        match normalizer.normalize(raw) {
            Ok(entry) => batch.entries.push(entry),
            Err(e) => {
                debug!(record = index, error = %e, "skipping malformed access log record");
                batch.skipped += 1;
            }
        }
    }

    metrics::counter!(hw_metrics::NORMALIZE_ENTRIES_TOTAL).increment(batch.entries.len() as u64);
    metrics::counter!(hw_metrics::NORMALIZE_SKIPPED_TOTAL).increment(batch.skipped as u64);

    batch
}

#[cfg(test)]
mod tests {
    use super::*;

    const S3_LINE: &str = r#"owner honey [15/Jan/2024:03:00:00 +0000] 10.0.0.1 - REQ1 REST.GET.OBJECT keys/aws.json "GET /honey/keys/aws.json HTTP/1.1" 200 - 512 512 3 2 "-" "curl/7.68.0" -"#;
    const JSON_LINE: &str = r#"{"timestamp":"2024-01-15T03:00:01Z","source_ip":"10.0.0.2","resource":"keys/gcp.json","operation":"GET","http_status":200,"user_agent":"Mozilla/5.0"}"#;
    const CW_LINE: &str = r#"{"@timestamp":"2024-01-15 03:00:02.000","remoteip":"10.0.0.3","key":"keys/ssh","operation":"REST.HEAD.OBJECT","httpstatus":"404","useragent":"aws-cli"}"#;

    #[test]
    fn router_picks_first_matching_normalizer() {
        let router = NormalizerRouter::with_defaults();

        let s3 = router.normalize(S3_LINE.as_bytes()).unwrap();
        assert_eq!(s3.source_ip, "10.0.0.1");

        let json = router.normalize(JSON_LINE.as_bytes()).unwrap();
        assert_eq!(json.source_ip, "10.0.0.2");

        let cw = router.normalize(CW_LINE.as_bytes()).unwrap();
        assert_eq!(cw.source_ip, "10.0.0.3");
        assert_eq!(cw.http_status, 404);
    }

    #[test]
    fn empty_router_returns_error() {
        let router = NormalizerRouter::new();
        assert!(router.normalize(JSON_LINE.as_bytes()).is_err());
    }

    #[test]
    fn for_format_restricts_normalizers() {
        let router = NormalizerRouter::for_format("s3").unwrap();
        assert_eq!(router.formats(), vec!["s3"]);
        assert!(router.normalize(JSON_LINE.as_bytes()).is_err());

        let router = NormalizerRouter::for_format("auto").unwrap();
        assert_eq!(router.formats(), vec!["s3", "json", "cloudwatch", "gcp"]);
    }

    #[test]
    fn for_format_rejects_unknown() {
        assert!(NormalizerRouter::for_format("syslog").is_err());
    }

    #[test]
    fn batch_skips_malformed_records_and_counts_them() {
        let router = NormalizerRouter::with_defaults();
        let records: Vec<&[u8]> = vec![
            S3_LINE.as_bytes(),
            b"garbage line",
            b"   ",
            JSON_LINE.as_bytes(),
            b"{\"timestamp\":\"nope\"}",
        ];

        let batch = normalize_batch(&router, records);
        assert_eq!(batch.entries.len(), 2);
        assert_eq!(batch.skipped, 2, "blank lines are not counted as skipped");
    }

    #[test]
    fn batch_of_nothing_is_empty() {
        let router = NormalizerRouter::with_defaults();
        let batch = normalize_batch(&router, Vec::<&[u8]>::new());
        assert_eq!(batch, NormalizedBatch::default());
    }
}
