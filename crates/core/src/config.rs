//! 설정 관리 -- honeywatch.toml 파싱 및 런타임 설정
//!
//! [`HoneywatchConfig`]는 모든 크레이트의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`HONEYWATCH_DETECTION_BULK_THRESHOLD=20` 형식)
//! 3. 설정 파일 (`honeywatch.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), honeywatch_core::error::HoneywatchError> {
//! use honeywatch_core::config::HoneywatchConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = HoneywatchConfig::load("honeywatch.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = HoneywatchConfig::parse("[detection]\nbulk_threshold = 20")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, HoneywatchError};

/// Honeywatch 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HoneywatchConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 분석 패스 설정
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// 탐지 임계값
    #[serde(default)]
    pub detection: Thresholds,
    /// 이벤트 저장소 설정
    #[serde(default)]
    pub store: StoreConfig,
    /// 알림 채널 설정
    #[serde(default)]
    pub alerts: AlertsConfig,
    /// Prometheus 메트릭 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl HoneywatchConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, HoneywatchError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, HoneywatchError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                HoneywatchError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                HoneywatchError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, HoneywatchError> {
        toml::from_str(toml_str).map_err(|e| {
            HoneywatchError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `HONEYWATCH_{SECTION}_{FIELD}`
    /// 예: `HONEYWATCH_ALERTS_SLACK_WEBHOOK_URL=https://hooks.slack.com/...`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "HONEYWATCH_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "HONEYWATCH_GENERAL_LOG_FORMAT");

        // Analysis
        override_string(&mut self.analysis.log_path, "HONEYWATCH_ANALYSIS_LOG_PATH");
        override_string(&mut self.analysis.log_format, "HONEYWATCH_ANALYSIS_LOG_FORMAT");
        override_u64(
            &mut self.analysis.lookback_secs,
            "HONEYWATCH_ANALYSIS_LOOKBACK_SECS",
        );
        override_u64(
            &mut self.analysis.interval_secs,
            "HONEYWATCH_ANALYSIS_INTERVAL_SECS",
        );
        override_string(&mut self.analysis.region, "HONEYWATCH_ANALYSIS_REGION");

        // Detection
        let d = &mut self.detection;
        override_usize(&mut d.bulk_threshold, "HONEYWATCH_DETECTION_BULK_THRESHOLD");
        override_usize(&mut d.rapid_threshold, "HONEYWATCH_DETECTION_RAPID_THRESHOLD");
        override_u64(
            &mut d.rapid_window_secs,
            "HONEYWATCH_DETECTION_RAPID_WINDOW_SECS",
        );
        override_u32(&mut d.off_hours_start, "HONEYWATCH_DETECTION_OFF_HOURS_START");
        override_u32(&mut d.off_hours_end, "HONEYWATCH_DETECTION_OFF_HOURS_END");
        override_usize(
            &mut d.off_hours_min_count,
            "HONEYWATCH_DETECTION_OFF_HOURS_MIN_COUNT",
        );
        override_usize(
            &mut d.failed_attempts_threshold,
            "HONEYWATCH_DETECTION_FAILED_ATTEMPTS_THRESHOLD",
        );
        override_usize(
            &mut d.credential_stuffing_threshold,
            "HONEYWATCH_DETECTION_CREDENTIAL_STUFFING_THRESHOLD",
        );
        override_u64(
            &mut d.credential_stuffing_window_secs,
            "HONEYWATCH_DETECTION_CREDENTIAL_STUFFING_WINDOW_SECS",
        );
        override_u64(
            &mut d.exfiltration_threshold_bytes,
            "HONEYWATCH_DETECTION_EXFILTRATION_THRESHOLD_BYTES",
        );
        override_u64(
            &mut d.default_object_bytes,
            "HONEYWATCH_DETECTION_DEFAULT_OBJECT_BYTES",
        );
        override_usize(
            &mut d.port_scan_resource_threshold,
            "HONEYWATCH_DETECTION_PORT_SCAN_RESOURCE_THRESHOLD",
        );
        override_u64(
            &mut d.port_scan_window_secs,
            "HONEYWATCH_DETECTION_PORT_SCAN_WINDOW_SECS",
        );
        override_usize(
            &mut d.beaconing_min_samples,
            "HONEYWATCH_DETECTION_BEACONING_MIN_SAMPLES",
        );
        override_f64(&mut d.beaconing_max_cv, "HONEYWATCH_DETECTION_BEACONING_MAX_CV");
        override_csv(
            &mut d.suspicious_user_agents,
            "HONEYWATCH_DETECTION_SUSPICIOUS_USER_AGENTS",
        );

        // Store
        override_string(&mut self.store.path, "HONEYWATCH_STORE_PATH");
        override_u64(
            &mut self.store.bucket_granularity_secs,
            "HONEYWATCH_STORE_BUCKET_GRANULARITY_SECS",
        );
        override_usize(&mut self.store.query_limit, "HONEYWATCH_STORE_QUERY_LIMIT");

        // Alerts
        override_bool(&mut self.alerts.enabled, "HONEYWATCH_ALERTS_ENABLED");
        override_u64(
            &mut self.alerts.request_timeout_secs,
            "HONEYWATCH_ALERTS_REQUEST_TIMEOUT_SECS",
        );
        override_bool(
            &mut self.alerts.slack.enabled,
            "HONEYWATCH_ALERTS_SLACK_ENABLED",
        );
        override_string(
            &mut self.alerts.slack.webhook_url,
            "HONEYWATCH_ALERTS_SLACK_WEBHOOK_URL",
        );
        override_bool(
            &mut self.alerts.email.enabled,
            "HONEYWATCH_ALERTS_EMAIL_ENABLED",
        );
        override_string(
            &mut self.alerts.email.sendgrid_api_key,
            "HONEYWATCH_ALERTS_EMAIL_SENDGRID_API_KEY",
        );
        override_string(
            &mut self.alerts.email.from_address,
            "HONEYWATCH_ALERTS_EMAIL_FROM_ADDRESS",
        );
        override_csv(
            &mut self.alerts.email.to_addresses,
            "HONEYWATCH_ALERTS_EMAIL_TO_ADDRESSES",
        );

        // Metrics
        override_bool(&mut self.metrics.enabled, "HONEYWATCH_METRICS_ENABLED");
        override_string(
            &mut self.metrics.listen_addr,
            "HONEYWATCH_METRICS_LISTEN_ADDR",
        );
        override_u16(&mut self.metrics.port, "HONEYWATCH_METRICS_PORT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), HoneywatchError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        // 입력 로그 형식 검증
        let valid_sources = ["auto", "s3", "cloudwatch", "gcp", "json"];
        if !valid_sources.contains(&self.analysis.log_format.as_str()) {
            return Err(invalid(
                "analysis.log_format",
                format!("must be one of: {}", valid_sources.join(", ")),
            ));
        }

        if self.analysis.lookback_secs == 0 {
            return Err(invalid("analysis.lookback_secs", "must be at least 1"));
        }
        if self.analysis.interval_secs == 0 {
            return Err(invalid("analysis.interval_secs", "must be at least 1"));
        }

        self.detection.validate()?;

        if self.store.bucket_granularity_secs == 0 {
            return Err(invalid("store.bucket_granularity_secs", "must be at least 1"));
        }
        if self.store.query_limit == 0 {
            return Err(invalid("store.query_limit", "must be at least 1"));
        }

        if self.alerts.slack.enabled && self.alerts.slack.webhook_url.is_empty() {
            return Err(invalid(
                "alerts.slack.webhook_url",
                "webhook_url must not be empty when slack is enabled",
            ));
        }

        if self.alerts.email.enabled {
            if self.alerts.email.sendgrid_api_key.is_empty() {
                return Err(invalid(
                    "alerts.email.sendgrid_api_key",
                    "api key must not be empty when email is enabled",
                ));
            }
            if self.alerts.email.from_address.is_empty() {
                return Err(invalid(
                    "alerts.email.from_address",
                    "from_address must not be empty when email is enabled",
                ));
            }
            if self.alerts.email.to_addresses.is_empty() {
                return Err(invalid(
                    "alerts.email.to_addresses",
                    "at least one recipient is required when email is enabled",
                ));
            }
        }

        if self.metrics.enabled && self.metrics.port == 0 {
            return Err(invalid("metrics.port", "must be non-zero when metrics are enabled"));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> HoneywatchError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: reason.into(),
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 분석 패스 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// 접근 로그 파일 또는 디렉토리 경로
    pub log_path: String,
    /// 입력 로그 형식 (auto, s3, cloudwatch, gcp, json)
    pub log_format: String,
    /// 분석 창 길이 (초)
    pub lookback_secs: u64,
    /// monitor 모드 패스 주기 (초)
    pub interval_secs: u64,
    /// 이벤트에 기록할 리전
    pub region: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            log_path: "/var/log/honeywatch/access".to_owned(),
            log_format: "auto".to_owned(),
            lookback_secs: 3600,
            interval_secs: 300,
            region: "us-east-1".to_owned(),
        }
    }
}

/// 탐지기 임계값
///
/// 모든 탐지기가 같은 인스턴스를 읽기 전용으로 공유합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// BulkDownload: IP별 성공 GET 최소 건수
    pub bulk_threshold: usize,
    /// RapidAccess: 창 안의 최소 요청 수
    pub rapid_threshold: usize,
    /// RapidAccess: 창 길이 (초)
    pub rapid_window_secs: u64,
    /// AbnormalHours: 업무 외 시간 시작 (UTC 시, 포함)
    pub off_hours_start: u32,
    /// AbnormalHours: 업무 외 시간 끝 (UTC 시, 제외)
    pub off_hours_end: u32,
    /// AbnormalHours: 최소 요청 수
    pub off_hours_min_count: usize,
    /// FailedAccessAttempts: 401/403/404 최소 건수
    pub failed_attempts_threshold: usize,
    /// CredentialStuffing: 창 안의 401/403 최소 건수
    pub credential_stuffing_threshold: usize,
    /// CredentialStuffing: 창 길이 (초)
    pub credential_stuffing_window_secs: u64,
    /// DataExfiltration: 성공 GET 누적 바이트 임계값
    pub exfiltration_threshold_bytes: u64,
    /// DataExfiltration: 크기 정보가 없는 GET의 추정 바이트
    pub default_object_bytes: u64,
    /// PortScanning: 창 안의 고유 리소스 최소 수
    pub port_scan_resource_threshold: usize,
    /// PortScanning: 창 길이 (초)
    pub port_scan_window_secs: u64,
    /// BeaconingPattern: 최소 요청 수
    pub beaconing_min_samples: usize,
    /// BeaconingPattern: 간격 변동계수 상한 (미만이면 탐지)
    pub beaconing_max_cv: f64,
    /// SuspiciousUserAgent: 소문자 부분 문자열 목록
    pub suspicious_user_agents: Vec<String>,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            bulk_threshold: 10,
            rapid_threshold: 5,
            rapid_window_secs: 60,
            off_hours_start: 0,
            off_hours_end: 6,
            off_hours_min_count: 3,
            failed_attempts_threshold: 5,
            credential_stuffing_threshold: 5,
            credential_stuffing_window_secs: 60,
            exfiltration_threshold_bytes: 100 * 1024 * 1024, // 100MiB
            default_object_bytes: 1024 * 1024,               // 1MiB
            port_scan_resource_threshold: 20,
            port_scan_window_secs: 120,
            beaconing_min_samples: 5,
            beaconing_max_cv: 0.1,
            suspicious_user_agents: [
                "curl", "wget", "python", "bot", "crawler", "scanner", "script",
            ]
            .iter()
            .map(|s| (*s).to_owned())
            .collect(),
        }
    }
}

impl Thresholds {
    /// 임계값 조합의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), HoneywatchError> {
        let counts = [
            ("detection.bulk_threshold", self.bulk_threshold),
            ("detection.rapid_threshold", self.rapid_threshold),
            ("detection.off_hours_min_count", self.off_hours_min_count),
            (
                "detection.failed_attempts_threshold",
                self.failed_attempts_threshold,
            ),
            (
                "detection.credential_stuffing_threshold",
                self.credential_stuffing_threshold,
            ),
            (
                "detection.port_scan_resource_threshold",
                self.port_scan_resource_threshold,
            ),
        ];
        for (field, value) in counts {
            if value == 0 {
                return Err(invalid(field, "must be at least 1"));
            }
        }

        let windows = [
            ("detection.rapid_window_secs", self.rapid_window_secs),
            (
                "detection.credential_stuffing_window_secs",
                self.credential_stuffing_window_secs,
            ),
            ("detection.port_scan_window_secs", self.port_scan_window_secs),
            (
                "detection.exfiltration_threshold_bytes",
                self.exfiltration_threshold_bytes,
            ),
        ];
        for (field, value) in windows {
            if value == 0 {
                return Err(invalid(field, "must be at least 1"));
            }
        }

        if self.off_hours_end > 24 || self.off_hours_start >= self.off_hours_end {
            return Err(invalid(
                "detection.off_hours_start",
                format!(
                    "off-hours range [{}, {}) must satisfy start < end <= 24",
                    self.off_hours_start, self.off_hours_end
                ),
            ));
        }

        if self.beaconing_min_samples < 3 {
            return Err(invalid(
                "detection.beaconing_min_samples",
                "must be at least 3 (two intervals are needed for a variance)",
            ));
        }

        if !self.beaconing_max_cv.is_finite() || self.beaconing_max_cv <= 0.0 {
            return Err(invalid(
                "detection.beaconing_max_cv",
                "must be a positive finite number",
            ));
        }

        if self.suspicious_user_agents.iter().any(|s| s.is_empty()) {
            return Err(invalid(
                "detection.suspicious_user_agents",
                "patterns must not be empty strings",
            ));
        }

        Ok(())
    }
}

/// 이벤트 저장소 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON-lines 이벤트 파일 경로
    pub path: String,
    /// 이벤트 식별자 버킷 단위 (초)
    pub bucket_granularity_secs: u64,
    /// 조회 기본 최대 건수
    pub query_limit: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "/var/lib/honeywatch/events.jsonl".to_owned(),
            bucket_granularity_secs: 3600,
            query_limit: 100,
        }
    }
}

/// 알림 채널 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    /// 알림 전체 활성화 여부 (false면 저장만 수행)
    pub enabled: bool,
    /// 채널 HTTP 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
    /// tracing 로그로 알림 내용을 남길지 여부
    pub log_channel: bool,
    /// Slack 웹훅
    #[serde(default)]
    pub slack: SlackConfig,
    /// SendGrid 이메일
    #[serde(default)]
    pub email: EmailConfig,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            request_timeout_secs: 10,
            log_channel: true,
            slack: SlackConfig::default(),
            email: EmailConfig::default(),
        }
    }
}

/// Slack 웹훅 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// Incoming webhook URL
    pub webhook_url: String,
}

/// SendGrid 이메일 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// SendGrid API 키
    pub sendgrid_api_key: String,
    /// 발신 주소
    pub from_address: String,
    /// 수신 주소 목록
    pub to_addresses: Vec<String>,
    /// SendGrid mail/send 엔드포인트
    pub api_url: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            sendgrid_api_key: String::new(),
            from_address: String::new(),
            to_addresses: Vec::new(),
            api_url: "https://api.sendgrid.com/v3/mail/send".to_owned(),
        }
    }
}

/// Prometheus 메트릭 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// 활성화 여부 (monitor 모드에서만 사용)
    pub enabled: bool,
    /// 리스닝 주소
    pub listen_addr: String,
    /// 리스닝 포트
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9100,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_parsed<T: std::str::FromStr>(target: &mut T, env_key: &str, type_name: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<T>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                expected = type_name,
                "failed to parse env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    override_parsed(target, env_key, "usize");
}

fn override_u16(target: &mut u16, env_key: &str) {
    override_parsed(target, env_key, "u16");
}

fn override_u32(target: &mut u32, env_key: &str) {
    override_parsed(target, env_key, "u32");
}

fn override_u64(target: &mut u64, env_key: &str) {
    override_parsed(target, env_key, "u64");
}

fn override_f64(target: &mut f64, env_key: &str) {
    override_parsed(target, env_key, "f64");
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn default_config_has_sane_values() {
        let config = HoneywatchConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "json");
        assert_eq!(config.analysis.lookback_secs, 3600);
        assert_eq!(config.detection.bulk_threshold, 10);
        assert_eq!(config.detection.exfiltration_threshold_bytes, 104_857_600);
        assert_eq!(config.store.bucket_granularity_secs, 3600);
        assert!(!config.alerts.slack.enabled);
        assert!(!config.alerts.email.enabled);
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn default_config_passes_validation() {
        let config = HoneywatchConfig::default();
        config.validate().unwrap();
    }

    #[test]
    fn from_str_empty_toml_uses_defaults() {
        let config = HoneywatchConfig::parse("").unwrap();
        assert_eq!(config.detection, Thresholds::default());
        assert_eq!(config.analysis.region, "us-east-1");
    }

    #[test]
    fn from_str_partial_toml_merges_with_defaults() {
        let toml = r#"
[detection]
bulk_threshold = 25
beaconing_max_cv = 0.2

[alerts.slack]
enabled = true
webhook_url = "https://hooks.slack.com/services/T000/B000/XXX"
"#;
        let config = HoneywatchConfig::parse(toml).unwrap();
        assert_eq!(config.detection.bulk_threshold, 25);
        assert!((config.detection.beaconing_max_cv - 0.2).abs() < f64::EPSILON);
        // 나머지 임계값은 기본값 유지
        assert_eq!(config.detection.rapid_threshold, 5);
        assert!(config.alerts.slack.enabled);
        assert!(config.alerts.enabled);
        config.validate().unwrap();
    }

    #[test]
    fn from_str_invalid_toml_returns_error() {
        let err = HoneywatchConfig::parse("invalid = [[[toml").unwrap_err();
        assert!(matches!(
            err,
            HoneywatchError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = HoneywatchConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_unknown_source_format() {
        let mut config = HoneywatchConfig::default();
        config.analysis.log_format = "csv".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("analysis.log_format"));
    }

    #[test]
    fn validate_rejects_zero_threshold() {
        let mut config = HoneywatchConfig::default();
        config.detection.rapid_threshold = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("detection.rapid_threshold"));
    }

    #[test]
    fn validate_rejects_inverted_off_hours() {
        let mut config = HoneywatchConfig::default();
        config.detection.off_hours_start = 6;
        config.detection.off_hours_end = 2;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("off_hours"));
    }

    #[test]
    fn validate_rejects_non_positive_cv() {
        let mut config = HoneywatchConfig::default();
        config.detection.beaconing_max_cv = 0.0;
        assert!(config.validate().is_err());
        config.detection.beaconing_max_cv = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_slack_without_webhook() {
        let mut config = HoneywatchConfig::default();
        config.alerts.slack.enabled = true;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("webhook_url"));
    }

    #[test]
    fn validate_rejects_email_without_recipients() {
        let mut config = HoneywatchConfig::default();
        config.alerts.email.enabled = true;
        config.alerts.email.sendgrid_api_key = "SG.key".to_owned();
        config.alerts.email.from_address = "honeywatch@example.com".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("to_addresses"));
    }

    #[test]
    fn validate_accepts_disabled_email_without_fields() {
        let mut config = HoneywatchConfig::default();
        config.alerts.email.enabled = false;
        config.alerts.email.sendgrid_api_key.clear();
        config.validate().unwrap();
    }

    #[test]
    #[serial]
    fn env_override_string() {
        let mut val = "original".to_owned();
        // SAFETY: serial 테스트로 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("TEST_HONEYWATCH_STR", "overridden") };
        override_string(&mut val, "TEST_HONEYWATCH_STR");
        assert_eq!(val, "overridden");
        unsafe { std::env::remove_var("TEST_HONEYWATCH_STR") };
    }

    #[test]
    #[serial]
    fn env_override_f64_invalid_keeps_original() {
        let mut val = 0.1;
        // SAFETY: serial 테스트로 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("TEST_HONEYWATCH_F64_BAD", "ten percent") };
        override_f64(&mut val, "TEST_HONEYWATCH_F64_BAD");
        assert!((val - 0.1).abs() < f64::EPSILON);
        unsafe { std::env::remove_var("TEST_HONEYWATCH_F64_BAD") };
    }

    #[test]
    #[serial]
    fn env_override_csv_skips_blank_items() {
        let mut val = vec!["a".to_owned()];
        // SAFETY: serial 테스트로 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("TEST_HONEYWATCH_CSV", "curl, ,nikto") };
        override_csv(&mut val, "TEST_HONEYWATCH_CSV");
        assert_eq!(val, vec!["curl", "nikto"]);
        unsafe { std::env::remove_var("TEST_HONEYWATCH_CSV") };
    }

    #[test]
    #[serial]
    fn apply_env_overrides_updates_thresholds() {
        let mut config = HoneywatchConfig::default();
        // SAFETY: serial 테스트로 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("HONEYWATCH_DETECTION_BULK_THRESHOLD", "42") };
        config.apply_env_overrides();
        assert_eq!(config.detection.bulk_threshold, 42);
        unsafe { std::env::remove_var("HONEYWATCH_DETECTION_BULK_THRESHOLD") };
    }
}
