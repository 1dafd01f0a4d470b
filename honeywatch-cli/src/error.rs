//! CLI-specific error types and exit code mapping

use honeywatch_core::error::{
    ConfigError, HoneywatchError, IngestionError, PassError, StoreError,
};

/// CLI-specific error type.
///
/// The `exit_code()` method maps errors to process exit codes so that
/// schedulers (cron, systemd timers) can tell a bad config from an
/// unreachable log source.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// The log source could not be read.
    #[error("{0}")]
    Ingestion(#[from] IngestionError),

    /// The event store could not be read or written.
    #[error("{0}")]
    Store(#[from] StoreError),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Logging or metrics setup failed.
    #[error("{0}")]
    Runtime(#[from] anyhow::Error),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                  |
    /// |------|--------------------------|
    /// | 0    | Success                  |
    /// | 1    | General / command error  |
    /// | 2    | Configuration error      |
    /// | 3    | Log source unavailable   |
    /// | 4    | Event store failure      |
    /// | 10   | IO error                 |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Ingestion(_) => 3,
            Self::Store(_) => 4,
            Self::Io(_) => 10,
            Self::JsonSerialize(_) | Self::Command(_) | Self::Runtime(_) => 1,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

impl From<PassError> for CliError {
    fn from(e: PassError) -> Self {
        match e {
            PassError::Ingestion(e) => Self::Ingestion(e),
            PassError::Store(e) => Self::Store(e),
        }
    }
}

impl From<HoneywatchError> for CliError {
    fn from(e: HoneywatchError) -> Self {
        match e {
            HoneywatchError::Config(e) => e.into(),
            HoneywatchError::Ingestion(e) => Self::Ingestion(e),
            HoneywatchError::Store(e) => Self::Store(e),
            HoneywatchError::Io(e) => Self::Io(e),
            other => Self::Command(other.to_string()),
        }
    }
}
