//! Tracing setup for the `honeywatch` binary.
//!
//! Log lines go to stderr so command output on stdout stays machine-readable.
//! The configured level applies to the honeywatch crates only. The HTTP stack
//! behind the Slack and SendGrid channels stays at `warn`, everything else at
//! `error`.

use anyhow::{Result, anyhow};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use honeywatch_core::config::GeneralConfig;

/// Log targets that follow `general.log_level`.
const HONEYWATCH_TARGETS: [&str; 5] = [
    "honeywatch",
    "honeywatch_cli",
    "honeywatch_core",
    "honeywatch_detection",
    "honeywatch_alerting",
];

/// Notification transport crates, noisy at debug.
const TRANSPORT_TARGETS: [&str; 3] = ["hyper", "hyper_util", "reqwest"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    fn parse(value: &str) -> Result<Self> {
        match value {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(anyhow!(
                "unknown log format '{other}', expected 'json' or 'pretty'"
            )),
        }
    }
}

/// `EnvFilter` directives for a validated level.
pub fn filter_directives(level: &str) -> Result<String> {
    let level = level.trim().to_ascii_lowercase();
    level
        .parse::<LevelFilter>()
        .map_err(|_| anyhow!("unknown log level '{level}'"))?;

    let directives: Vec<String> = std::iter::once("error".to_owned())
        .chain(HONEYWATCH_TARGETS.iter().map(|t| format!("{t}={level}")))
        .chain(TRANSPORT_TARGETS.iter().map(|t| format!("{t}=warn")))
        .collect();
    Ok(directives.join(","))
}

/// Installs the global subscriber. `RUST_LOG` replaces the computed filter.
///
/// Call once, before the first tracing macro. The format and level are
/// checked before anything is installed.
pub fn init_tracing(config: &GeneralConfig) -> Result<()> {
    let format = LogFormat::parse(&config.log_format)?;
    let directives = filter_directives(&config.log_level)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

    let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(filter);
    let installed = match format {
        LogFormat::Json => registry.with(layer.json()).try_init(),
        LogFormat::Pretty => registry.with(layer.pretty()).try_init(),
    };
    installed.map_err(|e| anyhow!("failed to initialize {format:?} tracing subscriber: {e}"))
}
