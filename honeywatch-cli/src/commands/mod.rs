//! Command handlers -- one module per subcommand

pub mod analyze;
pub mod config;
pub mod events;
pub mod monitor;

use std::path::Path;

use honeywatch_alerting::{AlertDispatcher, AnalysisPass, JsonFileEventStore, build_channels};
use honeywatch_core::config::HoneywatchConfig;
use honeywatch_detection::FileLogSource;

use crate::error::CliError;

/// Load the config file with env overrides, then validate it.
pub(crate) async fn load_config(config_path: &Path) -> Result<HoneywatchConfig, CliError> {
    Ok(HoneywatchConfig::load(config_path).await?)
}

/// Convert a `--hours` flag into seconds.
pub(crate) fn hours_to_secs(hours: u64) -> Result<u64, CliError> {
    hours
        .checked_mul(3600)
        .ok_or_else(|| CliError::Command(format!("--hours {hours} is out of range")))
}

/// File log source for `--logs`, falling back to `analysis.log_path`.
pub(crate) fn log_source(
    config: &HoneywatchConfig,
    logs: Option<&Path>,
) -> Result<FileLogSource, CliError> {
    let path = logs.unwrap_or_else(|| Path::new(&config.analysis.log_path));
    Ok(FileLogSource::for_format(path, &config.analysis.log_format)?)
}

/// Analysis pass over the JSON-lines store named in `store.path`.
///
/// With `alerts` off the dispatcher has no channels, so events are stored
/// but nothing is sent.
pub(crate) async fn build_pass(
    config: &HoneywatchConfig,
    alerts: bool,
) -> Result<AnalysisPass<JsonFileEventStore>, CliError> {
    let store = JsonFileEventStore::open(config.store.path.as_str()).await?;
    let channels = if alerts {
        build_channels(&config.alerts).map_err(|e| CliError::Command(e.to_string()))?
    } else {
        Vec::new()
    };
    let dispatcher = AlertDispatcher::new(channels);
    Ok(AnalysisPass::from_config(config, store, dispatcher))
}
