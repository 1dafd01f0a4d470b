//! `honeywatch monitor` command handler
//!
//! Runs an analysis pass every `interval_secs` until Ctrl-C. Each pass is
//! awaited before the next tick, and ticks missed while a pass runs are
//! skipped, so passes never overlap. A failed pass is logged and the loop
//! carries on with the next tick.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use honeywatch_alerting::AnalysisPass;
use honeywatch_core::pipeline::{EventStore, LogSource};
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::MonitorArgs;
use crate::commands::{build_pass, load_config, log_source};
use crate::error::CliError;
use crate::metrics_server;
use crate::output::{OutputWriter, Render};

/// Execute the `monitor` command.
pub async fn execute(
    args: MonitorArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let mut config = load_config(config_path).await?;
    if let Some(secs) = args.interval_secs {
        config.analysis.interval_secs = secs;
        config.validate()?;
    }

    if config.metrics.enabled {
        metrics_server::install_metrics_recorder(&config)?;
    }

    let source = log_source(&config, args.logs.as_deref())?;
    let pass = build_pass(&config, true).await?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received Ctrl-C, stopping after the current pass");
        }
        ctrl_c.cancel();
    });

    info!(
        logs = %source.path().display(),
        interval_secs = config.analysis.interval_secs,
        "monitor started"
    );

    let interval = Duration::from_secs(config.analysis.interval_secs);
    let summary = run_loop(&pass, &source, interval, args.max_passes, &cancel).await;

    info!(passes = summary.passes, failed = summary.failed_passes, "monitor stopped");
    writer.render(&summary)?;
    Ok(())
}

/// Totals across every pass of one `monitor` run.
#[derive(Debug, Default, Serialize)]
pub struct MonitorSummary {
    pub passes: u64,
    pub failed_passes: u64,
    pub events_detected: usize,
    pub stored: usize,
    pub duplicates: usize,
    pub notifications_sent: usize,
    pub notifications_failed: usize,
}

/// Run passes until `cancel` fires or `max_passes` is reached.
pub async fn run_loop<S, L>(
    pass: &AnalysisPass<S>,
    source: &L,
    interval: Duration,
    max_passes: Option<u64>,
    cancel: &CancellationToken,
) -> MonitorSummary
where
    S: EventStore,
    L: LogSource,
{
    let mut summary = MonitorSummary::default();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        if max_passes.is_some_and(|max| summary.passes >= max) {
            break;
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        summary.passes += 1;
        match pass.run(source, Utc::now()).await {
            Ok(report) => {
                summary.events_detected += report.events_detected;
                summary.stored += report.stored;
                summary.duplicates += report.duplicates;
                summary.notifications_sent += report.dispatch.sent();
                summary.notifications_failed += report.dispatch.failed();
                info!(
                    pass_id = %report.pass_id,
                    detected = report.events_detected,
                    stored = report.stored,
                    "pass finished"
                );
            }
            Err(e) => {
                summary.failed_passes += 1;
                warn!(error = %e, "pass failed, retrying on the next tick");
            }
        }
    }

    summary
}

impl Render for MonitorSummary {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "Monitor stopped after {} passes ({} failed)", self.passes, self.failed_passes)?;
        writeln!(
            w,
            "  Events:        {} detected, {} stored, {} duplicate",
            self.events_detected, self.stored, self.duplicates
        )?;
        writeln!(
            w,
            "  Notifications: {} sent, {} failed",
            self.notifications_sent, self.notifications_failed
        )?;
        Ok(())
    }
}
