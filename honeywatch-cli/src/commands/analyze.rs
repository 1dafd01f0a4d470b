//! `honeywatch analyze` command handler

use std::io::Write;
use std::path::Path;

use chrono::Utc;
use colored::Colorize;
use honeywatch_alerting::{DeliveryOutcome, PassReport};
use tracing::info;

use crate::cli::AnalyzeArgs;
use crate::commands::{build_pass, hours_to_secs, load_config, log_source};
use crate::error::CliError;
use crate::output::{OutputWriter, Render, write_event_row};

/// Execute the `analyze` command.
///
/// Runs exactly one pass. An unreadable log source exits with code 3 and a
/// failing store with code 4; channel failures only show up in the report.
pub async fn execute(
    args: AnalyzeArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let mut config = load_config(config_path).await?;
    if let Some(hours) = args.hours {
        config.analysis.lookback_secs = hours_to_secs(hours)?;
        config.validate()?;
    }

    let source = log_source(&config, args.logs.as_deref())?;
    let pass = build_pass(&config, !args.no_alerts).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    info!(
        logs = %source.path().display(),
        store = %pass.store().path().display(),
        alerts = !args.no_alerts,
        "running analysis pass"
    );

    let report = pass.run(&source, now).await?;
    writer.render(&report)?;
    Ok(())
}

impl Render for PassReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "Analysis pass {}", self.pass_id.to_string().bold())?;
        writeln!(w, "  Window:  {}", self.window)?;
        writeln!(w, "  Entries: {}", self.entries)?;
        writeln!(
            w,
            "  Events:  {} detected, {} stored, {} duplicate",
            self.events_detected, self.stored, self.duplicates
        )?;
        if !self.failed_detectors.is_empty() {
            let names: Vec<&str> = self.failed_detectors.iter().map(|t| t.as_str()).collect();
            writeln!(
                w,
                "  {} detectors without results: {}",
                "WARNING".yellow().bold(),
                names.join(", ")
            )?;
        }

        if !self.events.is_empty() {
            writeln!(w)?;
            for upserted in &self.events {
                write_event_row(w, &upserted.event)?;
                writeln!(w, "  ({})", upserted.outcome)?;
            }
        }

        writeln!(w)?;
        writeln!(
            w,
            "Notifications: {} sent, {} failed, {} skipped",
            self.dispatch.sent(),
            self.dispatch.failed(),
            self.dispatch.skipped()
        )?;
        for record in &self.dispatch.records {
            if let DeliveryOutcome::Failed(reason) = &record.outcome {
                writeln!(
                    w,
                    "  {} {}: {} ({})",
                    "FAILED".red().bold(),
                    record.channel,
                    record.subject,
                    reason
                )?;
            }
        }

        Ok(())
    }
}
