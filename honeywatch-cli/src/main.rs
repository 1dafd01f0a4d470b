use clap::Parser;
use colored::Colorize;

use honeywatch_cli::cli::{Cli, Commands};
use honeywatch_cli::commands;
use honeywatch_cli::error::CliError;
use honeywatch_cli::logging;
use honeywatch_cli::output::OutputWriter;
use honeywatch_core::config::{GeneralConfig, HoneywatchConfig};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut general = logging_config(&cli).await;
    if let Some(level) = cli.log_level.clone() {
        general.log_level = level;
    }
    logging::init_tracing(&general)?;

    tracing::debug!(config = %cli.config.display(), "honeywatch starting");

    let writer = OutputWriter::new(cli.output);
    match cli.command {
        Commands::Analyze(args) => commands::analyze::execute(args, &cli.config, &writer).await,
        Commands::Monitor(args) => commands::monitor::execute(args, &cli.config, &writer).await,
        Commands::Events(args) => commands::events::execute(args, &cli.config, &writer).await,
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
    }
}

/// `[general]` from the config file, or defaults when it cannot be loaded.
///
/// A broken config still gets logging so that `config validate` can report it.
async fn logging_config(cli: &Cli) -> GeneralConfig {
    match HoneywatchConfig::load(&cli.config).await {
        Ok(config) => config.general,
        Err(_) => GeneralConfig {
            log_format: "pretty".to_owned(),
            ..GeneralConfig::default()
        },
    }
}
