//! `piper` command line: runs one pipeline step per invocation.

mod cli;
mod commands;
mod config;
mod errors;
mod tracing;

use crate::cli::{Cli, Commands};
use crate::config::GeneralConfig;
use crate::errors::CliError;
use crate::tracing::{Level, TracingConfig};
use piper_core::{env, redaction::Redactor};
use piper_orchestrator::{LogOptions, Provider, UnknownProvider};
use piper_telemetry::{CustomData, Telemetry, TelemetryConfig};
use std::time::{Duration, Instant};

#[allow(clippy::print_stderr)]
fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    if let Err(error) = run_main() {
        eprintln!("{error:?}");
        std::process::exit(1);
    }
}

fn run_main() -> miette::Result<()> {
    let cli = cli::parse();
    let config = GeneralConfig::from_cli(&cli);

    let redactor = redactor_for(&cli);
    let tracing_config = TracingConfig {
        format: cli.log_format,
        level: if config.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        },
    };
    crate::tracing::init_tracing(&tracing_config, &redactor)?;

    let span = ::tracing::info_span!(
        "piper",
        correlation_id = %config.correlation_id,
        step = cli.command.step_name(),
        start_time = %chrono::Utc::now().to_rfc3339(),
    );
    let _guard = span.enter();

    run_step(&cli, &config)?;
    Ok(())
}

/// Every secret the run knows about, for log redaction.
fn redactor_for(cli: &Cli) -> Redactor {
    let mut redactor = Redactor::new();
    if let Commands::ReadPipelineEnv {
        secret: Some(secret),
    } = &cli.command
    {
        redactor = redactor.with_secret(secret.clone());
    }
    if let Some(token) = &cli.telemetry_token {
        redactor = redactor.with_secret(token.clone());
    }
    if let Some(token) = env::var_opt("GITHUB_TOKEN") {
        redactor = redactor.with_secret(token);
    }
    redactor
}

/// Run the selected step and record its telemetry.
fn run_step(cli: &Cli, config: &GeneralConfig) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();

    if matches!(cli.command, Commands::Version) {
        let provider = Provider::Unknown(UnknownProvider);
        return commands::execute(&cli.command, config, &provider, &mut stdout);
    }

    let provider = match &cli.command {
        Commands::OrchestratorLog {
            timeout_secs,
            max_retries,
        } => Provider::detect().with_log_options(LogOptions {
            timeout: Duration::from_secs(*timeout_secs),
            max_retries: *max_retries,
        }),
        _ => Provider::detect(),
    };

    let step = cli.command.step_name();
    let start = Instant::now();
    let result = commands::execute(&cli.command, config, &provider, &mut stdout);
    let duration_ms = start.elapsed().as_millis();

    let mut telemetry_config = TelemetryConfig::default().with_disabled(config.no_telemetry);
    if let Some(token) = &cli.telemetry_token {
        telemetry_config = telemetry_config.with_token(token.clone());
    }
    let mut telemetry = Telemetry::new(telemetry_config, step, &provider);
    match &result {
        Ok(()) => telemetry.set_data(CustomData::new(duration_ms, "0")),
        Err(e) => {
            telemetry.set_data(CustomData {
                error_category: e.category().to_string(),
                ..CustomData::new(duration_ms, "1")
            });
            telemetry.set_error_detail(serde_json::json!({
                "message": e.to_string(),
                "error": DisplayChain(e).to_string(),
                "category": e.category(),
                "correlationId": config.correlation_id,
            }));
        }
    }
    telemetry.send();

    result
}

/// Error message including its source chain.
struct DisplayChain<'a>(&'a dyn std::error::Error);

impl std::fmt::Display for DisplayChain<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)?;
        let mut source = self.0.source();
        while let Some(err) = source {
            write!(f, ": {err}")?;
            source = err.source();
        }
        Ok(())
    }
}
