//! Step implementations.
//!
//! Each step writes its result to the given writer and returns a
//! [`CliError`] on failure; telemetry and exit codes are handled by the
//! caller.

pub mod orchestrator_info;
pub mod orchestrator_log;
pub mod read_pipeline_env;
pub mod version;

use crate::cli::Commands;
use crate::config::GeneralConfig;
use crate::errors::CliError;
use piper_orchestrator::Provider;
use std::io::Write;

/// Run `command` against `provider`.
pub fn execute(
    command: &Commands,
    config: &GeneralConfig,
    provider: &Provider,
    out: &mut impl Write,
) -> Result<(), CliError> {
    match command {
        Commands::OrchestratorInfo { json } => orchestrator_info::execute(provider, *json, out),
        Commands::OrchestratorLog { .. } => orchestrator_log::execute(provider, out),
        Commands::ReadPipelineEnv { secret } => {
            read_pipeline_env::execute(config, provider, secret.as_deref(), out)
        }
        Commands::Version => version::execute(config, out),
    }
}
