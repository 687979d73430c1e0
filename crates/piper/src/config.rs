//! Run-wide settings shared by every step.

use crate::cli::Cli;
use std::path::PathBuf;
use uuid::Uuid;

/// Settings derived once from the command line and passed to every step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneralConfig {
    pub env_root_path: PathBuf,
    pub correlation_id: String,
    pub no_telemetry: bool,
    pub verbose: bool,
}

impl GeneralConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            env_root_path: cli.env_root_path.clone(),
            correlation_id: cli
                .correlation_id
                .clone()
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            no_telemetry: cli.no_telemetry,
            verbose: cli.verbose,
        }
    }
}
