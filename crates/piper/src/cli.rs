use crate::tracing::TracingFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "piper")]
#[command(about = "Pipeline steps with orchestrator-aware metadata, logs and telemetry")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        long,
        global = true,
        env = "PIPER_envRootPath",
        default_value = ".pipeline",
        help = "Root directory of the pipeline environment"
    )]
    pub env_root_path: PathBuf,

    #[arg(
        long,
        global = true,
        help = "Correlation ID for this run (generated when omitted)"
    )]
    pub correlation_id: Option<String>,

    #[arg(
        long,
        global = true,
        env = "PIPER_noTelemetry",
        help = "Do not send telemetry"
    )]
    pub no_telemetry: bool,

    #[arg(
        long,
        global = true,
        env = "PIPER_telemetryToken",
        hide = true,
        hide_env_values = true
    )]
    pub telemetry_token: Option<String>,

    #[arg(short, long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value = "compact",
        help = "Log output format"
    )]
    pub log_format: TracingFormat,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Print the detected orchestrator and its pipeline metadata")]
    OrchestratorInfo {
        #[arg(long, help = "Print as JSON")]
        json: bool,
    },
    #[command(about = "Print the log of the current pipeline run")]
    OrchestratorLog {
        #[arg(long, default_value_t = 30, help = "Per-request timeout in seconds")]
        timeout_secs: u64,
        #[arg(long, default_value_t = 2, help = "Retries after the first attempt")]
        max_retries: u32,
    },
    #[command(about = "Print the common pipeline environment as JSON")]
    ReadPipelineEnv {
        #[arg(
            long,
            env = "PIPER_pipelineEnv_SECRET",
            hide_env_values = true,
            help = "Encrypt the output with this secret"
        )]
        secret: Option<String>,
    },
    #[command(about = "Show version information")]
    Version,
}

impl Commands {
    /// Step name reported in telemetry.
    pub const fn step_name(&self) -> &'static str {
        match self {
            Self::OrchestratorInfo { .. } => "orchestratorInfo",
            Self::OrchestratorLog { .. } => "orchestratorLog",
            Self::ReadPipelineEnv { .. } => "readPipelineEnv",
            Self::Version => "version",
        }
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}
