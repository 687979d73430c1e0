use crate::config::GeneralConfig;
use crate::errors::CliError;
use piper_orchestrator::{OrchestratorProvider, Provider};
use std::io::Write;
use tracing::instrument;

#[instrument(skip_all, fields(env_root = %config.env_root_path.display()))]
pub fn execute(
    config: &GeneralConfig,
    provider: &Provider,
    secret: Option<&str>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let rendered =
        piper_pipeline_env::read_pipeline_env(&config.env_root_path, secret, provider.orchestrator())
            .map_err(|e| CliError::step_failed("readPipelineEnv", e))?;
    out.write_all(rendered.as_bytes()).map_err(CliError::output)
}
