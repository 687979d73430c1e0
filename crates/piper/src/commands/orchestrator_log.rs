use crate::errors::CliError;
use piper_orchestrator::{OrchestratorProvider, Provider};
use std::io::Write;
use tracing::{instrument, warn};

/// Print the pipeline log. Retrieval failures are reported as warnings and
/// never fail the step.
#[instrument(skip_all)]
pub fn execute(provider: &Provider, out: &mut impl Write) -> Result<(), CliError> {
    match provider.log() {
        Ok(log) => out.write_all(&log).map_err(CliError::output),
        Err(e) => {
            warn!(error = %e, orchestrator = provider.orchestrator_type(), "Could not fetch pipeline log");
            Ok(())
        }
    }
}
