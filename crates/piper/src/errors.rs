//! CLI error types rendered through miette.

use miette::Diagnostic;
use thiserror::Error;

/// Errors that end a step.
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("Step {step} failed")]
    #[diagnostic(code(piper::cli::step_failed))]
    StepFailed {
        step: &'static str,
        #[source]
        #[diagnostic_source]
        source: piper_core::Error,
    },

    #[error("Failed to write step output")]
    #[diagnostic(
        code(piper::cli::output),
        help("Check that stdout is open and writable")
    )]
    Output {
        #[source]
        source: std::io::Error,
    },
}

impl CliError {
    pub const fn step_failed(step: &'static str, source: piper_core::Error) -> Self {
        Self::StepFailed { step, source }
    }

    pub const fn output(source: std::io::Error) -> Self {
        Self::Output { source }
    }

    /// Error category reported in telemetry.
    pub const fn category(&self) -> &'static str {
        match self {
            Self::StepFailed { source, .. } => match source {
                piper_core::Error::Configuration(_)
                | piper_core::Error::Unsupported { .. }
                | piper_core::Error::Encryption(_) => "configuration",
                piper_core::Error::Http { .. }
                | piper_core::Error::HttpStatus { .. }
                | piper_core::Error::Timeout { .. }
                | piper_core::Error::RetryExhausted { .. } => "service",
                piper_core::Error::Io(_) => "infrastructure",
                _ => "undefined",
            },
            Self::Output { .. } => "infrastructure",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        let err = CliError::step_failed("s", piper_core::Error::configuration("bad"));
        assert_eq!(err.category(), "configuration");

        let err = CliError::step_failed("s", piper_core::Error::timeout("http://x", 5));
        assert_eq!(err.category(), "service");

        let err = CliError::output(std::io::Error::other("closed"));
        assert_eq!(err.category(), "infrastructure");
    }

    #[test]
    fn test_step_failed_message() {
        let err = CliError::step_failed("readPipelineEnv", piper_core::Error::encryption("x"));
        assert_eq!(err.to_string(), "Step readPipelineEnv failed");
    }
}
