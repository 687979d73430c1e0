use crate::config::GeneralConfig;
use crate::errors::CliError;
use std::io::Write;
use tracing::instrument;

#[instrument(skip_all)]
pub fn get_version_info(config: &GeneralConfig) -> String {
    let version = env!("CARGO_PKG_VERSION");
    let name = env!("CARGO_PKG_NAME");
    let description = env!("CARGO_PKG_DESCRIPTION");

    tracing::debug!(
        package_name = name,
        package_version = version,
        "Gathering package information"
    );

    format!(
        "{name} {version} - {description}\n\
         Correlation ID: {}",
        config.correlation_id
    )
}

pub fn execute(config: &GeneralConfig, out: &mut impl Write) -> Result<(), CliError> {
    writeln!(out, "{}", get_version_info(config)).map_err(CliError::output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_version_info() {
        let config = GeneralConfig {
            env_root_path: PathBuf::from(".pipeline"),
            correlation_id: "run-1".to_string(),
            no_telemetry: true,
            verbose: false,
        };
        let info = get_version_info(&config);
        assert!(info.starts_with(&format!("piper {}", env!("CARGO_PKG_VERSION"))));
        assert!(info.contains("Correlation ID: run-1"));
    }
}
