//! Orchestrator detection from environment sentinels.

use piper_core::env;
use serde::Serialize;
use std::fmt;

/// The CI system running the current process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Orchestrator {
    /// Azure DevOps Pipelines.
    AzureDevOps,
    /// GitHub Actions.
    GitHubActions,
    /// Jenkins.
    Jenkins,
    /// GitLab CI/CD.
    GitLab,
    /// Not running in a recognized CI system.
    Unknown,
}

/// Detection priority. Nested CI contexts (for example a GitHub Actions job
/// started from an Azure pipeline) resolve to the first entry whose sentinel
/// is set.
const DETECTION_ORDER: [(Orchestrator, &[&str]); 4] = [
    (
        Orchestrator::AzureDevOps,
        &["AZURE_HTTP_USER_AGENT", "TF_BUILD"],
    ),
    (
        Orchestrator::GitHubActions,
        &["GITHUB_ACTION", "GITHUB_ACTIONS"],
    ),
    (Orchestrator::Jenkins, &["JENKINS_HOME", "JENKINS_URL"]),
    (Orchestrator::GitLab, &["GITLAB_CI"]),
];

impl Orchestrator {
    /// Label used in telemetry and CLI output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AzureDevOps => "AzureDevOps",
            Self::GitHubActions => "GitHubActions",
            Self::Jenkins => "Jenkins",
            Self::GitLab => "GitLab",
            Self::Unknown => "Unknown",
        }
    }

    /// Environment variables that identify this orchestrator.
    #[must_use]
    pub fn sentinels(self) -> &'static [&'static str] {
        match DETECTION_ORDER
            .iter()
            .find(|(orchestrator, _)| *orchestrator == self)
        {
            Some(&(_, sentinels)) => sentinels,
            None => &[],
        }
    }
}

impl fmt::Display for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect the orchestrator from the process environment.
///
/// Never fails: returns [`Orchestrator::Unknown`] when no sentinel is set.
#[must_use]
pub fn detect_orchestrator() -> Orchestrator {
    DETECTION_ORDER
        .iter()
        .find(|(_, sentinels)| env::any_truthy(sentinels))
        .map_or(Orchestrator::Unknown, |(orchestrator, _)| *orchestrator)
}
