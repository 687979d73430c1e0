//! Orchestrator providers.
//!
//! Each provider snapshots its orchestrator's environment variables once at
//! construction and answers every query from that snapshot, so repeated
//! queries on one instance always agree.

use crate::detect::{Orchestrator, detect_orchestrator};
use crate::pull_request::PullRequestConfig;
use piper_core::{Error, Result};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

pub mod azure_devops;
pub mod github_actions;
pub mod gitlab;
pub mod jenkins;
pub mod unknown;

use azure_devops::AzureDevOpsProvider;
use github_actions::{GitHubActionsProvider, LogOptions};
use gitlab::GitLabProvider;
use jenkins::JenkinsProvider;
use unknown::UnknownProvider;

/// Why the current pipeline run was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BuildReason {
    /// Started by a person.
    Manual,
    /// Started by a timer.
    Schedule,
    /// Started for a pull or merge request.
    PullRequest,
    /// Started by a push to the repository.
    Push,
    /// Not reported by the orchestrator.
    Unknown,
}

impl BuildReason {
    /// Label used in CLI output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "Manual",
            Self::Schedule => "Schedule",
            Self::PullRequest => "PullRequest",
            Self::Push => "Push",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for BuildReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time snapshot of everything a provider reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorInfo {
    /// Detected orchestrator.
    pub orchestrator: Orchestrator,
    /// Short branch name.
    pub branch: String,
    /// Full git reference.
    pub reference: String,
    /// Commit SHA.
    pub commit: String,
    /// Repository URL.
    pub repo_url: String,
    /// URL of this pipeline run.
    pub build_url: String,
    /// Orchestrator-specific run identifier.
    pub build_id: String,
    /// URL of the pipeline definition (stable across runs).
    pub job_url: String,
    /// Name of the pipeline definition or job.
    pub job_name: String,
    /// Name of the running stage.
    pub stage_name: String,
    /// Why the run was started.
    pub build_reason: BuildReason,
    /// Whether this run is for a pull request.
    pub is_pull_request: bool,
    /// Pull request context, present only for pull request runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<PullRequestConfig>,
}

/// Common query interface over CI orchestrators.
///
/// String queries return an empty string when the orchestrator does not
/// provide the value.
pub trait OrchestratorProvider {
    /// Which orchestrator this provider describes.
    fn orchestrator(&self) -> Orchestrator;

    /// Orchestrator label, e.g. `"GitHubActions"`.
    fn orchestrator_type(&self) -> &'static str {
        self.orchestrator().as_str()
    }

    /// Short branch name (without `refs/heads/`).
    fn branch(&self) -> String;

    /// Full git reference, e.g. `refs/heads/main`.
    fn reference(&self) -> String;

    /// Commit SHA being built.
    fn commit(&self) -> String;

    /// Repository URL.
    fn repo_url(&self) -> String;

    /// URL of the current run.
    fn build_url(&self) -> String;

    /// Identifier of the current run.
    fn build_id(&self) -> String;

    /// URL of the pipeline definition.
    fn job_url(&self) -> String;

    /// Name of the pipeline definition or job.
    fn job_name(&self) -> String;

    /// Name of the running stage.
    fn stage_name(&self) -> String;

    /// Why the run was started.
    fn build_reason(&self) -> BuildReason;

    /// Whether this run is for a pull request.
    fn is_pull_request(&self) -> bool;

    /// Pull request context. Fields are empty when not a pull request.
    fn pull_request_config(&self) -> PullRequestConfig;

    /// Fetch the log output of the current run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unsupported`] unless the orchestrator supports log
    /// retrieval, and HTTP errors from the retrieval itself.
    fn log(&self) -> Result<Vec<u8>> {
        Err(Error::unsupported(self.orchestrator_type(), "log retrieval"))
    }

    /// Snapshot of every query.
    fn info(&self) -> OrchestratorInfo {
        let is_pull_request = self.is_pull_request();
        OrchestratorInfo {
            orchestrator: self.orchestrator(),
            branch: self.branch(),
            reference: self.reference(),
            commit: self.commit(),
            repo_url: self.repo_url(),
            build_url: self.build_url(),
            build_id: self.build_id(),
            job_url: self.job_url(),
            job_name: self.job_name(),
            stage_name: self.stage_name(),
            build_reason: self.build_reason(),
            is_pull_request,
            pull_request: is_pull_request.then(|| self.pull_request_config()),
        }
    }
}

/// The provider active for this process, one variant per orchestrator.
#[derive(Debug)]
pub enum Provider {
    /// GitHub Actions.
    GitHubActions(GitHubActionsProvider),
    /// Jenkins.
    Jenkins(JenkinsProvider),
    /// Azure DevOps.
    AzureDevOps(AzureDevOpsProvider),
    /// GitLab CI/CD.
    GitLab(GitLabProvider),
    /// Fallback when no orchestrator is recognized.
    Unknown(UnknownProvider),
}

impl Provider {
    /// Detect the orchestrator and build its provider.
    ///
    /// Never fails; falls back to [`Provider::Unknown`].
    #[must_use]
    pub fn detect() -> Self {
        Self::for_orchestrator(detect_orchestrator())
    }

    /// Build the provider for `orchestrator` from the current environment.
    #[must_use]
    pub fn for_orchestrator(orchestrator: Orchestrator) -> Self {
        debug!(%orchestrator, "Creating orchestrator provider");
        match orchestrator {
            Orchestrator::GitHubActions => Self::GitHubActions(GitHubActionsProvider::from_env()),
            Orchestrator::Jenkins => Self::Jenkins(JenkinsProvider::from_env()),
            Orchestrator::AzureDevOps => Self::AzureDevOps(AzureDevOpsProvider::from_env()),
            Orchestrator::GitLab => Self::GitLab(GitLabProvider::from_env()),
            Orchestrator::Unknown => {
                warn!("Could not detect orchestrator, pipeline metadata will be incomplete");
                Self::Unknown(UnknownProvider)
            }
        }
    }

    /// Apply log retrieval bounds. Only affects providers that fetch logs.
    #[must_use]
    pub fn with_log_options(self, options: LogOptions) -> Self {
        match self {
            Self::GitHubActions(p) => Self::GitHubActions(p.with_log_options(options)),
            other => other,
        }
    }

    fn inner(&self) -> &dyn OrchestratorProvider {
        match self {
            Self::GitHubActions(p) => p,
            Self::Jenkins(p) => p,
            Self::AzureDevOps(p) => p,
            Self::GitLab(p) => p,
            Self::Unknown(p) => p,
        }
    }
}

impl OrchestratorProvider for Provider {
    fn orchestrator(&self) -> Orchestrator {
        self.inner().orchestrator()
    }

    fn branch(&self) -> String {
        self.inner().branch()
    }

    fn reference(&self) -> String {
        self.inner().reference()
    }

    fn commit(&self) -> String {
        self.inner().commit()
    }

    fn repo_url(&self) -> String {
        self.inner().repo_url()
    }

    fn build_url(&self) -> String {
        self.inner().build_url()
    }

    fn build_id(&self) -> String {
        self.inner().build_id()
    }

    fn job_url(&self) -> String {
        self.inner().job_url()
    }

    fn job_name(&self) -> String {
        self.inner().job_name()
    }

    fn stage_name(&self) -> String {
        self.inner().stage_name()
    }

    fn build_reason(&self) -> BuildReason {
        self.inner().build_reason()
    }

    fn is_pull_request(&self) -> bool {
        self.inner().is_pull_request()
    }

    fn pull_request_config(&self) -> PullRequestConfig {
        self.inner().pull_request_config()
    }

    fn log(&self) -> Result<Vec<u8>> {
        self.inner().log()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::with_ci_env;

    #[test]
    fn test_detect_builds_matching_variant() {
        with_ci_env(&[("GITHUB_ACTIONS", "true")], || {
            assert!(matches!(Provider::detect(), Provider::GitHubActions(_)));
        });
        with_ci_env(&[("JENKINS_URL", "https://jenkins/")], || {
            assert!(matches!(Provider::detect(), Provider::Jenkins(_)));
        });
        with_ci_env(&[("TF_BUILD", "True")], || {
            assert!(matches!(Provider::detect(), Provider::AzureDevOps(_)));
        });
        with_ci_env(&[("GITLAB_CI", "true")], || {
            assert!(matches!(Provider::detect(), Provider::GitLab(_)));
        });
    }

    #[test]
    fn test_clean_env_yields_unknown_with_empty_values() {
        with_ci_env(&[], || {
            let provider = Provider::detect();
            assert!(matches!(provider, Provider::Unknown(_)));
            assert_eq!(provider.orchestrator_type(), "Unknown");

            let info = provider.info();
            assert_eq!(info.branch, "");
            assert_eq!(info.reference, "");
            assert_eq!(info.commit, "");
            assert_eq!(info.repo_url, "");
            assert_eq!(info.build_url, "");
            assert_eq!(info.job_url, "");
            assert_eq!(info.stage_name, "");
            assert!(!info.is_pull_request);
            assert!(info.pull_request.is_none());
            assert_eq!(provider.pull_request_config(), PullRequestConfig::default());
        });
    }

    #[test]
    fn test_unknown_log_is_unsupported() {
        with_ci_env(&[], || {
            let err = Provider::detect().log().unwrap_err();
            assert!(matches!(err, Error::Unsupported { .. }));
        });
    }

    #[test]
    fn test_info_includes_pull_request_only_for_prs() {
        with_ci_env(
            &[
                ("GITHUB_ACTIONS", "true"),
                ("GITHUB_REF", "refs/pull/42/merge"),
                ("GITHUB_HEAD_REF", "feat/test"),
                ("GITHUB_BASE_REF", "main"),
            ],
            || {
                let info = Provider::detect().info();
                assert!(info.is_pull_request);
                assert_eq!(
                    info.pull_request,
                    Some(PullRequestConfig {
                        branch: "feat/test".to_string(),
                        base: "main".to_string(),
                        key: "42".to_string(),
                    })
                );
            },
        );
    }

    #[test]
    fn test_info_serializes_camel_case() {
        with_ci_env(&[("GITHUB_ACTIONS", "true"), ("GITHUB_SHA", "abc")], || {
            let json = serde_json::to_value(Provider::detect().info()).unwrap();
            assert_eq!(json["orchestrator"], "GitHubActions");
            assert_eq!(json["commit"], "abc");
            assert_eq!(json["isPullRequest"], false);
            assert!(json.get("repoUrl").is_some());
            assert!(json.get("pullRequest").is_none());
        });
    }

    #[test]
    fn test_with_log_options_keeps_variant() {
        let options = LogOptions {
            timeout: std::time::Duration::from_secs(1),
            max_retries: 0,
        };
        with_ci_env(&[("GITHUB_ACTIONS", "true")], || {
            let provider = Provider::detect().with_log_options(options);
            assert!(matches!(provider, Provider::GitHubActions(_)));
        });
        with_ci_env(&[("GITLAB_CI", "true")], || {
            let provider = Provider::detect().with_log_options(options);
            assert!(matches!(provider, Provider::GitLab(_)));
        });
    }

    #[test]
    fn test_snapshot_is_not_affected_by_later_env_changes() {
        let provider = with_ci_env(
            &[("GITHUB_ACTIONS", "true"), ("GITHUB_SHA", "first")],
            Provider::detect,
        );
        with_ci_env(&[("GITHUB_SHA", "second")], || {
            assert_eq!(provider.commit(), "first");
        });
    }
}
