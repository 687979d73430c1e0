//! Azure DevOps Pipelines provider.

use super::{BuildReason, OrchestratorProvider};
use crate::detect::Orchestrator;
use crate::pull_request::PullRequestConfig;
use piper_core::env;

/// Azure DevOps provider.
#[derive(Debug, Clone, Default)]
pub struct AzureDevOpsProvider {
    source_branch: String,
    source_version: String,
    repository_uri: String,
    build_id: String,
    build_reason: String,
    collection_uri: String,
    team_project: String,
    definition_id: String,
    job_display_name: String,
    stage_display_name: String,
    pr_source_branch: String,
    pr_target_branch: String,
    pr_id: String,
    pr_number: String,
}

impl AzureDevOpsProvider {
    /// Snapshot the Azure DevOps variables of the current process.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            source_branch: env::var("BUILD_SOURCEBRANCH"),
            source_version: env::var("BUILD_SOURCEVERSION"),
            repository_uri: env::var("BUILD_REPOSITORY_URI"),
            build_id: env::var("BUILD_BUILDID"),
            build_reason: env::var("BUILD_REASON"),
            collection_uri: env::var("SYSTEM_COLLECTIONURI"),
            team_project: env::var("SYSTEM_TEAMPROJECT"),
            definition_id: env::var("SYSTEM_DEFINITIONID"),
            job_display_name: env::var("SYSTEM_JOBDISPLAYNAME"),
            stage_display_name: env::var("SYSTEM_STAGEDISPLAYNAME"),
            pr_source_branch: env::var("SYSTEM_PULLREQUEST_SOURCEBRANCH"),
            pr_target_branch: env::var("SYSTEM_PULLREQUEST_TARGETBRANCH"),
            pr_id: env::var("SYSTEM_PULLREQUEST_PULLREQUESTID"),
            pr_number: env::var("SYSTEM_PULLREQUEST_PULLREQUESTNUMBER"),
        }
    }

    /// `<collection>/<project>` with exactly one separating slash, or empty.
    fn project_url(&self) -> Option<String> {
        if self.collection_uri.is_empty() || self.team_project.is_empty() {
            return None;
        }
        Some(format!(
            "{}/{}",
            self.collection_uri.trim_end_matches('/'),
            self.team_project
        ))
    }
}

impl OrchestratorProvider for AzureDevOpsProvider {
    fn orchestrator(&self) -> Orchestrator {
        Orchestrator::AzureDevOps
    }

    fn branch(&self) -> String {
        if self.is_pull_request() {
            return env::strip_branch_prefix(&self.pr_source_branch).to_string();
        }
        env::strip_branch_prefix(&self.source_branch).to_string()
    }

    fn reference(&self) -> String {
        self.source_branch.clone()
    }

    fn commit(&self) -> String {
        self.source_version.clone()
    }

    fn repo_url(&self) -> String {
        self.repository_uri.clone()
    }

    fn build_url(&self) -> String {
        match self.project_url() {
            Some(project) if !self.build_id.is_empty() => {
                format!("{project}/_build/results?buildId={}", self.build_id)
            }
            _ => String::new(),
        }
    }

    fn build_id(&self) -> String {
        self.build_id.clone()
    }

    fn job_url(&self) -> String {
        match self.project_url() {
            Some(project) if !self.definition_id.is_empty() => {
                format!("{project}/_build?definitionId={}", self.definition_id)
            }
            _ => String::new(),
        }
    }

    fn job_name(&self) -> String {
        self.job_display_name.clone()
    }

    fn stage_name(&self) -> String {
        self.stage_display_name.clone()
    }

    fn build_reason(&self) -> BuildReason {
        match self.build_reason.as_str() {
            "Manual" => BuildReason::Manual,
            "Schedule" => BuildReason::Schedule,
            "PullRequest" => BuildReason::PullRequest,
            "IndividualCI" | "BatchedCI" => BuildReason::Push,
            _ => BuildReason::Unknown,
        }
    }

    fn is_pull_request(&self) -> bool {
        self.build_reason == "PullRequest"
    }

    fn pull_request_config(&self) -> PullRequestConfig {
        let key = if self.pr_number.is_empty() {
            self.pr_id.clone()
        } else {
            self.pr_number.clone()
        };
        PullRequestConfig {
            branch: env::strip_branch_prefix(&self.pr_source_branch).to_string(),
            base: env::strip_branch_prefix(&self.pr_target_branch).to_string(),
            key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::with_ci_env;

    #[test]
    fn test_ci_build() {
        with_ci_env(
            &[
                ("AZURE_HTTP_USER_AGENT", "VSTS_agent"),
                ("BUILD_SOURCEBRANCH", "refs/heads/feat/test-azure"),
                ("BUILD_SOURCEVERSION", "abcdef42713"),
                ("BUILD_REPOSITORY_URI", "https://github.com/foo/bar"),
                ("BUILD_BUILDID", "42"),
                ("BUILD_REASON", "IndividualCI"),
                ("SYSTEM_COLLECTIONURI", "https://dev.azure.com/fabrikam/"),
                ("SYSTEM_TEAMPROJECT", "foo"),
                ("SYSTEM_DEFINITIONID", "7"),
                ("SYSTEM_JOBDISPLAYNAME", "Build job"),
                ("SYSTEM_STAGEDISPLAYNAME", "Build"),
            ],
            || {
                let p = AzureDevOpsProvider::from_env();
                assert!(!p.is_pull_request());
                assert_eq!(p.branch(), "feat/test-azure");
                assert_eq!(p.reference(), "refs/heads/feat/test-azure");
                assert_eq!(p.commit(), "abcdef42713");
                assert_eq!(p.repo_url(), "https://github.com/foo/bar");
                assert_eq!(
                    p.build_url(),
                    "https://dev.azure.com/fabrikam/foo/_build/results?buildId=42"
                );
                assert_eq!(
                    p.job_url(),
                    "https://dev.azure.com/fabrikam/foo/_build?definitionId=7"
                );
                assert_eq!(p.build_id(), "42");
                assert_eq!(p.job_name(), "Build job");
                assert_eq!(p.stage_name(), "Build");
                assert_eq!(p.build_reason(), BuildReason::Push);
                assert_eq!(p.orchestrator_type(), "AzureDevOps");
            },
        );
    }

    #[test]
    fn test_pull_request_build() {
        with_ci_env(
            &[
                ("BUILD_REASON", "PullRequest"),
                ("BUILD_SOURCEBRANCH", "refs/pull/12/merge"),
                ("SYSTEM_PULLREQUEST_SOURCEBRANCH", "refs/heads/feat/test"),
                ("SYSTEM_PULLREQUEST_TARGETBRANCH", "refs/heads/main"),
                ("SYSTEM_PULLREQUEST_PULLREQUESTID", "98765"),
                ("SYSTEM_PULLREQUEST_PULLREQUESTNUMBER", "12"),
            ],
            || {
                let p = AzureDevOpsProvider::from_env();
                assert!(p.is_pull_request());
                assert_eq!(p.branch(), "feat/test");
                assert_eq!(p.build_reason(), BuildReason::PullRequest);
                assert_eq!(
                    p.pull_request_config(),
                    PullRequestConfig {
                        branch: "feat/test".to_string(),
                        base: "main".to_string(),
                        key: "12".to_string(),
                    }
                );
            },
        );
    }

    #[test]
    fn test_pull_request_key_falls_back_to_id() {
        with_ci_env(
            &[
                ("BUILD_REASON", "PullRequest"),
                ("SYSTEM_PULLREQUEST_PULLREQUESTID", "98765"),
            ],
            || {
                assert_eq!(AzureDevOpsProvider::from_env().pull_request_config().key, "98765");
            },
        );
    }

    #[test]
    fn test_urls_empty_without_inputs() {
        with_ci_env(&[("BUILD_BUILDID", "42")], || {
            let p = AzureDevOpsProvider::from_env();
            assert_eq!(p.build_url(), "");
            assert_eq!(p.job_url(), "");
        });
    }

    #[test]
    fn test_build_reasons() {
        for (reason, expected) in [
            ("Manual", BuildReason::Manual),
            ("Schedule", BuildReason::Schedule),
            ("BatchedCI", BuildReason::Push),
            ("ResourceTrigger", BuildReason::Unknown),
        ] {
            with_ci_env(&[("BUILD_REASON", reason)], || {
                assert_eq!(AzureDevOpsProvider::from_env().build_reason(), expected);
            });
        }
    }
}
