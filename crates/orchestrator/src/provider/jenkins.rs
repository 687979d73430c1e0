//! Jenkins provider.
//!
//! Multibranch pipelines expose pull request builds through the `CHANGE_*`
//! variables; `CHANGE_ID` is only set for those builds.

use super::{BuildReason, OrchestratorProvider};
use crate::detect::Orchestrator;
use crate::pull_request::PullRequestConfig;
use piper_core::env;

/// Jenkins provider.
#[derive(Debug, Clone, Default)]
pub struct JenkinsProvider {
    branch_name: String,
    change_id: String,
    change_branch: String,
    change_target: String,
    git_commit: String,
    git_url: String,
    build_url: String,
    build_id: String,
    job_url: String,
    job_name: String,
    stage_name: String,
}

impl JenkinsProvider {
    /// Snapshot the Jenkins variables of the current process.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            branch_name: env::var("BRANCH_NAME"),
            change_id: env::var("CHANGE_ID"),
            change_branch: env::var("CHANGE_BRANCH"),
            change_target: env::var("CHANGE_TARGET"),
            git_commit: env::var("GIT_COMMIT"),
            git_url: env::var("GIT_URL"),
            build_url: env::var("BUILD_URL"),
            build_id: env::var("BUILD_ID"),
            job_url: env::var("JOB_URL"),
            job_name: env::var("JOB_NAME"),
            stage_name: env::var("STAGE_NAME"),
        }
    }
}

impl OrchestratorProvider for JenkinsProvider {
    fn orchestrator(&self) -> Orchestrator {
        Orchestrator::Jenkins
    }

    fn branch(&self) -> String {
        self.branch_name.clone()
    }

    fn reference(&self) -> String {
        if self.is_pull_request() {
            format!("refs/pull/{}/head", self.change_id)
        } else if self.branch_name.is_empty() {
            String::new()
        } else {
            format!("refs/heads/{}", self.branch_name)
        }
    }

    fn commit(&self) -> String {
        self.git_commit.clone()
    }

    fn repo_url(&self) -> String {
        self.git_url.clone()
    }

    fn build_url(&self) -> String {
        self.build_url.clone()
    }

    fn build_id(&self) -> String {
        self.build_id.clone()
    }

    fn job_url(&self) -> String {
        self.job_url.clone()
    }

    fn job_name(&self) -> String {
        self.job_name.clone()
    }

    fn stage_name(&self) -> String {
        self.stage_name.clone()
    }

    fn build_reason(&self) -> BuildReason {
        if self.is_pull_request() {
            BuildReason::PullRequest
        } else {
            BuildReason::Unknown
        }
    }

    fn is_pull_request(&self) -> bool {
        !self.change_id.is_empty()
    }

    fn pull_request_config(&self) -> PullRequestConfig {
        PullRequestConfig {
            branch: self.change_branch.clone(),
            base: self.change_target.clone(),
            key: self.change_id.clone(),
        }
    }
}
