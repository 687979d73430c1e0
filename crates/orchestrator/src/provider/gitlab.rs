//! GitLab CI/CD provider.
//!
//! Merge request pipelines carry the `CI_MERGE_REQUEST_*` variables; branch
//! and tag pipelines carry `CI_COMMIT_BRANCH` or `CI_COMMIT_TAG`.

use super::{BuildReason, OrchestratorProvider};
use crate::detect::Orchestrator;
use crate::pull_request::PullRequestConfig;
use piper_core::env;

/// GitLab provider.
#[derive(Debug, Clone, Default)]
pub struct GitLabProvider {
    commit_tag: String,
    commit_branch: String,
    commit_ref_name: String,
    commit_sha: String,
    project_url: String,
    pipeline_url: String,
    pipeline_id: String,
    pipeline_source: String,
    job_url: String,
    job_name: String,
    job_stage: String,
    mr_iid: String,
    mr_source_branch: String,
    mr_target_branch: String,
}

impl GitLabProvider {
    /// Snapshot the GitLab variables of the current process.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            commit_tag: env::var("CI_COMMIT_TAG"),
            commit_branch: env::var("CI_COMMIT_BRANCH"),
            commit_ref_name: env::var("CI_COMMIT_REF_NAME"),
            commit_sha: env::var("CI_COMMIT_SHA"),
            project_url: env::var("CI_PROJECT_URL"),
            pipeline_url: env::var("CI_PIPELINE_URL"),
            pipeline_id: env::var("CI_PIPELINE_ID"),
            pipeline_source: env::var("CI_PIPELINE_SOURCE"),
            job_url: env::var("CI_JOB_URL"),
            job_name: env::var("CI_JOB_NAME"),
            job_stage: env::var("CI_JOB_STAGE"),
            mr_iid: env::var("CI_MERGE_REQUEST_IID"),
            mr_source_branch: env::var("CI_MERGE_REQUEST_SOURCE_BRANCH_NAME"),
            mr_target_branch: env::var("CI_MERGE_REQUEST_TARGET_BRANCH_NAME"),
        }
    }
}

impl OrchestratorProvider for GitLabProvider {
    fn orchestrator(&self) -> Orchestrator {
        Orchestrator::GitLab
    }

    fn branch(&self) -> String {
        if self.is_pull_request() {
            self.mr_source_branch.clone()
        } else if self.commit_branch.is_empty() {
            self.commit_ref_name.clone()
        } else {
            self.commit_branch.clone()
        }
    }

    fn reference(&self) -> String {
        if !self.commit_tag.is_empty() {
            format!("refs/tags/{}", self.commit_tag)
        } else if self.is_pull_request() {
            format!("refs/merge-requests/{}/head", self.mr_iid)
        } else if self.commit_ref_name.is_empty() {
            String::new()
        } else {
            format!("refs/heads/{}", self.commit_ref_name)
        }
    }

    fn commit(&self) -> String {
        self.commit_sha.clone()
    }

    fn repo_url(&self) -> String {
        self.project_url.clone()
    }

    fn build_url(&self) -> String {
        self.pipeline_url.clone()
    }

    fn build_id(&self) -> String {
        self.pipeline_id.clone()
    }

    fn job_url(&self) -> String {
        self.job_url.clone()
    }

    fn job_name(&self) -> String {
        self.job_name.clone()
    }

    fn stage_name(&self) -> String {
        self.job_stage.clone()
    }

    fn build_reason(&self) -> BuildReason {
        match self.pipeline_source.as_str() {
            "web" => BuildReason::Manual,
            "schedule" => BuildReason::Schedule,
            "merge_request_event" => BuildReason::PullRequest,
            "push" => BuildReason::Push,
            _ => BuildReason::Unknown,
        }
    }

    fn is_pull_request(&self) -> bool {
        !self.mr_iid.is_empty()
    }

    fn pull_request_config(&self) -> PullRequestConfig {
        PullRequestConfig {
            branch: self.mr_source_branch.clone(),
            base: self.mr_target_branch.clone(),
            key: self.mr_iid.clone(),
        }
    }
}
