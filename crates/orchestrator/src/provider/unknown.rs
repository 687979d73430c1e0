use super::{BuildReason, OrchestratorProvider};
use crate::detect::Orchestrator;
use crate::pull_request::PullRequestConfig;

/// Fallback provider used when no orchestrator is detected.
///
/// Answers every query with an empty or default value.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnknownProvider;

impl OrchestratorProvider for UnknownProvider {
    fn orchestrator(&self) -> Orchestrator {
        Orchestrator::Unknown
    }

    fn branch(&self) -> String {
        String::new()
    }

    fn reference(&self) -> String {
        String::new()
    }

    fn commit(&self) -> String {
        String::new()
    }

    fn repo_url(&self) -> String {
        String::new()
    }

    fn build_url(&self) -> String {
        String::new()
    }

    fn build_id(&self) -> String {
        String::new()
    }

    fn job_url(&self) -> String {
        String::new()
    }

    fn job_name(&self) -> String {
        String::new()
    }

    fn stage_name(&self) -> String {
        String::new()
    }

    fn build_reason(&self) -> BuildReason {
        BuildReason::Unknown
    }

    fn is_pull_request(&self) -> bool {
        false
    }

    fn pull_request_config(&self) -> PullRequestConfig {
        PullRequestConfig::default()
    }
}
