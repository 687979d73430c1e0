//! GitHub Actions provider.
//!
//! Reads the `GITHUB_*` variables set on every workflow run. This is the only
//! provider that can fetch job logs, using the REST API with the run's
//! `GITHUB_TOKEN`.

use super::{BuildReason, OrchestratorProvider};
use crate::detect::Orchestrator;
use crate::pull_request::{PullRequestConfig, parse_pull_request_key};
use piper_core::env;
use piper_core::http::{ClientOptions, HttpClient};
use piper_core::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_API_URL: &str = "https://api.github.com";
const JOBS_PER_PAGE: usize = 100;

/// Bounds for job log retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogOptions {
    /// Timeout for each request.
    pub timeout: Duration,
    /// Retries after the first attempt of each request.
    pub max_retries: u32,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 2,
        }
    }
}

#[derive(Debug, Deserialize)]
struct JobList {
    #[serde(default)]
    total_count: usize,
    jobs: Vec<Job>,
}

#[derive(Debug, Deserialize)]
struct Job {
    id: u64,
}

/// GitHub Actions provider.
///
/// Pull requests are recognized by a `refs/pull/<n>/merge` reference. On
/// `pull_request_target` runs `GITHUB_REF` names the base branch, so the run
/// is reported as a branch build even though the triggering event was a pull
/// request; `build_reason` follows that and only reports
/// [`BuildReason::PullRequest`] when the reference is a pull request ref.
#[derive(Debug, Default)]
pub struct GitHubActionsProvider {
    reference: String,
    head_ref: String,
    base_ref: String,
    sha: String,
    server_url: String,
    repository: String,
    run_id: String,
    job: String,
    event_name: String,
    workflow_ref: String,
    api_url: String,
    token: Option<SecretString>,
    log_options: LogOptions,
}

impl GitHubActionsProvider {
    /// Snapshot the GitHub Actions variables of the current process.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            reference: env::var("GITHUB_REF"),
            head_ref: env::var("GITHUB_HEAD_REF"),
            base_ref: env::var("GITHUB_BASE_REF"),
            sha: env::var("GITHUB_SHA"),
            server_url: env::var("GITHUB_SERVER_URL"),
            repository: env::var("GITHUB_REPOSITORY"),
            run_id: env::var("GITHUB_RUN_ID"),
            job: env::var("GITHUB_JOB"),
            event_name: env::var("GITHUB_EVENT_NAME"),
            workflow_ref: env::var("GITHUB_WORKFLOW_REF"),
            api_url: env::var_opt("GITHUB_API_URL")
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            token: env::var_opt("GITHUB_TOKEN").map(SecretString::from),
            log_options: LogOptions::default(),
        }
    }

    /// Override the log retrieval bounds.
    #[must_use]
    pub fn with_log_options(mut self, options: LogOptions) -> Self {
        self.log_options = options;
        self
    }

    /// Workflow file name from `GITHUB_WORKFLOW_REF`
    /// (`owner/repo/.github/workflows/build.yml@refs/heads/main` -> `build.yml`).
    fn workflow_file(&self) -> Option<&str> {
        let path = self.workflow_ref.split('@').next()?;
        let (_, file) = path.split_once(".github/workflows/")?;
        (!file.is_empty()).then_some(file)
    }

    fn api_base(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    /// Every job of the run, following pages until `total_count` is reached.
    fn list_jobs(&self, client: &HttpClient) -> Result<Vec<Job>> {
        let mut jobs = Vec::new();
        for page in 1.. {
            let jobs_url = format!(
                "{}/repos/{}/actions/runs/{}/jobs?per_page={JOBS_PER_PAGE}&page={page}",
                self.api_base(),
                self.repository,
                self.run_id
            );
            let list: JobList = client.get_json(&jobs_url)?;
            let received = list.jobs.len();
            jobs.extend(list.jobs);
            if received == 0 || jobs.len() >= list.total_count {
                break;
            }
        }
        Ok(jobs)
    }

    fn http_client(&self) -> Result<HttpClient> {
        let mut options = ClientOptions::default()
            .with_timeout(self.log_options.timeout)
            .with_max_retries(self.log_options.max_retries);
        if let Some(token) = &self.token {
            options = options.with_token(token.expose_secret());
        }
        HttpClient::new(options)
    }
}

impl OrchestratorProvider for GitHubActionsProvider {
    fn orchestrator(&self) -> Orchestrator {
        Orchestrator::GitHubActions
    }

    fn branch(&self) -> String {
        if self.is_pull_request() && !self.head_ref.is_empty() {
            return self.head_ref.clone();
        }
        env::strip_branch_prefix(&self.reference).to_string()
    }

    fn reference(&self) -> String {
        self.reference.clone()
    }

    fn commit(&self) -> String {
        self.sha.clone()
    }

    fn repo_url(&self) -> String {
        if self.server_url.is_empty() || self.repository.is_empty() {
            return String::new();
        }
        format!(
            "{}/{}",
            self.server_url.trim_end_matches('/'),
            self.repository
        )
    }

    fn build_url(&self) -> String {
        let repo_url = self.repo_url();
        if repo_url.is_empty() || self.run_id.is_empty() {
            return String::new();
        }
        format!("{repo_url}/actions/runs/{}", self.run_id)
    }

    fn build_id(&self) -> String {
        self.run_id.clone()
    }

    fn job_url(&self) -> String {
        let repo_url = self.repo_url();
        if repo_url.is_empty() {
            return String::new();
        }
        match self.workflow_file() {
            Some(file) => format!("{repo_url}/actions/workflows/{file}"),
            None => format!("{repo_url}/actions"),
        }
    }

    fn job_name(&self) -> String {
        self.job.clone()
    }

    fn stage_name(&self) -> String {
        self.job.clone()
    }

    fn build_reason(&self) -> BuildReason {
        match self.event_name.as_str() {
            "workflow_dispatch" => BuildReason::Manual,
            "schedule" => BuildReason::Schedule,
            "pull_request" => BuildReason::PullRequest,
            "pull_request_target" if self.is_pull_request() => BuildReason::PullRequest,
            "push" => BuildReason::Push,
            _ => BuildReason::Unknown,
        }
    }

    fn is_pull_request(&self) -> bool {
        parse_pull_request_key(&self.reference).is_some()
    }

    fn pull_request_config(&self) -> PullRequestConfig {
        PullRequestConfig {
            branch: self.head_ref.clone(),
            base: self.base_ref.clone(),
            key: parse_pull_request_key(&self.reference)
                .unwrap_or_default()
                .to_string(),
        }
    }

    /// Fetch and concatenate the logs of every job in the current run.
    fn log(&self) -> Result<Vec<u8>> {
        if self.repository.is_empty() || self.run_id.is_empty() {
            return Err(Error::configuration(
                "GITHUB_REPOSITORY and GITHUB_RUN_ID are required to fetch job logs",
            ));
        }

        let client = self.http_client()?;
        let jobs = self.list_jobs(&client)?;
        debug!(count = jobs.len(), run_id = %self.run_id, "Listed workflow jobs");

        let mut log = Vec::new();
        for job in &jobs {
            let log_url = format!(
                "{}/repos/{}/actions/jobs/{}/logs",
                self.api_base(),
                self.repository,
                job.id
            );
            log.extend(client.get(&log_url)?);
        }

        info!(
            jobs = jobs.len(),
            bytes = log.len(),
            "Fetched GitHub Actions job logs"
        );
        Ok(log)
    }
}
