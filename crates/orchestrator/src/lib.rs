//! CI orchestrator detection for piper-rs.
//!
//! A pipeline step runs inside exactly one orchestrator (GitHub Actions,
//! Jenkins, Azure DevOps, GitLab, or something unrecognized). This crate
//! detects which one from the process environment and exposes its metadata
//! through a single [`OrchestratorProvider`] interface:
//!
//! ```no_run
//! use piper_orchestrator::{OrchestratorProvider, Provider};
//!
//! let provider = Provider::detect();
//! let info = provider.info();
//! println!("{} on {} ({})", info.orchestrator, info.branch, info.commit);
//! ```
//!
//! Detection and field queries never fail; missing variables read as empty
//! strings. Only [`OrchestratorProvider::log`] performs I/O and may return an
//! error.

pub mod detect;
pub mod provider;
pub mod pull_request;

#[cfg(test)]
mod test_support;

pub use detect::{Orchestrator, detect_orchestrator};
pub use provider::azure_devops::AzureDevOpsProvider;
pub use provider::github_actions::{GitHubActionsProvider, LogOptions};
pub use provider::gitlab::GitLabProvider;
pub use provider::jenkins::JenkinsProvider;
pub use provider::unknown::UnknownProvider;
pub use provider::{BuildReason, OrchestratorInfo, OrchestratorProvider, Provider};
pub use pull_request::{PullRequestConfig, is_pull_request_ref, parse_pull_request_key};
