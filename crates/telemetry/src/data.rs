//! Telemetry payload types.

use serde::Serialize;
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;

/// Action name reported with every event.
pub const ACTION_NAME: &str = "Piper Library OS";

/// Event type reported with every event.
pub const EVENT_TYPE: &str = "library-os-ng";

/// Placeholder for values that could not be determined.
pub const NOT_AVAILABLE: &str = "n/a";

/// Lowercase hex SHA-1 of `input`, or `"n/a"` when `input` is empty.
#[must_use]
pub fn url_hash(input: &str) -> String {
    if input.is_empty() {
        return NOT_AVAILABLE.to_string();
    }
    hex::encode(Sha1::digest(input.as_bytes()))
}

/// Data identifying the step run, fixed at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseData {
    /// Orchestrator label.
    pub orchestrator: String,
    /// Running stage.
    pub stage_name: String,
    /// Library repository URL.
    pub url: String,
    /// Always [`ACTION_NAME`].
    pub action_name: String,
    /// Always [`EVENT_TYPE`].
    pub event_type: String,
    /// Name of the step being run.
    pub step_name: String,
    /// Tracking site identifier.
    #[serde(rename = "siteID")]
    pub site_id: String,
    /// [`url_hash`] of the job URL.
    pub pipeline_url_hash: String,
    /// [`url_hash`] of the build URL.
    pub build_url_hash: String,
}

/// Human readable labels for the reported fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct BaseMetaData {
    pub step_name_label: &'static str,
    pub stage_name_label: &'static str,
    pub pipeline_url_hash_label: &'static str,
    pub build_url_hash_label: &'static str,
    pub duration_label: &'static str,
    pub exit_code_label: &'static str,
    pub error_category_label: &'static str,
}

impl Default for BaseMetaData {
    fn default() -> Self {
        Self {
            step_name_label: "stepName",
            stage_name_label: "stageName",
            pipeline_url_hash_label: "pipelineUrlHash",
            build_url_hash_label: "buildUrlHash",
            duration_label: "duration",
            exit_code_label: "exitCode",
            error_category_label: "errorCategory",
        }
    }
}

/// Per-run data supplied by the step once it finishes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomData {
    /// Step duration in milliseconds.
    pub duration: String,
    /// `"0"` on success.
    pub error_code: String,
    /// Error category, empty on success.
    pub error_category: String,
    /// Commit of the piper build running the step.
    pub piper_commit_hash: String,
    /// Step specific values.
    #[serde(flatten)]
    pub custom: BTreeMap<String, String>,
}

impl CustomData {
    /// Custom data for a finished step.
    #[must_use]
    pub fn new(duration_ms: u128, error_code: impl Into<String>) -> Self {
        Self {
            duration: duration_ms.to_string(),
            error_code: error_code.into(),
            ..Self::default()
        }
    }

    /// Attach a step specific value.
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom.insert(key.into(), value.into());
        self
    }
}

/// Complete telemetry record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Data {
    /// Fixed step data.
    #[serde(flatten)]
    pub base: BaseData,
    /// Field labels.
    #[serde(flatten)]
    pub meta: BaseMetaData,
    /// Per-run data.
    #[serde(flatten)]
    pub custom: CustomData,
}

/// Step summary written to the log for downstream log scrapers.
///
/// The `Step telemetry data:` line format is consumed by external tooling;
/// keep field names stable.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct StepTelemetryData {
    pub step_start_time: String,
    pub pipeline_url_hash: String,
    pub build_url_hash: String,
    pub stage_name: String,
    pub step_name: String,
    pub error_code: String,
    pub step_duration: String,
    pub error_category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<serde_json::Value>,
    #[serde(rename = "correlationID")]
    pub correlation_id: String,
    pub piper_commit_hash: String,
}

/// Event posted to the tracking endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackEvent {
    /// Always `"track"`.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Step name.
    pub event: String,
    /// Pipeline URL hash.
    pub visitor_id: String,
    /// Tracking site identifier.
    pub account_id: String,
    /// Unix milliseconds.
    pub timestamp: i64,
    /// Full telemetry record.
    pub properties: Data,
}
