//! Step telemetry for piper-rs.
//!
//! A [`Telemetry`] instance is created when a step starts, filled with the
//! step's outcome through [`Telemetry::set_data`] and flushed once with
//! [`Telemetry::send`]. Sending never fails the step: the summary line is
//! always logged and delivery problems are only reported as warnings.

use chrono::{TimeDelta, Utc};
use piper_core::http::{ClientOptions, HttpClient};
use piper_orchestrator::OrchestratorProvider;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub mod data;

pub use data::{
    BaseData, BaseMetaData, CustomData, Data, StepTelemetryData, TrackEvent, url_hash,
};

/// Where and how telemetry is delivered.
#[derive(Debug)]
pub struct TelemetryConfig {
    /// Skip delivery. The summary line is still logged.
    pub disabled: bool,
    /// Tracking service base URL.
    pub base_url: String,
    /// Tracking endpoint path.
    pub endpoint: String,
    /// Tracking site identifier.
    pub site_id: String,
    /// Integration key sent as `x-pendo-integration-key`.
    pub token: Option<SecretString>,
    /// Repository URL reported as the library origin.
    pub library_repository: String,
    /// Upper bound for the delivery request.
    pub timeout: Duration,
    /// Delivery retries after the first attempt.
    pub max_retries: u32,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            base_url: "https://app.pendo.io".to_string(),
            endpoint: "/data/track".to_string(),
            site_id: "827e8025-1e21-ae84-c3a3-3f62b70b0130".to_string(),
            token: None,
            library_repository: "https://github.com/n/a".to_string(),
            timeout: Duration::from_secs(5),
            max_retries: 0,
        }
    }
}

impl TelemetryConfig {
    /// Enable or disable delivery.
    #[must_use]
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Override the tracking service base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the integration key. Empty keys are ignored.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = (!token.is_empty()).then(|| SecretString::from(token));
        self
    }

    fn track_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.endpoint)
    }
}

/// Telemetry for a single step run.
#[derive(Debug)]
pub struct Telemetry {
    config: TelemetryConfig,
    base_data: BaseData,
    data: Data,
    build_url: String,
    error_detail: Option<serde_json::Value>,
}

impl Telemetry {
    /// Capture the base data for `step_name` from `provider`.
    pub fn new(
        config: TelemetryConfig,
        step_name: impl Into<String>,
        provider: &impl OrchestratorProvider,
    ) -> Self {
        let build_url = provider.build_url();
        let base_data = BaseData {
            orchestrator: provider.orchestrator_type().to_string(),
            stage_name: provider.stage_name(),
            url: config.library_repository.clone(),
            action_name: data::ACTION_NAME.to_string(),
            event_type: data::EVENT_TYPE.to_string(),
            step_name: step_name.into(),
            site_id: config.site_id.clone(),
            pipeline_url_hash: url_hash(&provider.job_url()),
            build_url_hash: url_hash(&build_url),
        };
        debug!(step = %base_data.step_name, orchestrator = %base_data.orchestrator, "Telemetry initialized");

        let data = Data {
            base: base_data.clone(),
            ..Data::default()
        };
        Self {
            config,
            base_data,
            data,
            build_url,
            error_detail: None,
        }
    }

    /// Combine the base data with the step's `custom` data.
    pub fn set_data(&mut self, custom: CustomData) {
        self.data = Data {
            base: self.base_data.clone(),
            meta: BaseMetaData::default(),
            custom,
        };
    }

    /// Attach structured detail of the error that failed the step.
    pub fn set_error_detail(&mut self, detail: serde_json::Value) {
        self.error_detail = Some(detail);
    }

    /// Current telemetry record.
    #[must_use]
    pub fn data(&self) -> &Data {
        &self.data
    }

    /// Summary of the step run.
    ///
    /// The start time is estimated by subtracting the reported duration from
    /// now. Error detail is only included for failed steps.
    #[must_use]
    pub fn step_telemetry_data(&self) -> StepTelemetryData {
        let custom = &self.data.custom;
        let duration_ms = custom.duration.parse::<i64>().unwrap_or(0);
        let start = Utc::now() - TimeDelta::try_milliseconds(duration_ms).unwrap_or_default();
        let failed = !custom.error_code.is_empty() && custom.error_code != "0";

        StepTelemetryData {
            step_start_time: start.to_rfc3339(),
            pipeline_url_hash: self.data.base.pipeline_url_hash.clone(),
            build_url_hash: self.data.base.build_url_hash.clone(),
            stage_name: self.data.base.stage_name.clone(),
            step_name: self.data.base.step_name.clone(),
            error_code: custom.error_code.clone(),
            step_duration: custom.duration.clone(),
            error_category: custom.error_category.clone(),
            error_detail: if failed {
                self.error_detail.clone()
            } else {
                None
            },
            correlation_id: self.build_url.clone(),
            piper_commit_hash: custom.piper_commit_hash.clone(),
        }
    }

    /// Event posted to the tracking endpoint.
    #[must_use]
    pub fn track_event(&self) -> TrackEvent {
        TrackEvent {
            kind: "track",
            event: self.data.base.step_name.clone(),
            visitor_id: self.data.base.pipeline_url_hash.clone(),
            account_id: self.config.site_id.clone(),
            timestamp: Utc::now().timestamp_millis(),
            properties: self.data.clone(),
        }
    }

    /// Log the step summary and, unless disabled, deliver the track event.
    pub fn send(&self) {
        self.log_step_telemetry_data();

        if self.config.disabled {
            debug!("Telemetry disabled, skipping delivery");
            return;
        }

        let options = ClientOptions::default()
            .with_timeout(self.config.timeout)
            .with_max_retries(self.config.max_retries);
        let client = match HttpClient::new(options) {
            Ok(client) => client,
            Err(e) => {
                warn!(error = %e, "Could not create telemetry client");
                return;
            }
        };

        let key = self
            .config
            .token
            .as_ref()
            .map(|t| t.expose_secret().to_string())
            .unwrap_or_default();
        let url = self.config.track_url();
        debug!(%url, "Sending telemetry data");
        if let Err(e) = client.post_json(
            &url,
            &self.track_event(),
            &[("x-pendo-integration-key", key.as_str())],
        ) {
            warn!(error = %e, "Failed to send telemetry data");
        }
    }

    fn log_step_telemetry_data(&self) {
        match serde_json::to_string(&self.step_telemetry_data()) {
            Ok(json) => info!("Step telemetry data:{json}"),
            Err(e) => {
                error!(error = %e, "Could not serialize step telemetry data");
                info!("Step telemetry data: {{n/a}}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use piper_orchestrator::{
        BuildReason, Orchestrator, PullRequestConfig, UnknownProvider,
    };
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FakeProvider;

    impl OrchestratorProvider for FakeProvider {
        fn orchestrator(&self) -> Orchestrator {
            Orchestrator::Jenkins
        }
        fn branch(&self) -> String {
            "main".to_string()
        }
        fn reference(&self) -> String {
            "refs/heads/main".to_string()
        }
        fn commit(&self) -> String {
            "abc".to_string()
        }
        fn repo_url(&self) -> String {
            String::new()
        }
        fn build_url(&self) -> String {
            "https://jenkins.example.com/job/foo/15/".to_string()
        }
        fn build_id(&self) -> String {
            "15".to_string()
        }
        fn job_url(&self) -> String {
            "https://jenkins.example.com/job/foo/".to_string()
        }
        fn job_name(&self) -> String {
            "foo".to_string()
        }
        fn stage_name(&self) -> String {
            "Build".to_string()
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

    #[test]
    fn test_base_data_from_provider() {
        let telemetry = Telemetry::new(TelemetryConfig::default(), "readPipelineEnv", &FakeProvider);
        let base = &telemetry.data().base;
        assert_eq!(base.orchestrator, "Jenkins");
        assert_eq!(base.stage_name, "Build");
        assert_eq!(base.step_name, "readPipelineEnv");
        assert_eq!(base.action_name, "Piper Library OS");
        assert_eq!(base.event_type, "library-os-ng");
        assert_eq!(base.url, "https://github.com/n/a");
        assert_eq!(base.site_id, "827e8025-1e21-ae84-c3a3-3f62b70b0130");
        assert_eq!(base.pipeline_url_hash, url_hash("https://jenkins.example.com/job/foo/"));
        assert_eq!(base.build_url_hash, url_hash("https://jenkins.example.com/job/foo/15/"));
    }

    #[test]
    fn test_unknown_provider_hashes_are_not_available() {
        let telemetry = Telemetry::new(TelemetryConfig::default(), "step", &UnknownProvider);
        assert_eq!(telemetry.data().base.pipeline_url_hash, "n/a");
        assert_eq!(telemetry.data().base.build_url_hash, "n/a");
        assert_eq!(telemetry.data().base.orchestrator, "Unknown");
    }

    #[test]
    fn test_set_data_keeps_base() {
        let mut telemetry = Telemetry::new(TelemetryConfig::default(), "step", &FakeProvider);
        telemetry.set_data(CustomData::new(250, "0"));
        assert_eq!(telemetry.data().base.step_name, "step");
        assert_eq!(telemetry.data().custom.duration, "250");
        assert_eq!(telemetry.data().meta, BaseMetaData::default());
    }

    #[test]
    fn test_step_telemetry_data() {
        let mut telemetry = Telemetry::new(TelemetryConfig::default(), "step", &FakeProvider);
        telemetry.set_data(CustomData {
            error_category: "config".to_string(),
            ..CustomData::new(1000, "1")
        });
        telemetry.set_error_detail(serde_json::json!({"message": "boom"}));

        let step = telemetry.step_telemetry_data();
        assert_eq!(step.step_name, "step");
        assert_eq!(step.stage_name, "Build");
        assert_eq!(step.error_code, "1");
        assert_eq!(step.step_duration, "1000");
        assert_eq!(step.error_category, "config");
        assert_eq!(step.correlation_id, "https://jenkins.example.com/job/foo/15/");
        assert_eq!(step.error_detail, Some(serde_json::json!({"message": "boom"})));

        let start = chrono::DateTime::parse_from_rfc3339(&step.step_start_time).unwrap();
        assert!(start.with_timezone(&Utc) <= Utc::now() - TimeDelta::milliseconds(1000));
    }

    #[test]
    fn test_error_detail_omitted_on_success() {
        let mut telemetry = Telemetry::new(TelemetryConfig::default(), "step", &FakeProvider);
        telemetry.set_data(CustomData::new(10, "0"));
        telemetry.set_error_detail(serde_json::json!({"message": "stale"}));
        assert!(telemetry.step_telemetry_data().error_detail.is_none());
    }

    #[test]
    fn test_track_event() {
        let telemetry = Telemetry::new(TelemetryConfig::default(), "step", &FakeProvider);
        let event = telemetry.track_event();
        assert_eq!(event.kind, "track");
        assert_eq!(event.event, "step");
        assert_eq!(event.visitor_id, url_hash("https://jenkins.example.com/job/foo/"));
        assert_eq!(event.account_id, "827e8025-1e21-ae84-c3a3-3f62b70b0130");
        assert!(event.timestamp > 0);
    }

    #[test]
    fn test_send_posts_track_event() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let server = rt.block_on(async {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/data/track"))
                .and(header("x-pendo-integration-key", "key-1234"))
                .and(header("content-type", "application/json"))
                .and(body_partial_json(serde_json::json!({
                    "type": "track",
                    "event": "step",
                    "properties": {"stepName": "step", "errorCode": "0"}
                })))
                .respond_with(ResponseTemplate::new(200))
                .expect(1)
                .mount(&server)
                .await;
            server
        });

        let config = TelemetryConfig::default()
            .with_base_url(server.uri())
            .with_token("key-1234");
        let mut telemetry = Telemetry::new(config, "step", &FakeProvider);
        telemetry.set_data(CustomData::new(10, "0"));
        telemetry.send();

        rt.block_on(server.verify());
    }

    #[test]
    fn test_send_skips_delivery_when_disabled() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let server = rt.block_on(async {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(200))
                .expect(0)
                .mount(&server)
                .await;
            server
        });

        let config = TelemetryConfig::default()
            .with_base_url(server.uri())
            .with_disabled(true);
        Telemetry::new(config, "step", &FakeProvider).send();

        rt.block_on(server.verify());
    }

    #[test]
    fn test_send_failure_is_not_fatal() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let server = rt.block_on(async {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(500))
                .mount(&server)
                .await;
            server
        });

        let config = TelemetryConfig::default().with_base_url(server.uri());
        Telemetry::new(config, "step", &FakeProvider).send();
    }
}
