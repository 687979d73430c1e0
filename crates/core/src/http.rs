//! Blocking HTTP client with a bounded request duration and retry budget.
//!
//! Every request is bounded by [`ClientOptions::max_request_duration`]; there
//! is no unbounded wait anywhere in the client. Transport failures, timeouts
//! and `429`/`5xx` responses are retried with exponential backoff until
//! [`ClientOptions::max_retries`] is spent.

use crate::{Error, Result};
use backoff::ExponentialBackoffBuilder;
use backoff::backoff::Backoff;
use reqwest::blocking::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// Options for [`HttpClient`].
#[derive(Debug)]
pub struct ClientOptions {
    /// Upper bound for a single request, including reading the body.
    pub max_request_duration: Duration,
    /// Retries after the first attempt. `0` disables retrying.
    pub max_retries: u32,
    /// Bearer token sent as `Authorization` header.
    pub token: Option<SecretString>,
    /// `User-Agent` header value.
    pub user_agent: String,
    /// Delay before the first retry; later retries back off exponentially.
    pub initial_backoff: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            max_request_duration: Duration::from_secs(10),
            max_retries: 2,
            token: None,
            user_agent: format!("piper/{}", env!("CARGO_PKG_VERSION")),
            initial_backoff: Duration::from_millis(500),
        }
    }
}

impl ClientOptions {
    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.max_request_duration = timeout;
        self
    }

    /// Set the retry budget.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the bearer token. Empty tokens are ignored.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = if token.is_empty() {
            None
        } else {
            Some(SecretString::from(token))
        };
        self
    }

    /// Set the delay before the first retry.
    #[must_use]
    pub fn with_initial_backoff(mut self, delay: Duration) -> Self {
        self.initial_backoff = delay;
        self
    }
}

/// Synchronous HTTP client used for log retrieval and telemetry.
#[derive(Debug)]
pub struct HttpClient {
    client: Client,
    options: ClientOptions,
}

impl HttpClient {
    /// Build a client from `options`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the TLS backend cannot be initialized.
    pub fn new(options: ClientOptions) -> Result<Self> {
        let client = Client::builder()
            .timeout(options.max_request_duration)
            .user_agent(options.user_agent.clone())
            .build()
            .map_err(|e| Error::configuration(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client, options })
    }

    /// The options this client was built with.
    #[must_use]
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// `GET` `url` and return the response body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, timeout or non-success status
    /// once the retry budget is spent.
    pub fn get(&self, url: &str) -> Result<Vec<u8>> {
        self.with_retry("GET", url, || {
            let response = self
                .authorize(self.client.get(url))
                .send()
                .map_err(|e| self.map_transport_error(url, &e))?;
            let status = response.status();
            if !status.is_success() {
                return Err(Error::http_status(url, status.as_u16()));
            }
            response
                .bytes()
                .map(|body| body.to_vec())
                .map_err(|e| self.map_transport_error(url, &e))
        })
    }

    /// `GET` `url` and decode the JSON body.
    ///
    /// # Errors
    ///
    /// Same as [`HttpClient::get`], plus JSON decoding errors.
    pub fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let body = self.get(url)?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// `POST` `body` as JSON to `url` with extra `headers`.
    ///
    /// # Errors
    ///
    /// Returns an error on serialization failure, transport failure, timeout
    /// or non-success status once the retry budget is spent.
    pub fn post_json<B: Serialize>(
        &self,
        url: &str,
        body: &B,
        headers: &[(&str, &str)],
    ) -> Result<()> {
        let payload = serde_json::to_vec(body)?;
        self.with_retry("POST", url, || {
            let mut request = self
                .authorize(self.client.post(url))
                .header("Content-Type", "application/json")
                .body(payload.clone());
            for (name, value) in headers {
                request = request.header(*name, *value);
            }
            let response = request
                .send()
                .map_err(|e| self.map_transport_error(url, &e))?;
            let status = response.status();
            if status.is_success() {
                Ok(())
            } else {
                Err(Error::http_status(url, status.as_u16()))
            }
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.options.token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    fn map_transport_error(&self, url: &str, err: &reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::timeout(url, self.options.max_request_duration.as_secs())
        } else {
            Error::http(url, err.to_string())
        }
    }

    fn with_retry<T>(
        &self,
        method: &str,
        url: &str,
        mut attempt: impl FnMut() -> Result<T>,
    ) -> Result<T> {
        let max_attempts = self.options.max_retries.saturating_add(1);
        let mut backoff = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.options.initial_backoff)
            .with_max_interval(Duration::from_secs(10))
            .with_max_elapsed_time(None)
            .build();
        let mut attempts = 0;

        loop {
            attempts += 1;
            debug!(method, url, attempt = attempts, "Sending request");

            match attempt() {
                Ok(value) => {
                    if attempts > 1 {
                        debug!(method, url, attempts, "Request succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) if attempts >= max_attempts => {
                    if attempts == 1 {
                        return Err(err);
                    }
                    warn!(method, url, attempts, error = %err, "Request failed after maximum retries");
                    return Err(Error::retry_exhausted(
                        format!("{method} {url}"),
                        attempts,
                        err.to_string(),
                    ));
                }
                Err(err) => {
                    let delay = backoff
                        .next_backoff()
                        .unwrap_or(self.options.initial_backoff);
                    warn!(
                        method,
                        url,
                        attempts,
                        error = %err,
                        retry_in_ms = delay.as_millis(),
                        "Request failed, retrying"
                    );
                    std::thread::sleep(delay);
                }
            }
        }
    }
}
