use miette::Diagnostic;
use thiserror::Error;

/// Main error type for piper operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    #[diagnostic(code(piper::config))]
    Configuration(String),

    /// The request could not be sent or the response could not be read.
    #[error("HTTP request to {url} failed: {message}")]
    #[diagnostic(code(piper::http::request))]
    Http {
        /// Target URL.
        url: String,
        /// Transport error message.
        message: String,
    },

    /// The server answered with a non-success status.
    #[error("HTTP request to {url} returned status {status}")]
    #[diagnostic(code(piper::http::status))]
    HttpStatus {
        /// Target URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The request did not finish within the configured duration.
    #[error("HTTP request to {url} timed out after {seconds} seconds")]
    #[diagnostic(
        code(piper::http::timeout),
        help("Increase the request timeout or check the network connection")
    )]
    Timeout {
        /// Target URL.
        url: String,
        /// Configured timeout.
        seconds: u64,
    },

    /// All retry attempts were used up.
    #[error("{operation} failed after {attempts} attempts: {last_error}")]
    #[diagnostic(code(piper::http::retry_exhausted))]
    RetryExhausted {
        /// Name of the operation that was retried.
        operation: String,
        /// Number of attempts made.
        attempts: u32,
        /// Message of the last failure.
        last_error: String,
    },

    /// The active orchestrator does not implement an operation.
    #[error("{operation} is not supported on orchestrator {orchestrator}")]
    #[diagnostic(code(piper::unsupported))]
    Unsupported {
        /// Orchestrator label.
        orchestrator: String,
        /// Operation name.
        operation: &'static str,
    },

    /// Filesystem error.
    #[error("IO error: {0}")]
    #[diagnostic(code(piper::io))]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    #[diagnostic(code(piper::json))]
    Json(#[from] serde_json::Error),

    /// Encryption or decryption failure.
    #[error("Encryption error: {0}")]
    #[diagnostic(code(piper::encryption))]
    Encryption(String),
}

impl Error {
    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a transport error for `url`.
    pub fn http(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Http {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a status error for `url`.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Create a timeout error for `url`.
    pub fn timeout(url: impl Into<String>, seconds: u64) -> Self {
        Self::Timeout {
            url: url.into(),
            seconds,
        }
    }

    /// Create a retry exhaustion error.
    pub fn retry_exhausted(
        operation: impl Into<String>,
        attempts: u32,
        last_error: impl Into<String>,
    ) -> Self {
        Self::RetryExhausted {
            operation: operation.into(),
            attempts,
            last_error: last_error.into(),
        }
    }

    /// Create an unsupported-operation error.
    pub fn unsupported(orchestrator: impl Into<String>, operation: &'static str) -> Self {
        Self::Unsupported {
            orchestrator: orchestrator.into(),
            operation,
        }
    }

    /// Create an encryption error.
    pub fn encryption(msg: impl Into<String>) -> Self {
        Self::Encryption(msg.into())
    }

    /// Whether a retry could succeed where this attempt failed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { .. } | Self::Timeout { .. } => true,
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            Self::Configuration(_)
            | Self::RetryExhausted { .. }
            | Self::Unsupported { .. }
            | Self::Io(_)
            | Self::Json(_)
            | Self::Encryption(_) => false,
        }
    }
}

/// Result type alias for piper operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        assert!(Error::http_status("u", 500).is_retryable());
        assert!(Error::http_status("u", 503).is_retryable());
        assert!(Error::http_status("u", 429).is_retryable());
        assert!(!Error::http_status("u", 404).is_retryable());
        assert!(!Error::http_status("u", 401).is_retryable());
    }

    #[test]
    fn test_transport_errors_are_retryable() {
        assert!(Error::http("u", "connection reset").is_retryable());
        assert!(Error::timeout("u", 5).is_retryable());
    }

    #[test]
    fn test_local_errors_are_not_retryable() {
        assert!(!Error::configuration("bad").is_retryable());
        assert!(!Error::unsupported("Jenkins", "log").is_retryable());
        assert!(!Error::retry_exhausted("get", 3, "boom").is_retryable());
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            Error::unsupported("Jenkins", "log retrieval").to_string(),
            "log retrieval is not supported on orchestrator Jenkins"
        );
        assert_eq!(
            Error::timeout("https://api.github.com", 5).to_string(),
            "HTTP request to https://api.github.com timed out after 5 seconds"
        );
    }
}
