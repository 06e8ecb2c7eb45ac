//! Error types for media-relay
//!
//! This module provides error handling for the library, including:
//! - The request-level error taxonomy (input, configuration, invocation, empty result)
//! - Task runner failures (submit, poll, dataset fetch) carried by [`InvocationError`]
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for media-relay operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for media-relay
///
/// Every terminal failure of a request ends up as one of these variants. Each
/// variant carries enough context to be logged and rendered as an [`ApiError`].
#[derive(Debug, Error)]
pub enum Error {
    /// Caller supplied a missing or unusable URL
    #[error("{0}")]
    InvalidInput(String),

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "APIFY_TOKEN")
        key: Option<String>,
    },

    /// No task is configured for the requested platform
    #[error("unknown platform: {0}")]
    UnknownPlatform(String),

    /// Every attempt to run the task failed
    #[error("invocation of task {task} failed: {source}")]
    Invocation {
        /// The last task identifier that was tried
        task: String,
        /// The failure of the last attempt
        #[source]
        source: InvocationError,
    },

    /// The task ran but produced no records
    #[error("no items returned by task")]
    EmptyResult,

    /// Network error outside of a task invocation (client construction, etc.)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),
}

/// Failures of a single invocation attempt against the task runner
///
/// Submit, poll and fetch failures are all fatal for the attempt; the caller
/// decides whether another identifier encoding is worth trying.
#[derive(Debug, Error)]
pub enum InvocationError {
    /// Transport-level failure talking to the runner
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The runner answered with a non-success status
    #[error("{operation} returned HTTP {status}: {body}")]
    Rejected {
        /// Which runner call was rejected (e.g. "start run")
        operation: &'static str,
        /// HTTP status code returned by the runner
        status: u16,
        /// Response body, kept for diagnostics
        body: String,
    },

    /// The runner returned a body that could not be decoded
    #[error("unexpected response from {operation}: {source}")]
    Decode {
        /// Which runner call produced the body
        operation: &'static str,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// Starting a run succeeded but no run id came back
    #[error("no run id returned when starting run")]
    MissingRunId,

    /// The run reached the FAILED state
    #[error("run {run_id} failed: {payload}")]
    RunFailed {
        /// The run that failed
        run_id: String,
        /// Raw status payload reported by the runner
        payload: serde_json::Value,
    },

    /// The run never reached a terminal state within the attempt budget
    #[error("timed out waiting for run {run_id} after {attempts} status checks")]
    PollTimeout {
        /// The run being polled
        run_id: String,
        /// Number of status queries performed
        attempts: u32,
    },

    /// The run succeeded without reporting a dataset
    #[error("run {run_id} succeeded without a dataset id")]
    MissingDataset {
        /// The run that succeeded
        run_id: String,
    },

    /// The invoker was built without any strategy
    #[error("no invocation strategy configured")]
    NoStrategies,
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": "Server error",
///   "code": "invocation_failed",
///   "details": "owner~name (run_failed): run abc failed: {\"data\":{\"status\":\"FAILED\"}}"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Human-readable error message
    pub error: String,

    /// Machine-readable error code (e.g., "invalid_input", "empty_result")
    ///
    /// Clients can use this for programmatic error handling.
    pub code: String,

    /// Optional diagnostic detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: code.into(),
            details: None,
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: message.into(),
            code: code.into(),
            details: Some(details),
        }
    }

    /// Create a "not found" error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("not_found", format!("{} not found", resource.into()))
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            Error::InvalidInput(_) => 400,

            Error::UnknownPlatform(_) => 404,
            Error::EmptyResult => 404,

            // A missing token is the server's fault, not the caller's
            Error::Config { .. } => 500,
            Error::Invocation { .. } => 500,
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,

            Error::Network(_) => 502,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::InvalidInput(_) => "invalid_input",
            Error::Config { .. } => "config_error",
            Error::UnknownPlatform(_) => "unknown_platform",
            Error::Invocation { .. } => "invocation_failed",
            Error::EmptyResult => "empty_result",
            Error::Network(_) => "network_error",
            Error::Io(_) => "io_error",
            Error::ApiServerError(_) => "api_server_error",
        }
    }
}

impl InvocationError {
    /// Short machine-readable name of the failure, used in logs and details
    pub fn kind(&self) -> &'static str {
        match self {
            InvocationError::Network(_) => "network",
            InvocationError::Rejected { .. } => "rejected",
            InvocationError::Decode { .. } => "decode",
            InvocationError::MissingRunId => "missing_run_id",
            InvocationError::RunFailed { .. } => "run_failed",
            InvocationError::PollTimeout { .. } => "poll_timeout",
            InvocationError::MissingDataset { .. } => "missing_dataset",
            InvocationError::NoStrategies => "no_strategies",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();

        match &error {
            Error::Invocation { task, source } => ApiError::with_details(
                code,
                "Server error",
                serde_json::json!(format!("{} ({}): {}", task, source.kind(), source)),
            ),
            Error::Config { message, key } => ApiError::with_details(
                code,
                "Server misconfigured",
                serde_json::json!(match key {
                    Some(key) => format!("{}: {}", key, message),
                    None => message.clone(),
                }),
            ),
            Error::Network(_) | Error::Io(_) | Error::ApiServerError(_) => {
                ApiError::with_details(code, "Server error", serde_json::json!(error.to_string()))
            }
            Error::InvalidInput(message) => ApiError::new(code, message.clone()),
            Error::UnknownPlatform(_) | Error::EmptyResult => {
                ApiError::new(code, error.to_string())
            }
        }
    }
}
