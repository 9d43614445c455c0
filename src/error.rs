//! Unified error types for the AdWords report utilities.

use reqwest::StatusCode;
use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Authentication-related errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Token request failed with status {status}: {body}")]
    TokenRequestFailed { status: StatusCode, body: String },

    #[error("Token parse error: {0}")]
    TokenParse(String),

    #[error("Failed to create HTTP client: {0}")]
    HttpClientInit(String),
}

/// Errors raised by calls to the remote API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Stream read error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Report download failed with status {status}: {message}")]
    ReportDownload { status: StatusCode, message: String },

    #[error("{service} fault: {message}")]
    Service { service: String, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Failed to encode request: {0}")]
    Encoding(String),

    #[error("Failed to create HTTP client: {0}")]
    HttpClientInit(String),
}

impl ApiError {
    /// Whether the failure is worth retrying.
    ///
    /// Server-side report generation faults and anything that went wrong on
    /// the wire are transient; everything else is the caller's problem.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::ReportDownload { status, .. } => status.is_server_error(),
            ApiError::Request(e) | ApiError::Auth(AuthError::Request(e)) => is_transient_request(e),
            ApiError::Transport(_) | ApiError::Io(_) => true,
            _ => false,
        }
    }
}

/// Connection, timeout and body failures; not malformed requests or
/// undecodable responses.
fn is_transient_request(error: &reqwest::Error) -> bool {
    error.is_connect() || error.is_timeout() || error.is_request() || error.is_body()
}

/// Errors raised while requesting, downloading or cleaning a report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("At least one report field is required")]
    NoFields,

    #[error("Invalid date '{input}' (expected format {format})")]
    InvalidDate { input: String, format: String },

    #[error("End date {end} is before start date {start}")]
    InvalidDateRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("Invalid additional field: {0}")]
    InvalidAdditionalField(String),

    #[error("No client customer id set and none supplied")]
    MissingClientCustomerId,

    #[error("Fields not found in {report_type}: {}", fields.join(", "))]
    UnknownFields {
        report_type: String,
        fields: Vec<String>,
    },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Row {line} has {found} columns, expected {expected}")]
    ShortRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("Failed to clean field {field}: {source:#}")]
    Cleaning {
        field: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Unexpected account report row: {0}")]
    InvalidRollupRow(String),
}

pub type Result<T, E = ReportError> = std::result::Result<T, E>;
