//! Error types for the push pipeline
//!
//! Every failure is terminal for the task. The variant names the failure
//! category; the display text is what ends up in the task log.

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, JobError>;

/// The single error kind surfaced to the task framework
#[derive(Error, Debug)]
pub enum JobError {
    /// Task input is missing a required field
    #[error("{0}")]
    InvalidInput(String),

    /// Connection-level failure talking to the catalog or the resource host
    #[error("{0}")]
    Transport(String),

    /// The resource download did not complete in time
    #[error("Connection timed out after {0}s")]
    Timeout(u64),

    /// A remote endpoint answered with an unacceptable status or body
    #[error("{0}")]
    BadResponse(String),

    /// No parser handles the content type / declared format pair
    #[error("No parser for {content_type} or {format} found.")]
    UnsupportedFormat {
        content_type: String,
        format: String,
    },

    /// The resource exceeds the download ceiling
    #[error("Resource too large to download: {size} > max ({max}).")]
    TooLarge { size: u64, max: u64 },

    /// The resource could not be decoded as a table
    #[error("Could not parse resource: {0}")]
    Parse(String),

    /// Invalid pipeline configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl JobError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn bad_response(msg: impl Into<String>) -> Self {
        Self::BadResponse(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn unsupported_format(content_type: impl Into<String>, format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            content_type: content_type.into(),
            format: format.into(),
        }
    }

    /// Human-readable explanation recorded on the failed task
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl From<csv::Error> for JobError {
    fn from(err: csv::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
