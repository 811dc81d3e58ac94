//! Error handling for bodystream-rs
//!
//! This module defines the error types and a Result alias used throughout
//! the crate.
//!
//! Initialization errors (device, calibration, tracker) abort the process.
//! Steady-state errors (capture, enqueue, pop) end the acquisition loop and
//! are reported after teardown. Falling back from the accelerated tracker is
//! not an error and never shows up here.

use crate::types::ProcessingMode;
use thiserror::Error;

/// Outcome of a failed collaborator wait (capture, enqueue or pop)
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitError {
    /// The wait returned without a result
    #[error("timed out")]
    Timeout,

    /// The collaborator reported a failure
    #[error("failed with code {0}")]
    Failed(i32),
}

/// Main error type for bodystream-rs operations
#[derive(Error, Debug)]
pub enum StreamError {
    /// Opening or starting the depth sensor failed
    #[error("Device error: {0}")]
    Device(String),

    /// Fetching the sensor calibration failed
    #[error("Calibration error: {0}")]
    Calibration(String),

    /// The body tracker could not be created
    #[error("Tracker initialization failed ({mode} mode): {message}")]
    TrackerInit {
        mode: ProcessingMode,
        message: String,
    },

    /// Waiting for a depth capture failed
    #[error("Get depth capture {0}")]
    Capture(WaitError),

    /// Adding a capture to the tracker queue failed
    #[error("Add capture to tracker process queue {0}")]
    Enqueue(WaitError),

    /// Popping a body frame from the tracker failed
    #[error("Pop body frame result {0}")]
    PopResult(WaitError),

    /// A tracking result could not be copied into a frame sample
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Errors from the stream transport
    #[error("Transport error: {0}")]
    Transport(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<StreamError>,
    },
}

impl StreamError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        StreamError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Whether this error came from a timed out wait
    pub fn is_timeout(&self) -> bool {
        match self {
            StreamError::Capture(e) | StreamError::Enqueue(e) | StreamError::PopResult(e) => {
                *e == WaitError::Timeout
            }
            StreamError::WithContext { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for StreamError {
    fn from(err: serde_json::Error) -> Self {
        StreamError::Serialization(err.to_string())
    }
}

/// Result type alias for bodystream-rs operations
pub type Result<T> = std::result::Result<T, StreamError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
