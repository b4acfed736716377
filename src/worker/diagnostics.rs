//! Failure reporting
//!
//! Every relay failure ends here instead of in a reply: the caller only ever
//! sees the absence of a result.

use std::sync::Mutex;
use thiserror::Error;
use tracing::{error, warn};

use super::http::FetchError;
use crate::messaging::MessagingError;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Request failed. Returned status of {0}")]
    Status(u16),

    #[error("Request failed: {0}")]
    Network(#[from] FetchError),

    #[error("Response body is not valid JSON: {0}")]
    MalformedBody(#[from] serde_json::Error),

    #[error("Invalid task: {0}")]
    InvalidTask(String),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("Result dropped: {0}")]
    ReplyDropped(#[from] MessagingError),
}

impl RelayError {
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::Status(_) => "status",
            RelayError::Network(_) => "network",
            RelayError::MalformedBody(_) => "malformed_body",
            RelayError::InvalidTask(_) => "invalid_task",
            RelayError::InvalidUrl(_) => "invalid_url",
            RelayError::ReplyDropped(_) => "reply_dropped",
        }
    }
}

/// Sink for failed relays; called exactly once per failed task
pub trait Diagnostics: Send + Sync {
    fn report(&self, from: Option<&str>, error: &RelayError);
}

/// Logs failures through `tracing`
#[derive(Debug, Clone, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn report(&self, from: Option<&str>, failure: &RelayError) {
        match failure {
            RelayError::Status(status) => {
                warn!(from, status, "{}", failure);
            }
            _ => {
                error!(from, kind = failure.kind(), "{}", failure);
            }
        }
    }
}

/// Keeps diagnostic lines in memory (tests, embedding hosts)
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    lines: Mutex<Vec<String>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn report(&self, _from: Option<&str>, error: &RelayError) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(error.to_string());
        }
    }
}
