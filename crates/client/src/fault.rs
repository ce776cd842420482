// Typed failures delivered to callers in place of a payload.

use std::fmt;
use std::time::Duration;

use flame_common::path::PathError;
use serde::Serialize;
use thiserror::Error;

use crate::transport::TransportError;

/// Failure category. Callers branch on this, not on the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// Transport or connection failure.
    Unavailable,
    /// The response did not have the expected shape.
    Protocol,
    /// The configured deadline passed before a response arrived.
    Timeout,
    /// Superseded by a newer call with the same key. Not a UI error.
    Cancelled,
    /// The service answered with an error object.
    Rejected,
    /// Arguments were refused before anything was sent.
    InvalidRequest,
}

impl FaultKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unavailable => "unavailable",
            Self::Protocol => "protocol",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
            Self::Rejected => "rejected",
            Self::InvalidRequest => "invalid_request",
        }
    }

    /// Whether a retry affordance makes sense. The manager itself never retries.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Unavailable | Self::Timeout)
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed request. Cloned to every waiter of a coalesced call.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{kind}: {message}")]
pub struct Fault {
    kind: FaultKind,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<i32>,
}

impl Fault {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), code: None }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Unavailable, message)
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Protocol, message)
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(FaultKind::Timeout, format!("no response within {}ms", after.as_millis()))
    }

    pub fn cancelled() -> Self {
        Self::new(FaultKind::Cancelled, "superseded by a newer request")
    }

    pub fn rejected(code: i32, message: impl Into<String>) -> Self {
        Self { kind: FaultKind::Rejected, message: message.into(), code: Some(code) }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(FaultKind::InvalidRequest, message)
    }

    pub fn kind(&self) -> FaultKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Remote error code, set only for `Rejected`.
    pub fn code(&self) -> Option<i32> {
        self.code
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == FaultKind::Cancelled
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl From<TransportError> for Fault {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::Unavailable(message) => Self::unavailable(message),
            TransportError::Protocol(message) => Self::protocol(message),
            TransportError::Rejected { code, message } => Self::rejected(code, message),
        }
    }
}

impl From<PathError> for Fault {
    fn from(error: PathError) -> Self {
        Self::invalid_request(error.to_string())
    }
}
