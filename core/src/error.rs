//! Error taxonomy for operation calls.
//!
//! # Design
//! Every failure a call can hit is a `ToolError` value. Nothing in the core
//! panics or returns an opaque error to the dispatcher: validation problems,
//! upstream statuses and transport faults all travel as data and end up
//! rendered into the same `ResponseEnvelope` shape as a success.

use serde::{Deserialize, Serialize};

/// Errors produced while resolving, translating or executing an operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolError {
    /// The caller named an operation that is not in the catalog.
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    /// A required parameter is missing, or a supplied value has the wrong
    /// shape or falls outside the parameter's allowed set.
    #[error("invalid parameter `{parameter}`: {reason}")]
    Validation { parameter: String, reason: String },

    /// The remote API answered with a non-2xx status.
    #[error("upstream returned HTTP {status}: {body}")]
    UpstreamHttp { status: u16, body: String },

    /// Connection failure, timeout or unreadable response stream.
    #[error("transport failure: {0}")]
    Transport(String),

    /// Anything else. The message never carries stack detail.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ToolError {
    pub(crate) fn missing(parameter: &str) -> Self {
        ToolError::Validation {
            parameter: parameter.to_string(),
            reason: "is required".to_string(),
        }
    }

    pub(crate) fn invalid(parameter: &str, reason: impl Into<String>) -> Self {
        ToolError::Validation {
            parameter: parameter.to_string(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ToolError::UnknownOperation(_) => ErrorKind::UnknownOperation,
            ToolError::Validation { .. } => ErrorKind::ValidationError,
            ToolError::UpstreamHttp { .. } => ErrorKind::UpstreamHttpError,
            ToolError::Transport(_) => ErrorKind::TransportError,
            ToolError::Internal(_) => ErrorKind::InternalError,
        }
    }

    /// HTTP status of the upstream response, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ToolError::UpstreamHttp { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Name of the offending parameter for validation failures.
    pub fn parameter(&self) -> Option<&str> {
        match self {
            ToolError::Validation { parameter, .. } => Some(parameter),
            _ => None,
        }
    }
}

/// Serialized error category carried in a failure envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    UnknownOperation,
    ValidationError,
    UpstreamHttpError,
    TransportError,
    InternalError,
}
