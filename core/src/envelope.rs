//! Uniform success/failure wrapper returned for every call.
//!
//! Callers tell failure from success only by `success`; there is no second
//! error channel. Serialization is deterministic (object keys are sorted),
//! so identical calls render byte-identical text.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ErrorKind, ToolError};

const FALLBACK_JSON: &str =
    r#"{"success":false,"error":{"kind":"InternalError","message":"response could not be serialized"}}"#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
}

impl ResponseEnvelope {
    pub fn ok(payload: Value) -> Self {
        Self {
            success: true,
            payload: Some(payload),
            error: None,
        }
    }

    pub fn from_error(err: &ToolError) -> Self {
        Self {
            success: false,
            payload: None,
            error: Some(ErrorBody {
                kind: err.kind(),
                message: err.to_string(),
                status: err.status(),
                parameter: err.parameter().map(str::to_string),
            }),
        }
    }

    pub fn from_result(result: Result<Value, ToolError>) -> Self {
        match result {
            Ok(payload) => Self::ok(payload),
            Err(err) => Self::from_error(&err),
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }

    /// Render as a single JSON text block.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| FALLBACK_JSON.to_string())
    }
}
