use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

pub const GENERIC_SERVER_ERROR: &str = "Server error";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Failed to decode payload: {0}")]
    Decode(String),

    #[error("Storage permission is denied")]
    PermissionDenied,

    #[error("Failed to save file {file_name} in {}", .dir.display())]
    Write {
        file_name: String,
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown student: {0}")]
    UnknownStudent(String),

    #[error("Invalid form: {0}")]
    InvalidForm(String),
}

/// A non-success answer from the attendance service, already normalized
/// at the HTTP boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("request failed with status {status}: {message}")]
pub struct ApiError {
    pub status: u16,
    pub message: String,
}

impl ApiError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Builds an error from whatever the server sent back: a JSON object
    /// with a `message` field, a bare string, or anything else.
    pub fn from_payload(status: u16, payload: &Value) -> Self {
        let message = match payload {
            Value::Object(map) => map
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            _ => None,
        };
        Self::new(status, message.unwrap_or_else(|| GENERIC_SERVER_ERROR.to_string()))
    }
}
