use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Validation,
}

/// Error body returned by the relay's HTTP surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed command message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unknown command token '{0}'")]
    UnknownCommand(String),
}

impl From<ProtocolError> for ApiError {
    fn from(value: ProtocolError) -> Self {
        Self::new(ErrorCode::Validation, value.to_string())
    }
}
