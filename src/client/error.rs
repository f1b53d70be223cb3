//! # Client Error Types
//!
//! Display strings follow the two shapes recorded on failed steps:
//! `API error: {status} {reason}` when a collaborator answered with a
//! non-success status, `Error: {detail}` when the call itself failed.

use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Error: configuration: {0}")]
    Config(String),

    #[error("Error: invalid response: {field} - {reason}")]
    InvalidResponse { field: String, reason: String },

    #[error("Error: {0}")]
    Transport(String),
}

impl ClientError {
    /// Create an API error from a response status and reason phrase
    pub fn api_error(status: u16, reason: impl AsRef<str>) -> Self {
        Self::Api {
            status,
            message: format!("API error: {status} {}", reason.as_ref()).trim_end().to_string(),
        }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn invalid_response(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Status code for API errors
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
