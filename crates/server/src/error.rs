//! Structured errors for tool parameters.
//!
//! Anything past parameter parsing reports a [`sharecache_core::Error`].

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Rejected tool parameters.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// A required parameter is missing or empty.
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// The HTTP method is not a valid token.
    #[error("INVALID_METHOD: {0}")]
    InvalidMethod(String),
}

impl From<ServerError> for McpError {
    fn from(err: ServerError) -> Self {
        let message = match &err {
            ServerError::InvalidInput(msg) => msg.clone(),
            ServerError::InvalidMethod(method) => format!("invalid HTTP method: {method}"),
        };

        McpError { code: ErrorCode(-32602), message: message.into(), data: None }
    }
}
