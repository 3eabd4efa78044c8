//! Error types for authentication operations.

use thiserror::Error;

/// Errors that can occur during authentication operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The principal authenticated but lacks the privileged role.
    #[error("Only admin users can run CLI commands")]
    NotAdmin,

    /// The server handed out a token that failed validation.
    #[error("Invalid token received from server")]
    InvalidToken,

    /// The tool call failed; carries the server or transport message.
    #[error("{0}")]
    Tool(String),

    /// The tool replied with a payload that is not a session.
    #[error("Unexpected response from {tool}: {message}")]
    MalformedResponse { tool: String, message: String },
}

impl AuthError {
    /// Whether the error is a domain policy rejection rather than a failure
    /// to reach or understand the server.
    pub fn is_policy(&self) -> bool {
        matches!(self, Self::NotAdmin | Self::InvalidToken)
    }
}

/// Result type for auth operations.
pub type AuthResult<T> = Result<T, AuthError>;
