//! Tool Protocol error types.

use thiserror::Error;

/// Result type for Tool Protocol operations.
pub type McpResult<T> = Result<T, McpError>;

/// Errors that can occur while talking to the control plane.
#[derive(Debug, Error)]
pub enum McpError {
    /// Session negotiation did not yield a session identifier.
    #[error("Failed to get session ID")]
    Session,

    /// Handshake rejected by the server.
    #[error("{0}")]
    Initialization(String),

    /// Response did not match the event-stream / JSON-RPC shape.
    #[error("{0}")]
    Format(String),

    /// Tool call rejected at the HTTP level.
    #[error("MCP call failed: {status}")]
    Call { status: u16 },

    /// Server requires (re-)authentication.
    #[error("Authentication required")]
    AuthRequired,

    /// Tool returned a JSON-RPC error object.
    #[error("{0}")]
    Tool(String),

    /// Configured base URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Transport failure (connect, DNS, timeout, body read).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Fieldless classification of an [`McpError`], carried on failed results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Session,
    Initialization,
    Format,
    Call,
    Unauthorized,
    Tool,
    Network,
}

impl McpError {
    /// Create an initialization error.
    pub fn initialization(message: impl Into<String>) -> Self {
        Self::Initialization(message.into())
    }

    /// Create a format error.
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }

    /// Create a tool error.
    pub fn tool(message: impl Into<String>) -> Self {
        Self::Tool(message.into())
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Session => ErrorKind::Session,
            Self::Initialization(_) => ErrorKind::Initialization,
            Self::Format(_) | Self::Json(_) => ErrorKind::Format,
            Self::Call { .. } => ErrorKind::Call,
            Self::AuthRequired => ErrorKind::Unauthorized,
            Self::Tool(_) => ErrorKind::Tool,
            Self::InvalidUrl(_) | Self::Network(_) => ErrorKind::Network,
        }
    }
}
