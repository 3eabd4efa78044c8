//! Transport seam between the client and the wire.

use crate::error::McpResult;
use async_trait::async_trait;

/// Header carrying the session identifier.
pub const SESSION_HEADER: &str = "mcp-session-id";

/// Older servers name the session header differently.
pub const LEGACY_SESSION_HEADER: &str = "x-session-id";

/// Raw HTTP reply. Non-2xx statuses are data here, not errors, so the
/// client can decide what a status means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    /// Create a reply.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport for Tool Protocol exchanges.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Ask the endpoint for a session. `None` when the reply carried no
    /// session identifier.
    async fn open_session(&self) -> McpResult<Option<String>>;

    /// POST a JSON-RPC body over the given session.
    async fn post(&self, session_id: &str, body: String) -> McpResult<HttpReply>;

    /// Set or clear the bearer token sent with every request.
    fn set_auth_token(&self, token: Option<String>);
}
