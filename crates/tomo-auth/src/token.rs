//! Login/refresh reply parsing and token validation.

use crate::error::{AuthError, AuthResult};
use serde::Deserialize;
use serde_json::Value;
use tomo_mcp::codec::value_into_typed;

/// Default minimum accepted access-token length.
pub const DEFAULT_MIN_TOKEN_LENGTH: usize = 10;

/// Default privileged role.
pub const DEFAULT_ADMIN_ROLE: &str = "admin";

/// Acceptance rules for credentials handed out by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPolicy {
    /// Tokens with fewer characters than this are rejected. Tokens are never
    /// trimmed; any whitespace makes a token invalid.
    pub min_token_length: usize,
    /// Role a principal must hold to be let in.
    pub admin_role: String,
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self {
            min_token_length: DEFAULT_MIN_TOKEN_LENGTH,
            admin_role: DEFAULT_ADMIN_ROLE.to_string(),
        }
    }
}

impl TokenPolicy {
    pub fn with_min_token_length(mut self, len: usize) -> Self {
        self.min_token_length = len;
        self
    }

    pub fn with_admin_role(mut self, role: impl Into<String>) -> Self {
        self.admin_role = role.into();
        self
    }

    /// Check an access token. Missing, blank, short or whitespace-bearing
    /// tokens are [`AuthError::InvalidToken`].
    pub fn validate<'a>(&self, token: Option<&'a str>) -> AuthResult<&'a str> {
        match token {
            Some(token)
                if token.chars().count() >= self.min_token_length
                    && !token.is_empty()
                    && !token.chars().any(char::is_whitespace) =>
            {
                Ok(token)
            }
            _ => Err(AuthError::InvalidToken),
        }
    }

    /// Whether `role` is the privileged role.
    pub fn is_admin(&self, role: Option<&str>) -> bool {
        role == Some(self.admin_role.as_str())
    }
}

/// Principal described by a login or refresh reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Reply of the `login` and `refresh_token` tools.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SessionGrant {
    #[serde(default, alias = "access_token", alias = "accessToken")]
    pub token: Option<String>,
    #[serde(default, alias = "refreshToken")]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<UserInfo>,
}

impl SessionGrant {
    /// Parse a tool payload, accepting JSON objects and JSON text.
    pub fn from_payload(tool: &str, payload: Value) -> AuthResult<Self> {
        value_into_typed(payload).map_err(|e| AuthError::MalformedResponse {
            tool: tool.to_string(),
            message: e.to_string(),
        })
    }

    pub fn role(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.role.as_deref())
    }

    pub fn username(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.username.as_deref())
    }

    /// Refresh token, ignoring empty strings.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|t| !t.is_empty())
    }
}
