//! Admin authentication and session lifecycle for tomo.
//!
//! Built on any [`tomo_mcp::ToolCaller`]. The [`AuthManager`] owns the
//! login, refresh and logout flows; the [`AuthContext`] it is handed holds
//! the tokens in memory only.
//!
//! Key properties:
//!
//! - Logins are only accepted for the privileged role and for tokens that
//!   pass the [`TokenPolicy`].
//! - Logout clears local state before any revocation call goes out.
//! - Concurrent refreshes share one `refresh_token` call, and a refresh that
//!   finishes after a logout never restores the session.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tomo_auth::{AuthContext, AuthManager};
//! use tomo_mcp::{ClientConfig, ToolClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(ToolClient::new(ClientConfig::new("http://localhost:3000/mcp"))?);
//! let auth = AuthManager::new(client, Arc::new(AuthContext::new()));
//!
//! auth.authenticate_admin("root", "hunter22").await?;
//! let servers = auth.call_tool::<serde_json::Value>("list_servers", serde_json::json!({})).await;
//! println!("{:?}", servers.data);
//! auth.revoke_token().await;
//! # Ok(())
//! # }
//! ```

mod error;
mod hooks;
mod manager;
mod state;
mod token;

pub use error::{AuthError, AuthResult};
pub use hooks::{ForceLogoutHandler, LogoutReason, TokenRefresher};
pub use manager::{AuthManager, LOGIN_TOOL, REFRESH_TOOL, REVOKE_TOOL};
pub use state::{AuthContext, AuthState, Generation};
pub use token::{SessionGrant, TokenPolicy, UserInfo, DEFAULT_ADMIN_ROLE, DEFAULT_MIN_TOKEN_LENGTH};
