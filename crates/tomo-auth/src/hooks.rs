//! Callbacks the application registers with the auth manager.

use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

/// Why a session was ended without the user asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    /// The server rejected the credential and it could not be refreshed.
    SessionExpired,
    /// No authenticated activity within the inactivity timeout.
    Inactivity,
}

impl fmt::Display for LogoutReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionExpired => write!(f, "session expired"),
            Self::Inactivity => write!(f, "inactivity timeout"),
        }
    }
}

/// Obtains a fresh credential. Resolves to whether it succeeded.
pub type TokenRefresher = Arc<dyn Fn() -> BoxFuture<'static, bool> + Send + Sync>;

/// Notified when a session is terminated by policy.
pub type ForceLogoutHandler = Arc<dyn Fn(LogoutReason) + Send + Sync>;

#[derive(Default, Clone)]
pub(crate) struct SessionHooks {
    pub(crate) refresher: Option<TokenRefresher>,
    pub(crate) force_logout: Option<ForceLogoutHandler>,
}

impl SessionHooks {
    pub(crate) fn fire_logout(&self, reason: LogoutReason) {
        if let Some(handler) = &self.force_logout {
            handler(reason);
        }
    }
}
