//! In-memory record of the authenticated principal.

use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Tokens and identity of the current principal.
///
/// `access_token` is `None` exactly when nobody is authenticated.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub username: Option<String>,
    pub role: Option<String>,
}

impl AuthState {
    /// State for an authenticated principal.
    pub fn authenticated(
        access_token: String,
        refresh_token: Option<String>,
        username: Option<String>,
        role: Option<String>,
    ) -> Self {
        Self {
            access_token: Some(access_token),
            refresh_token,
            username,
            role,
        }
    }

    /// Whether an access token is held.
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }
}

impl fmt::Debug for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |token: &Option<String>| token.as_ref().map(|_| "<redacted>");
        f.debug_struct("AuthState")
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .field("username", &self.username)
            .field("role", &self.role)
            .finish()
    }
}

/// Opaque stamp of an [`AuthContext`] write. Changes on every write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

struct Stamped {
    state: AuthState,
    generation: u64,
}

/// Holder of the process's [`AuthState`].
///
/// Constructed once by the application and injected wherever auth state is
/// read; [`AuthContext::reset`] returns it to the empty form. Every write
/// bumps a generation so long-running operations can tell whether the state
/// changed underneath them.
pub struct AuthContext {
    inner: RwLock<Stamped>,
}

impl AuthContext {
    /// An empty (unauthenticated) context.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Stamped {
                state: AuthState::default(),
                generation: 0,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Stamped> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Stamped> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> AuthState {
        self.read().state.clone()
    }

    /// Current generation.
    pub fn generation(&self) -> Generation {
        Generation(self.read().generation)
    }

    /// Copy of the current state together with its generation.
    pub fn versioned(&self) -> (AuthState, Generation) {
        let inner = self.read();
        (inner.state.clone(), Generation(inner.generation))
    }

    /// Run `f` with the current access token under the write lock.
    ///
    /// Calls are serialized, so the last one to run always sees the latest
    /// write. Used to mirror the token into the transport.
    pub fn sync<R>(&self, f: impl FnOnce(Option<&str>) -> R) -> R {
        let inner = self.write();
        f(inner.state.access_token.as_deref())
    }

    pub fn access_token(&self) -> Option<String> {
        self.read().state.access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read().state.refresh_token.clone()
    }

    pub fn username(&self) -> Option<String> {
        self.read().state.username.clone()
    }

    pub fn role(&self) -> Option<String> {
        self.read().state.role.clone()
    }

    /// Whether an access token is held.
    pub fn is_authenticated(&self) -> bool {
        self.read().state.is_authenticated()
    }

    /// Replace the state unconditionally.
    pub fn set(&self, state: AuthState) {
        let mut inner = self.write();
        inner.state = state;
        inner.generation += 1;
    }

    /// Return to the empty state. Idempotent.
    pub fn reset(&self) {
        self.take();
    }

    /// Clear the state and return what it held.
    pub fn take(&self) -> AuthState {
        let mut inner = self.write();
        inner.generation += 1;
        std::mem::take(&mut inner.state)
    }

    /// Replace the state only if nothing was written since `generation`.
    pub fn replace_if(&self, generation: Generation, state: AuthState) -> bool {
        let mut inner = self.write();
        if inner.generation != generation.0 {
            return false;
        }
        inner.state = state;
        inner.generation += 1;
        true
    }

    /// Clear the state only if nothing was written since `generation`.
    pub fn clear_if(&self, generation: Generation) -> bool {
        let mut inner = self.write();
        if inner.generation != generation.0 {
            return false;
        }
        inner.state = AuthState::default();
        inner.generation += 1;
        true
    }
}

impl Default for AuthContext {
    fn default() -> Self {
        Self::new()
    }
}
