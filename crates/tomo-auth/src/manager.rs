//! Authentication and token lifecycle on top of a [`ToolCaller`].

use crate::error::{AuthError, AuthResult};
use crate::hooks::{ForceLogoutHandler, LogoutReason, SessionHooks, TokenRefresher};
use crate::state::{AuthContext, AuthState, Generation};
use crate::token::{SessionGrant, TokenPolicy};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tomo_mcp::codec::value_into_typed;
use tomo_mcp::{ToolCallResult, ToolCaller};
use tracing::{debug, info, warn};

/// Tool that exchanges credentials for a session.
pub const LOGIN_TOOL: &str = "login";
/// Tool that exchanges a refresh token for a new session.
pub const REFRESH_TOOL: &str = "refresh_token";
/// Tool that invalidates a token server-side.
pub const REVOKE_TOOL: &str = "revoke_token";

type InflightRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

/// How a refresh attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefreshOutcome {
    Refreshed,
    /// The refresh failed and the context was cleared.
    Failed,
    /// The context changed while the refresh was in flight and was left alone.
    Superseded,
}

/// Owns the login, refresh and logout flows for one [`AuthContext`].
///
/// All public operations report failure through their return value and never
/// panic. Any failure on the refresh path leaves the context empty.
pub struct AuthManager {
    caller: Arc<dyn ToolCaller>,
    context: Arc<AuthContext>,
    policy: TokenPolicy,
    inflight: Mutex<Option<InflightRefresh>>,
    hooks: RwLock<SessionHooks>,
    last_activity: Mutex<Instant>,
    inactivity_timeout: Option<Duration>,
}

impl AuthManager {
    pub fn new(caller: Arc<dyn ToolCaller>, context: Arc<AuthContext>) -> Self {
        Self {
            caller,
            context,
            policy: TokenPolicy::default(),
            inflight: Mutex::new(None),
            hooks: RwLock::new(SessionHooks::default()),
            last_activity: Mutex::new(Instant::now()),
            inactivity_timeout: None,
        }
    }

    pub fn with_policy(mut self, policy: TokenPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// End idle sessions after `timeout`. `None` disables the check.
    pub fn with_inactivity_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.inactivity_timeout = timeout;
        self
    }

    pub fn context(&self) -> &Arc<AuthContext> {
        &self.context
    }

    pub fn policy(&self) -> &TokenPolicy {
        &self.policy
    }

    /// Replace the refresher used when a call comes back unauthorized.
    /// Defaults to [`AuthManager::refresh_auth_token`].
    pub fn set_token_refresher(&self, refresher: TokenRefresher) {
        self.hooks_mut().refresher = Some(refresher);
    }

    /// Register the callback fired when a session is ended by policy.
    pub fn set_force_logout_handler(&self, handler: ForceLogoutHandler) {
        self.hooks_mut().force_logout = Some(handler);
    }

    fn hooks(&self) -> SessionHooks {
        self.hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn hooks_mut(&self) -> std::sync::RwLockWriteGuard<'_, SessionHooks> {
        self.hooks.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn inflight(&self) -> MutexGuard<'_, Option<InflightRefresh>> {
        self.inflight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn touch(&self) {
        *self
            .last_activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.last_activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
    }

    /// Log in through the `login` tool and require the privileged role.
    ///
    /// On any failure the context is left untouched.
    pub async fn authenticate_admin(&self, username: &str, password: &str) -> AuthResult<()> {
        let reply = self
            .caller
            .call_tool_raw(
                LOGIN_TOOL,
                json!({ "username": username, "password": password }),
            )
            .await;
        let payload = reply.into_result().map_err(AuthError::Tool)?;
        let grant = SessionGrant::from_payload(LOGIN_TOOL, payload)?;

        if !self.policy.is_admin(grant.role()) {
            warn!(username, role = ?grant.role(), "Rejected non-admin login");
            return Err(AuthError::NotAdmin);
        }
        let token = self.policy.validate(grant.token.as_deref())?;

        self.context.set(AuthState::authenticated(
            token.to_string(),
            grant.refresh_token().map(str::to_owned),
            grant
                .username()
                .map(str::to_owned)
                .or_else(|| Some(username.to_string())),
            grant.role().map(str::to_owned),
        ));
        sync_bearer(&self.context, self.caller.as_ref());
        self.touch();
        info!(username, "Authenticated");
        Ok(())
    }

    pub fn get_auth_token(&self) -> Option<String> {
        self.context.access_token()
    }

    pub fn get_refresh_token(&self) -> Option<String> {
        self.context.refresh_token()
    }

    pub fn get_username(&self) -> Option<String> {
        self.context.username()
    }

    pub fn get_role(&self) -> Option<String> {
        self.context.role()
    }

    pub fn is_authenticated(&self) -> bool {
        self.context.is_authenticated()
    }

    pub fn is_admin(&self) -> bool {
        self.is_authenticated() && self.policy.is_admin(self.context.role().as_deref())
    }

    /// Forget the current principal. Idempotent.
    pub fn clear_auth(&self) {
        self.context.reset();
        sync_bearer(&self.context, self.caller.as_ref());
    }

    /// Log out: clear local state, then revoke both tokens server-side.
    ///
    /// Local state is gone before the first network call is issued.
    /// Revocation failures are logged and otherwise ignored.
    pub async fn revoke_token(&self) {
        if !self.context.is_authenticated() {
            debug!("No session to revoke");
            return;
        }
        let previous = self.context.take();
        sync_bearer(&self.context, self.caller.as_ref());

        if let Some(token) = previous.access_token {
            let reply = self
                .caller
                .call_tool_raw(REVOKE_TOOL, json!({ "token": token }))
                .await;
            if !reply.success {
                warn!(error = ?reply.error, "Failed to revoke access token");
            }
        }
        if let Some(token) = previous.refresh_token {
            let reply = self
                .caller
                .call_tool_raw(
                    REVOKE_TOOL,
                    json!({ "token": token, "token_type": "refresh" }),
                )
                .await;
            if !reply.success {
                warn!(error = ?reply.error, "Failed to revoke refresh token");
            }
        }
    }

    /// Exchange the refresh token for a new session.
    ///
    /// Concurrent callers share one `refresh_token` call and its outcome.
    /// Returns false, with the context cleared, when there is no refresh
    /// token or the refresh fails. Returns false without touching the
    /// context when it changed while the call was in flight.
    pub async fn refresh_auth_token(&self) -> bool {
        self.refresh().await == RefreshOutcome::Refreshed
    }

    async fn refresh(&self) -> RefreshOutcome {
        let refresh = {
            let mut slot = self.inflight();
            let pending = slot.as_ref().filter(|f| f.peek().is_none()).cloned();
            match pending {
                Some(pending) => {
                    debug!("Joining in-flight token refresh");
                    pending
                }
                None => {
                    let (state, generation) = self.context.versioned();
                    let Some(refresh_token) = state.refresh_token.clone() else {
                        drop(slot);
                        debug!("No refresh token; clearing auth");
                        self.clear_auth();
                        return RefreshOutcome::Failed;
                    };
                    let refresh = RefreshTask {
                        caller: self.caller.clone(),
                        context: self.context.clone(),
                        policy: self.policy.clone(),
                        previous: state,
                        refresh_token,
                        generation,
                    }
                    .run()
                    .boxed()
                    .shared();
                    *slot = Some(refresh.clone());
                    refresh
                }
            }
        };

        let outcome = refresh.clone().await;

        let mut slot = self.inflight();
        if slot.as_ref().is_some_and(|f| f.ptr_eq(&refresh)) {
            *slot = None;
        }
        outcome
    }

    /// Call a tool with the current credential and decode its payload.
    ///
    /// An unauthorized reply triggers one refresh. If it succeeds the call is
    /// retried once; otherwise auth is cleared and the force-logout handler
    /// is told the session expired. A session written by someone else in the
    /// meantime (a new login or a logout) is left alone and no logout fires.
    pub async fn call_tool<T: DeserializeOwned>(&self, name: &str, args: Value) -> ToolCallResult<T> {
        self.touch();
        let generation = self.context.generation();
        let reply = self.caller.call_tool_raw(name, args.clone()).await;
        if !reply.is_unauthorized() {
            return typed(reply);
        }

        debug!(tool = name, "Call unauthorized; refreshing token");
        let hooks = self.hooks();
        let outcome = match &hooks.refresher {
            Some(refresher) if refresher().await => RefreshOutcome::Refreshed,
            Some(_) => self.expire_if(generation),
            None => self.refresh().await,
        };

        let reply = match outcome {
            RefreshOutcome::Refreshed => {
                let generation = self.context.generation();
                let retry = self.caller.call_tool_raw(name, args).await;
                if !retry.is_unauthorized() {
                    return typed(retry);
                }
                if self.expire_if(generation) == RefreshOutcome::Superseded {
                    return typed(retry);
                }
                retry
            }
            RefreshOutcome::Failed => reply,
            RefreshOutcome::Superseded => {
                debug!(tool = name, "Session replaced during refresh; not logging out");
                return typed(reply);
            }
        };

        warn!(tool = name, "Credential rejected; session ended");
        hooks.fire_logout(LogoutReason::SessionExpired);
        typed(reply)
    }

    /// Clear auth unless it was written since `generation`.
    fn expire_if(&self, generation: Generation) -> RefreshOutcome {
        if self.context.clear_if(generation) {
            sync_bearer(&self.context, self.caller.as_ref());
            RefreshOutcome::Failed
        } else {
            RefreshOutcome::Superseded
        }
    }

    /// End the session if it has been idle longer than the inactivity
    /// timeout. Returns whether it did.
    pub fn check_inactivity(&self) -> bool {
        let Some(timeout) = self.inactivity_timeout else {
            return false;
        };
        if !self.is_authenticated() || self.idle_for() <= timeout {
            return false;
        }
        info!(idle_secs = self.idle_for().as_secs(), "Session idle; logging out");
        self.clear_auth();
        self.hooks().fire_logout(LogoutReason::Inactivity);
        true
    }

    /// Run [`AuthManager::check_inactivity`] every `interval` until the
    /// manager is dropped. `None` when no inactivity timeout is configured.
    pub fn spawn_inactivity_watch(self: &Arc<Self>, interval: Duration) -> Option<JoinHandle<()>> {
        if self.inactivity_timeout.is_none() {
            return None;
        }
        let manager: Weak<Self> = Arc::downgrade(self);
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(manager) = manager.upgrade() else {
                    break;
                };
                manager.check_inactivity();
            }
        }))
    }
}

/// Mirror the context's access token into the caller's bearer header.
fn sync_bearer(context: &AuthContext, caller: &dyn ToolCaller) {
    context.sync(|token| caller.set_auth_token(token.map(str::to_owned)));
}

fn typed<T: DeserializeOwned>(reply: ToolCallResult<Value>) -> ToolCallResult<T> {
    reply.and_then(value_into_typed)
}

/// One `refresh_token` round trip. Owns everything it needs so it can be
/// shared between callers.
struct RefreshTask {
    caller: Arc<dyn ToolCaller>,
    context: Arc<AuthContext>,
    policy: TokenPolicy,
    previous: AuthState,
    refresh_token: String,
    generation: Generation,
}

impl RefreshTask {
    async fn run(self) -> RefreshOutcome {
        let reply = self
            .caller
            .call_tool_raw(REFRESH_TOOL, json!({ "refresh_token": self.refresh_token }))
            .await;

        let state = match self.next_state(reply) {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "Token refresh failed");
                if self.context.clear_if(self.generation) {
                    sync_bearer(&self.context, self.caller.as_ref());
                    return RefreshOutcome::Failed;
                }
                warn!("Auth state changed during refresh; leaving it alone");
                return RefreshOutcome::Superseded;
            }
        };

        if !self.context.replace_if(self.generation, state) {
            warn!("Auth state changed during refresh; discarding new tokens");
            return RefreshOutcome::Superseded;
        }
        sync_bearer(&self.context, self.caller.as_ref());
        info!("Token refreshed");
        RefreshOutcome::Refreshed
    }

    fn next_state(&self, reply: ToolCallResult<Value>) -> AuthResult<AuthState> {
        let payload = reply.into_result().map_err(AuthError::Tool)?;
        let grant = SessionGrant::from_payload(REFRESH_TOOL, payload)?;
        let token = self.policy.validate(grant.token.as_deref())?;
        let previous = &self.previous;
        Ok(AuthState::authenticated(
            token.to_string(),
            grant
                .refresh_token()
                .map(str::to_owned)
                .or_else(|| previous.refresh_token.clone()),
            grant
                .username()
                .map(str::to_owned)
                .or_else(|| previous.username.clone()),
            grant
                .role()
                .map(str::to_owned)
                .or_else(|| previous.role.clone()),
        ))
    }
}

impl std::fmt::Debug for AuthManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthManager")
            .field("state", &self.context.snapshot())
            .field("policy", &self.policy)
            .field("inactivity_timeout", &self.inactivity_timeout)
            .finish_non_exhaustive()
    }
}
