//! Tool Protocol client.

use crate::codec::{decode_tool_response, encode_call, ToolPayload};
use crate::config::ClientConfig;
use crate::error::{McpError, McpResult};
use crate::protocol::InitializeParams;
use crate::result::ToolCallResult;
use crate::retry::StaleSessionRetry;
use crate::session::{Session, SessionNegotiator};
use crate::sse::SseTransport;
use crate::transport::Transport;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// HTTP status meaning the bearer token was rejected.
const UNAUTHORIZED_STATUS: u16 = 401;

/// Connection state of a [`ToolClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Anything that can issue named tool calls.
///
/// The auth layer depends on this rather than on [`ToolClient`] directly.
#[async_trait]
pub trait ToolCaller: Send + Sync {
    /// Call a tool and return its payload as untyped JSON. Never fails.
    async fn call_tool_raw(&self, name: &str, args: Value) -> ToolCallResult<Value>;

    /// Set or clear the bearer token attached to subsequent calls.
    fn set_auth_token(&self, _token: Option<String>) {}
}

/// Session-oriented client for the control plane's Tool Protocol endpoint.
///
/// Connects lazily on the first call and transparently renegotiates once
/// when the server reports the session as stale. Every public call resolves
/// to a [`ToolCallResult`]; errors never escape.
pub struct ToolClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    init_params: InitializeParams,
    retry: StaleSessionRetry,
    session: Mutex<Option<Session>>,
    /// Serializes negotiation so concurrent first calls share one session.
    connect_lock: tokio::sync::Mutex<()>,
    connecting: AtomicBool,
    next_id: AtomicU64,
}

impl ToolClient {
    /// Create a client speaking HTTP to the configured endpoint.
    pub fn new(config: ClientConfig) -> McpResult<Self> {
        let transport = Arc::new(SseTransport::new(&config)?);
        Ok(Self::with_transport(config, transport))
    }

    /// Create a client over an explicit transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let init_params = InitializeParams::new(config.client_info.clone());
        Self {
            config,
            transport,
            init_params,
            retry: StaleSessionRetry::default(),
            session: Mutex::new(None),
            connect_lock: tokio::sync::Mutex::new(()),
            connecting: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
        }
    }

    /// Replace the stale-session retry policy.
    pub fn with_retry_policy(mut self, retry: StaleSessionRetry) -> Self {
        self.retry = retry;
        self
    }

    /// Client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Endpoint URL.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn next_request_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn session_slot(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_session_id(&self) -> Option<String> {
        self.session_slot().as_ref().map(|s| s.id().to_string())
    }

    /// Whether a session is currently established. No I/O.
    pub fn is_connected(&self) -> bool {
        self.session_slot().as_ref().is_some_and(|s| s.connected)
    }

    /// Current connection state. No I/O.
    pub fn state(&self) -> ConnectionState {
        if self.is_connected() {
            ConnectionState::Connected
        } else if self.connecting.load(Ordering::SeqCst) {
            ConnectionState::Connecting
        } else {
            ConnectionState::Disconnected
        }
    }

    /// Negotiate a session unless one is already established.
    ///
    /// Failures leave the client disconnected; the next call tries again.
    pub async fn connect(&self) -> McpResult<()> {
        let _guard = self.connect_lock.lock().await;
        if self.is_connected() {
            return Ok(());
        }

        self.connecting.store(true, Ordering::SeqCst);
        let result = SessionNegotiator::new(self.transport.as_ref(), &self.init_params)
            .negotiate(
                self.next_request_id(),
                &self.config.base_url,
                self.config.timeout,
            )
            .await;
        self.connecting.store(false, Ordering::SeqCst);

        match result {
            Ok(session) => {
                *self.session_slot() = Some(session);
                Ok(())
            }
            Err(e) => {
                warn!(url = %self.config.base_url, error = %e, "Failed to establish session");
                Err(e)
            }
        }
    }

    /// Drop the current session. Idempotent.
    pub fn disconnect(&self) {
        if self.session_slot().take().is_some() {
            info!(url = %self.config.base_url, "Tool Protocol session closed");
        }
    }

    /// Discard the session only if it is still the one that went stale, so
    /// concurrent callers hitting the same stale session renegotiate once.
    fn invalidate(&self, stale_id: &str) {
        let mut slot = self.session_slot();
        if slot.as_ref().is_some_and(|s| s.id() == stale_id) {
            *slot = None;
        }
    }

    async fn ensure_session(&self) -> McpResult<String> {
        if let Some(id) = self.current_session_id() {
            return Ok(id);
        }
        self.connect().await?;
        self.current_session_id().ok_or(McpError::Session)
    }

    async fn try_call(&self, name: &str, args: Value) -> McpResult<ToolPayload> {
        if name.trim().is_empty() {
            return Err(McpError::tool("Tool name must not be empty"));
        }
        let args = if args.is_null() {
            Value::Object(Default::default())
        } else {
            args
        };

        let mut session_id = self.ensure_session().await?;
        let mut attempt = 0;
        loop {
            let request = encode_call(self.next_request_id(), name, args.clone())?;
            debug!(tool = name, id = request.id, attempt, "Calling tool");

            let reply = self
                .transport
                .post(&session_id, serde_json::to_string(&request)?)
                .await?;

            if self.retry.should_retry(reply.status, attempt) {
                warn!(tool = name, status = reply.status, "Session rejected, renegotiating");
                self.invalidate(&session_id);
                session_id = self.ensure_session().await?;
                attempt += 1;
                continue;
            }
            if reply.status == UNAUTHORIZED_STATUS {
                return Err(McpError::AuthRequired);
            }
            if !reply.is_success() {
                return Err(McpError::Call {
                    status: reply.status,
                });
            }
            return decode_tool_response(&reply.body);
        }
    }

    /// Call a tool and deserialize its payload into `T`.
    pub async fn call_tool<T: DeserializeOwned>(
        &self,
        name: &str,
        args: Value,
    ) -> ToolCallResult<T> {
        match self
            .try_call(name, args)
            .await
            .and_then(ToolPayload::into_typed)
        {
            Ok(data) => ToolCallResult::ok(data),
            Err(e) => {
                warn!(tool = name, error = %e, "Tool call failed");
                e.into()
            }
        }
    }

    /// Call a tool and return its payload as untyped JSON.
    pub async fn call_tool_raw(&self, name: &str, args: Value) -> ToolCallResult<Value> {
        match self.try_call(name, args).await {
            Ok(payload) => ToolCallResult::ok(payload.into_value()),
            Err(e) => {
                warn!(tool = name, error = %e, "Tool call failed");
                e.into()
            }
        }
    }

    /// Set or clear the bearer token sent with every request.
    pub fn set_auth_token(&self, token: Option<String>) {
        self.transport.set_auth_token(token);
    }
}

#[async_trait]
impl ToolCaller for ToolClient {
    async fn call_tool_raw(&self, name: &str, args: Value) -> ToolCallResult<Value> {
        ToolClient::call_tool_raw(self, name, args).await
    }

    fn set_auth_token(&self, token: Option<String>) {
        ToolClient::set_auth_token(self, token);
    }
}
