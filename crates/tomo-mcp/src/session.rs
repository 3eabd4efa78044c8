//! Session negotiation.
//!
//! The handshake is:
//! 1. GET the endpoint and read the session id header
//! 2. POST `initialize` over that session, expect one JSON-RPC success frame
//! 3. POST `notifications/initialized` (reply ignored)

use crate::codec::{decode_frame, FrameContext};
use crate::error::{McpError, McpResult};
use crate::protocol::{
    InitializeParams, JsonRpcNotification, JsonRpcRequest, METHOD_INITIALIZE, METHOD_INITIALIZED,
};
use crate::transport::Transport;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A negotiated session.
///
/// Owned by exactly one client; callers never see the identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub(crate) id: String,
    pub base_url: String,
    pub timeout: Duration,
    pub connected: bool,
}

impl Session {
    /// The opaque server-issued identifier.
    pub(crate) fn id(&self) -> &str {
        &self.id
    }
}

/// Performs the session handshake over a transport. Does not retry.
pub struct SessionNegotiator<'a> {
    transport: &'a dyn Transport,
    params: &'a InitializeParams,
}

impl<'a> SessionNegotiator<'a> {
    pub fn new(transport: &'a dyn Transport, params: &'a InitializeParams) -> Self {
        Self { transport, params }
    }

    /// Run the full handshake. `request_id` identifies the `initialize`
    /// request.
    pub async fn negotiate(
        &self,
        request_id: u64,
        base_url: &str,
        timeout: Duration,
    ) -> McpResult<Session> {
        let session_id = self
            .transport
            .open_session()
            .await?
            .ok_or(McpError::Session)?;
        debug!("Obtained session id");

        let request = JsonRpcRequest::new(
            request_id,
            METHOD_INITIALIZE,
            Some(serde_json::to_value(self.params)?),
        );
        let reply = self
            .transport
            .post(&session_id, serde_json::to_string(&request)?)
            .await?;

        if !reply.is_success() {
            return Err(McpError::initialization(format!(
                "Initialization failed: {}",
                reply.status
            )));
        }

        let frame = decode_frame(&reply.body, FrameContext::Initialization)?;
        if let Some(error) = frame.error {
            return Err(McpError::initialization(error.message));
        }

        let notification = JsonRpcNotification::new(METHOD_INITIALIZED, None);
        match self
            .transport
            .post(&session_id, serde_json::to_string(&notification)?)
            .await
        {
            Ok(reply) if !reply.is_success() => {
                warn!(status = reply.status, "Initialized notification not accepted");
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Failed to send initialized notification"),
        }

        info!(url = %base_url, "Tool Protocol session established");
        Ok(Session {
            id: session_id,
            base_url: base_url.to_string(),
            timeout,
            connected: true,
        })
    }
}
