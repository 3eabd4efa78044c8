//! Streamable HTTP transport.
//!
//! - GET on the endpoint to obtain a session id (response header)
//! - POST for every JSON-RPC message, answered with an event stream

use crate::config::ClientConfig;
use crate::error::McpResult;
use crate::transport::{HttpReply, Transport, LEGACY_SESSION_HEADER, SESSION_HEADER};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use std::sync::{PoisonError, RwLock};
use tracing::{debug, trace};

const ACCEPT_EVENT_STREAM: &str = "application/json, text/event-stream";

/// HTTP transport speaking the event-stream framed Tool Protocol.
pub struct SseTransport {
    url: String,
    client: Client,
    auth_token: RwLock<Option<String>>,
}

impl SseTransport {
    /// Create a transport for the configured endpoint.
    pub fn new(config: &ClientConfig) -> McpResult<Self> {
        url::Url::parse(&config.base_url)?;

        let client = Client::builder().timeout(config.timeout).build()?;

        debug!(
            url = %config.base_url,
            timeout_ms = config.timeout.as_millis() as u64,
            "Created HTTP transport"
        );

        Ok(Self {
            url: config.base_url.clone(),
            client,
            auth_token: RwLock::new(None),
        })
    }

    /// Endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn bearer(&self) -> Option<String> {
        self.auth_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|token| format!("Bearer {token}"))
    }

    fn session_id_from(headers: &HeaderMap) -> Option<String> {
        [SESSION_HEADER, LEGACY_SESSION_HEADER]
            .iter()
            .filter_map(|name| headers.get(*name))
            .filter_map(|value| value.to_str().ok())
            .map(str::trim)
            .find(|value| !value.is_empty())
            .map(str::to_owned)
    }
}

#[async_trait]
impl Transport for SseTransport {
    async fn open_session(&self) -> McpResult<Option<String>> {
        let mut req = self.client.get(&self.url).header(ACCEPT, ACCEPT_EVENT_STREAM);
        if let Some(bearer) = self.bearer() {
            req = req.header(AUTHORIZATION, bearer);
        }

        let response = req.send().await?;
        debug!(status = response.status().as_u16(), "Session request answered");
        Ok(Self::session_id_from(response.headers()))
    }

    async fn post(&self, session_id: &str, body: String) -> McpResult<HttpReply> {
        trace!(body = %body, "Sending Tool Protocol message");

        let mut req = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, ACCEPT_EVENT_STREAM)
            .header(SESSION_HEADER, session_id)
            .body(body);
        if let Some(bearer) = self.bearer() {
            req = req.header(AUTHORIZATION, bearer);
        }

        let response = req.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        trace!(status, body = %body, "Received Tool Protocol reply");
        Ok(HttpReply { status, body })
    }

    fn set_auth_token(&self, token: Option<String>) {
        *self
            .auth_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = token;
    }
}
