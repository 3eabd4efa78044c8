//! Per-process client registry.
//!
//! One [`ToolClient`] per base URL. `close_client` disconnects and discards
//! it so the next `init_client` starts fresh.

use crate::client::ToolClient;
use crate::config::{normalize_base_url, ClientConfig};
use crate::error::McpResult;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Holder of the active client.
#[derive(Default)]
pub struct ClientRegistry {
    slot: Mutex<Option<Arc<ToolClient>>>,
}

impl ClientRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<Arc<ToolClient>>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the client for `config.base_url`, creating it if needed.
    ///
    /// A client registered for a different URL is disconnected and replaced.
    /// If the new client cannot be built the registered one is left as is.
    pub fn init_client(&self, config: ClientConfig) -> McpResult<Arc<ToolClient>> {
        let mut slot = self.slot();
        if let Some(existing) = slot.as_ref() {
            if existing.base_url() == normalize_base_url(&config.base_url) {
                return Ok(existing.clone());
            }
        }

        let client = Arc::new(ToolClient::new(config)?);
        if let Some(old) = slot.replace(client.clone()) {
            debug!(old = %old.base_url(), new = %client.base_url(), "Replacing client");
            old.disconnect();
        }
        Ok(client)
    }

    /// Register an already-built client, replacing any existing one.
    pub fn install(&self, client: ToolClient) -> Arc<ToolClient> {
        let client = Arc::new(client);
        if let Some(old) = self.slot().replace(client.clone()) {
            old.disconnect();
        }
        client
    }

    /// The active client, if any.
    pub fn get_client(&self) -> Option<Arc<ToolClient>> {
        self.slot().clone()
    }

    /// Disconnect and discard the active client.
    pub fn close_client(&self) {
        if let Some(client) = self.slot().take() {
            client.disconnect();
        }
    }
}

static GLOBAL: ClientRegistry = ClientRegistry::new();

/// The process-wide registry.
pub fn global() -> &'static ClientRegistry {
    &GLOBAL
}

/// Initialize (or reuse) the process-wide client for `base_url`.
pub fn init_client(base_url: &str) -> McpResult<Arc<ToolClient>> {
    GLOBAL.init_client(ClientConfig::new(base_url))
}

/// The process-wide client, if initialized.
pub fn get_client() -> Option<Arc<ToolClient>> {
    GLOBAL.get_client()
}

/// Tear down the process-wide client.
pub fn close_client() {
    GLOBAL.close_client()
}
