//! Wires configuration into a tool client and an auth manager.

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tomo_auth::{AuthContext, AuthManager, LogoutReason, TokenPolicy};
use tomo_mcp::{ClientConfig, ClientRegistry, ToolClient};
use tomo_util::Config;
use tracing::{debug, warn};

/// Client name sent in the protocol handshake.
const CLIENT_NAME: &str = "tomo-cli";

/// How often the inactivity watch runs.
const INACTIVITY_CHECK_INTERVAL: Duration = Duration::from_secs(15);

/// Per-invocation state shared by the subcommands.
pub struct Runtime<'r> {
    registry: &'r ClientRegistry,
    pub client: Arc<ToolClient>,
    pub auth: Arc<AuthManager>,
    inactivity_watch: Option<JoinHandle<()>>,
}

/// Tool client settings derived from configuration.
pub fn client_config(config: &Config) -> ClientConfig {
    ClientConfig::new(config.server_url())
        .with_timeout(config.timeout())
        .with_client_info(CLIENT_NAME, env!("CARGO_PKG_VERSION"))
}

/// Token acceptance rules derived from configuration.
pub fn token_policy(config: &Config) -> TokenPolicy {
    TokenPolicy::default()
        .with_min_token_length(config.min_token_length())
        .with_admin_role(config.admin_role())
}

impl<'r> Runtime<'r> {
    pub fn new(config: &Config, registry: &'r ClientRegistry) -> anyhow::Result<Self> {
        let client = registry
            .init_client(client_config(config))
            .with_context(|| format!("Invalid server URL: {}", config.server_url()))?;

        let auth = Arc::new(
            AuthManager::new(client.clone(), Arc::new(AuthContext::new()))
                .with_policy(token_policy(config))
                .with_inactivity_timeout(config.inactivity_timeout()),
        );
        auth.set_force_logout_handler(Arc::new(|reason: LogoutReason| {
            warn!(%reason, "Session ended by the server or policy");
        }));
        let inactivity_watch = auth.spawn_inactivity_watch(INACTIVITY_CHECK_INTERVAL);

        Ok(Self {
            registry,
            client,
            auth,
            inactivity_watch,
        })
    }

    /// Log out if still authenticated and tear the client down.
    pub async fn shutdown(self) {
        if let Some(watch) = self.inactivity_watch {
            watch.abort();
        }
        if self.auth.is_authenticated() {
            debug!("Revoking session on exit");
            self.auth.revoke_token().await;
        }
        self.registry.close_client();
    }
}
