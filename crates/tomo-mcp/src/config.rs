//! Client configuration.

use crate::protocol::ClientInfo;
use std::time::Duration;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for one [`ToolClient`](crate::ToolClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Endpoint URL, without trailing slash.
    pub base_url: String,
    /// Timeout applied to every HTTP request.
    pub timeout: Duration,
    /// Identity announced during the handshake.
    pub client_info: ClientInfo,
}

impl ClientConfig {
    /// Create a config for the given endpoint. Trailing slashes are stripped.
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self {
            base_url: normalize_base_url(base_url.as_ref()),
            timeout: DEFAULT_TIMEOUT,
            client_info: ClientInfo::default(),
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the client identity announced during the handshake.
    pub fn with_client_info(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.client_info = ClientInfo {
            name: name.into(),
            version: version.into(),
        };
        self
    }
}

/// Strip surrounding whitespace and trailing slashes from a base URL.
pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_stripped() {
        let config = ClientConfig::new("http://localhost:3000/mcp/");
        assert_eq!(config.base_url, "http://localhost:3000/mcp");

        let config = ClientConfig::new("http://localhost:3000//");
        assert_eq!(config.base_url, "http://localhost:3000");
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("http://localhost:3000");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.client_info.name, "tomo-cli");
    }

    #[test]
    fn test_builders() {
        let config = ClientConfig::new("http://localhost:3000")
            .with_timeout(Duration::from_millis(500))
            .with_client_info("tomo-web", "2.0.0");
        assert_eq!(config.timeout, Duration::from_millis(500));
        assert_eq!(config.client_info.name, "tomo-web");
        assert_eq!(config.client_info.version, "2.0.0");
    }
}
