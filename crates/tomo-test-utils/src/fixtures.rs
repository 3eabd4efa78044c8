//! Test fixtures: wire frames, tool replies and configuration files.

use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Wrap a JSON-RPC payload in an event-stream frame.
pub fn sse_frame(payload: &Value) -> String {
    format!("event: message\ndata: {}\n\n", payload)
}

/// Event-stream frame carrying a successful JSON-RPC response.
pub fn result_frame(id: u64, result: Value) -> String {
    sse_frame(&json!({"jsonrpc": "2.0", "id": id, "result": result}))
}

/// Event-stream frame carrying a JSON-RPC error.
pub fn error_frame(id: u64, code: i64, message: &str) -> String {
    sse_frame(&json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {"code": code, "message": message}
    }))
}

/// A `tools/call` result whose payload sits in `structuredContent`.
pub fn structured_result(data: Value) -> Value {
    json!({
        "content": [{"type": "text", "text": data.to_string()}],
        "structuredContent": data
    })
}

/// A `tools/call` result with a single text item.
pub fn text_result(text: &str) -> Value {
    json!({"content": [{"type": "text", "text": text}]})
}

/// Reply of the `login` tool.
pub fn login_grant(token: &str, refresh_token: Option<&str>, role: &str) -> Value {
    let mut grant = json!({
        "token": token,
        "user": {"username": "root", "role": role}
    });
    if let Some(refresh) = refresh_token {
        grant["refresh_token"] = json!(refresh);
    }
    grant
}

/// Reply of the `refresh_token` tool.
pub fn refresh_grant(token: &str, refresh_token: Option<&str>) -> Value {
    let mut grant = json!({"token": token});
    if let Some(refresh) = refresh_token {
        grant["refresh_token"] = json!(refresh);
    }
    grant
}

/// A temporary directory holding tomo configuration files.
///
/// Removed when dropped.
///
/// # Example
///
/// ```rust
/// use tomo_test_utils::fixtures::TestConfigDir;
///
/// let dir = TestConfigDir::new();
/// let path = dir.write("config.json", r#"{"logLevel": "debug"}"#);
/// assert!(path.exists());
/// ```
pub struct TestConfigDir {
    temp_dir: TempDir,
}

impl TestConfigDir {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// Root of the directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write `contents` to `name` (relative), creating parents.
    pub fn write(&self, name: impl AsRef<Path>, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&path, contents).expect("Failed to write file");
        path
    }
}

impl Default for TestConfigDir {
    fn default() -> Self {
        Self::new()
    }
}

/// Sample configuration documents.
pub mod configs {
    /// A complete config file.
    pub fn full(url: &str) -> String {
        format!(
            r#"{{
    "server": {{ "url": "{url}", "timeoutMs": 5000 }},
    "auth": {{ "minTokenLength": 16, "adminRole": "admin", "inactivityTimeoutSecs": 900 }},
    "logLevel": "debug"
}}"#
        )
    }

    /// A config file setting only the server URL.
    pub fn url_only(url: &str) -> String {
        format!(r#"{{ "server": {{ "url": "{url}" }} }}"#)
    }
}
