//! Mock implementations for testing.
//!
//! [`MockToolCaller`] stands in for the tool client wherever code depends on
//! [`ToolCaller`], so auth flows can be driven without a server.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, Semaphore};
use tomo_mcp::{ErrorKind, ToolCallResult, ToolCaller};

/// Callback run on every call before the scripted reply is returned.
type InspectHook = Arc<dyn Fn(&str, &Value) + Send + Sync>;

/// A scripted [`ToolCaller`].
///
/// Replies are queued per tool and handed out in order. A call to a tool
/// with an empty queue fails with a [`ErrorKind::Tool`] error. Every call is
/// recorded, as is every bearer token pushed through
/// [`ToolCaller::set_auth_token`].
///
/// Clones share state, so keep one handle for inspection and give another to
/// the code under test.
///
/// # Example
///
/// ```rust
/// use serde_json::json;
/// use tomo_mcp::ToolCaller;
/// use tomo_test_utils::mocks::MockToolCaller;
///
/// # async fn example() {
/// let caller = MockToolCaller::new().with_ok("list_servers", json!({"servers": []}));
///
/// let result = caller.call_tool_raw("list_servers", json!({})).await;
/// assert!(result.success);
/// assert_eq!(caller.call_count("list_servers"), 1);
/// # }
/// ```
#[derive(Clone, Default)]
pub struct MockToolCaller {
    /// Queued replies (tool -> replies in order).
    replies: Arc<Mutex<HashMap<String, VecDeque<ToolCallResult<Value>>>>>,
    /// Recorded calls.
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    /// Every value passed to `set_auth_token`, oldest first.
    bearer_history: Arc<Mutex<Vec<Option<String>>>>,
    /// Gates holding calls in flight (tool -> gate).
    gates: Arc<Mutex<HashMap<String, Arc<CallGate>>>>,
    inspect: Arc<Mutex<Option<InspectHook>>>,
}

/// A recorded tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Tool name.
    pub tool: String,
    /// Arguments as sent.
    pub args: Value,
}

impl MockToolCaller {
    /// Create a mock with nothing scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for `tool`.
    pub fn with_reply(self, tool: &str, reply: ToolCallResult<Value>) -> Self {
        self.push_reply(tool, reply);
        self
    }

    /// Queue a successful reply for `tool`.
    pub fn with_ok(self, tool: &str, data: Value) -> Self {
        self.with_reply(tool, ToolCallResult::ok(data))
    }

    /// Queue a tool error for `tool`.
    pub fn with_error(self, tool: &str, message: &str) -> Self {
        self.with_reply(tool, ToolCallResult::fail(ErrorKind::Tool, message))
    }

    /// Queue an unauthorized (HTTP 401) failure for `tool`.
    pub fn with_unauthorized(self, tool: &str) -> Self {
        self.with_reply(
            tool,
            ToolCallResult::fail(ErrorKind::Unauthorized, "Authentication required"),
        )
    }

    /// Queue a reply after construction.
    pub fn push_reply(&self, tool: &str, reply: ToolCallResult<Value>) {
        self.replies
            .lock()
            .unwrap()
            .entry(tool.to_string())
            .or_default()
            .push_back(reply);
    }

    /// Run `hook` on every call, before the reply is produced.
    pub fn on_call(&self, hook: impl Fn(&str, &Value) + Send + Sync + 'static) {
        *self.inspect.lock().unwrap() = Some(Arc::new(hook));
    }

    /// Hold every call to `tool` until the returned gate is released.
    pub fn hold(&self, tool: &str) -> Arc<CallGate> {
        let gate = Arc::new(CallGate::new());
        self.gates
            .lock()
            .unwrap()
            .insert(tool.to_string(), gate.clone());
        gate
    }

    /// All recorded calls.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Recorded calls to `tool`.
    pub fn calls_to(&self, tool: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.tool == tool)
            .collect()
    }

    /// Number of calls to `tool`.
    pub fn call_count(&self, tool: &str) -> usize {
        self.calls_to(tool).len()
    }

    /// Bearer token most recently pushed, if any was ever pushed.
    pub fn bearer(&self) -> Option<String> {
        self.bearer_history.lock().unwrap().last().cloned().flatten()
    }

    /// Every value pushed through `set_auth_token`.
    pub fn bearer_history(&self) -> Vec<Option<String>> {
        self.bearer_history.lock().unwrap().clone()
    }

    fn next_reply(&self, tool: &str) -> ToolCallResult<Value> {
        self.replies
            .lock()
            .unwrap()
            .get_mut(tool)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                ToolCallResult::fail(
                    ErrorKind::Tool,
                    format!("No reply scripted for tool: {}", tool),
                )
            })
    }
}

#[async_trait]
impl ToolCaller for MockToolCaller {
    async fn call_tool_raw(&self, name: &str, args: Value) -> ToolCallResult<Value> {
        self.calls.lock().unwrap().push(RecordedCall {
            tool: name.to_string(),
            args: args.clone(),
        });

        let hook = self.inspect.lock().unwrap().clone();
        if let Some(hook) = hook {
            hook(name, &args);
        }

        let gate = self.gates.lock().unwrap().get(name).cloned();
        if let Some(gate) = gate {
            gate.pass().await;
        }

        self.next_reply(name)
    }

    fn set_auth_token(&self, token: Option<String>) {
        self.bearer_history.lock().unwrap().push(token);
    }
}

/// Holds calls in flight until released.
pub struct CallGate {
    entered: Notify,
    open: Semaphore,
}

impl CallGate {
    fn new() -> Self {
        Self {
            entered: Notify::new(),
            open: Semaphore::new(0),
        }
    }

    async fn pass(&self) {
        self.entered.notify_one();
        // Closing the semaphore is the release signal.
        let _ = self.open.acquire().await;
    }

    /// Wait until a call has reached the gate.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Let held and future calls through.
    pub fn release(&self) {
        self.open.close();
    }
}
