//! Tool call encoding and event-stream response decoding.
//!
//! Responses arrive as an event-stream body:
//!
//! ```text
//! event: message
//! data: {"jsonrpc":"2.0","id":3,"result":{...}}
//! ```
//!
//! Decoding is independent of the HTTP client so it can be exercised with
//! literal string fixtures.

use crate::error::{McpError, McpResult};
use crate::protocol::{CallToolParams, JsonRpcRequest, JsonRpcResponse, METHOD_TOOLS_CALL};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::trace;

/// Prefix of the payload line in an event-stream frame.
const DATA_PREFIX: &str = "data:";

/// Which exchange a frame belongs to. Selects the format error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameContext {
    /// Reply to the `initialize` handshake.
    Initialization,
    /// Reply to a `tools/call` request.
    ToolCall,
}

impl FrameContext {
    fn format_error(self) -> McpError {
        match self {
            Self::Initialization => McpError::format("Invalid initialization response format"),
            Self::ToolCall => McpError::format("Invalid MCP response format"),
        }
    }
}

/// Build the `tools/call` request for one tool invocation.
///
/// The session id travels as a transport header, not in the envelope.
pub fn encode_call(id: u64, tool_name: &str, arguments: Value) -> McpResult<JsonRpcRequest> {
    let params = CallToolParams {
        name: tool_name.to_string(),
        arguments,
    };
    Ok(JsonRpcRequest::new(
        id,
        METHOD_TOOLS_CALL,
        Some(serde_json::to_value(params)?),
    ))
}

/// Locate the `data:` line of an event-stream body and parse its JSON-RPC
/// payload.
///
/// The first data line carrying a JSON-RPC response wins. A body without any
/// usable data line is a [`McpError::Format`].
pub fn decode_frame(raw: &str, context: FrameContext) -> McpResult<JsonRpcResponse> {
    for line in raw.lines() {
        let Some(data) = line.strip_prefix(DATA_PREFIX) else {
            continue;
        };
        let data = data.strip_prefix(' ').unwrap_or(data);
        match serde_json::from_str::<JsonRpcResponse>(data) {
            Ok(frame) => return Ok(frame),
            Err(e) => trace!(error = %e, "Skipping unparsable data line"),
        }
    }
    Err(context.format_error())
}

/// Successful tool output, by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolPayload {
    /// `result.structuredContent`, used verbatim.
    Structured(Value),
    /// `result.content[0].text`.
    Text(String),
    /// The whole `result` object.
    Raw(Value),
}

impl ToolPayload {
    /// Classify a `tools/call` result.
    ///
    /// Precedence: structured content, then the first text content item,
    /// then the raw result.
    pub fn from_result(result: Value) -> Self {
        let structured = result
            .get("structuredContent")
            .filter(|v| !v.is_null())
            .cloned();
        let text = result
            .get("content")
            .and_then(|content| content.get(0))
            .and_then(|first| first.get("text"))
            .and_then(Value::as_str)
            .map(str::to_owned);

        match (structured, text) {
            (Some(structured), _) => Self::Structured(structured),
            (None, Some(text)) => Self::Text(text),
            (None, None) => Self::Raw(result),
        }
    }

    /// The payload as an untyped JSON value.
    pub fn into_value(self) -> Value {
        match self {
            Self::Structured(value) | Self::Raw(value) => value,
            Self::Text(text) => Value::String(text),
        }
    }

    /// Deserialize the payload into `T`. See [`value_into_typed`].
    pub fn into_typed<T: DeserializeOwned>(self) -> McpResult<T> {
        value_into_typed(self.into_value())
    }
}

/// Deserialize a tool payload value into `T`.
///
/// String values are first offered as-is, then parsed as JSON text.
pub fn value_into_typed<T: DeserializeOwned>(value: Value) -> McpResult<T> {
    match value {
        Value::String(text) => serde_json::from_value(Value::String(text.clone()))
            .or_else(|_| serde_json::from_str(&text))
            .map_err(McpError::from),
        other => serde_json::from_value(other).map_err(McpError::from),
    }
}

/// Decode a `tools/call` reply body.
///
/// A JSON-RPC `error` member becomes [`McpError::Tool`] carrying the
/// server's message.
pub fn decode_tool_response(raw: &str) -> McpResult<ToolPayload> {
    let frame = decode_frame(raw, FrameContext::ToolCall)?;
    if let Some(error) = frame.error {
        return Err(McpError::tool(error.message));
    }
    Ok(ToolPayload::from_result(frame.result.unwrap_or(Value::Null)))
}
