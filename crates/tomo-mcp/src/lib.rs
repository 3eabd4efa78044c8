//! Tool Protocol client for the tomo control plane.
//!
//! Every remote operation the admin surfaces perform (listing servers,
//! installing Docker, locking accounts, logging in) is a named *tool* invoked
//! over an MCP-style JSON-RPC session.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌─────────────────┐     ┌──────────────────┐
//! │   ToolClient     │────▶│ SessionNegotiator│────▶│    Transport     │
//! │ call_tool, retry │     │ GET + initialize │     │ (SseTransport)   │
//! └──────────────────┘     └─────────────────┘     └──────────────────┘
//!          │                                                ▲
//!          └──────────── codec (encode / decode) ───────────┘
//! ```
//!
//! - The client connects lazily on the first call.
//! - An HTTP 400 on a call means the server forgot the session: the client
//!   renegotiates and replays the call exactly once.
//! - Replies are event streams; the `data:` line carries the JSON-RPC frame.
//! - `call_tool` never fails: errors come back as a failed [`ToolCallResult`].
//!
//! # Example
//!
//! ```no_run
//! use tomo_mcp::{ClientConfig, ToolCallResult, ToolClient};
//! use serde_json::{json, Value};
//!
//! # async fn example() -> tomo_mcp::McpResult<()> {
//! let client = ToolClient::new(ClientConfig::new("http://localhost:3000/mcp"))?;
//! let result: ToolCallResult<Value> = client.call_tool("list_servers", json!({})).await;
//! if result.success {
//!     println!("{}", result.data.unwrap_or_default());
//! }
//! # Ok(())
//! # }
//! ```

mod client;
pub mod codec;
mod config;
mod error;
pub mod protocol;
pub mod registry;
mod result;
pub mod retry;
mod session;
pub mod sse;
mod transport;

pub use client::{ConnectionState, ToolCaller, ToolClient};
pub use codec::{FrameContext, ToolPayload};
pub use config::{normalize_base_url, ClientConfig, DEFAULT_TIMEOUT};
pub use error::{ErrorKind, McpError, McpResult};
pub use registry::{close_client, get_client, init_client, ClientRegistry};
pub use result::ToolCallResult;
pub use retry::StaleSessionRetry;
pub use session::{Session, SessionNegotiator};
pub use sse::SseTransport;
pub use transport::{HttpReply, Transport, LEGACY_SESSION_HEADER, SESSION_HEADER};
