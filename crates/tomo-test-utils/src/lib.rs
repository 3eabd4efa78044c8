//! Testing utilities, fixtures, and mocks for tomo.
//!
//! - **Mocks**: [`MockToolCaller`], a scripted stand-in for the tool client
//! - **Fixtures**: wire frames, login replies and temporary config files
//! - **Assertions**: helpers for checking [`tomo_mcp::ToolCallResult`]s
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use tomo_test_utils::{fixtures, MockToolCaller};
//!
//! #[tokio::test]
//! async fn test_login() {
//!     let caller = MockToolCaller::new()
//!         .with_ok("login", fixtures::login_grant("jwt-token-123456", None, "admin"));
//!     // Hand `Arc::new(caller)` to the code under test...
//! }
//! ```

pub mod assertions;
pub mod fixtures;
pub mod mocks;

// Re-export commonly used items
pub use fixtures::TestConfigDir;
pub use mocks::{CallGate, MockToolCaller, RecordedCall};
