//! Assertion helpers for tool call outcomes.

use std::fmt::Debug;
use tomo_mcp::ToolCallResult;

/// Assert that a call succeeded and return its data.
pub fn assert_tool_ok<T: Debug>(result: ToolCallResult<T>) -> T {
    assert!(
        result.success,
        "Expected tool call to succeed, got error: {:?}",
        result.error
    );
    result
        .data
        .unwrap_or_else(|| panic!("Successful tool call carried no data"))
}

/// Assert that a call failed with exactly `expected` as its message.
pub fn assert_tool_failed<T: Debug>(result: &ToolCallResult<T>, expected: &str) {
    assert!(
        !result.success,
        "Expected tool call to fail with {:?}, got data: {:?}",
        expected, result.data
    );
    assert_eq!(
        result.error.as_deref(),
        Some(expected),
        "Tool call failed with an unexpected message"
    );
}
