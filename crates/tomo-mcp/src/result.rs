//! Uniform outcome of one tool call.

use crate::error::{ErrorKind, McpError, McpResult};
use serde::Serialize;

/// Outcome of one tool call.
///
/// `data` is meaningful only when `success` is true, `error` (and `kind`)
/// only when it is false. Use [`ToolCallResult::ok`] / [`ToolCallResult::fail`]
/// to build one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCallResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub kind: Option<ErrorKind>,
}

impl<T> ToolCallResult<T> {
    /// A successful result.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            kind: None,
        }
    }

    /// A failed result with an explicit classification.
    pub fn fail(kind: ErrorKind, error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            kind: Some(kind),
        }
    }

    /// Whether the failure means the server wants a fresh credential.
    pub fn is_unauthorized(&self) -> bool {
        self.kind == Some(ErrorKind::Unauthorized)
    }

    /// Convert into a plain `Result`, losing the classification.
    pub fn into_result(self) -> Result<T, String> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(self
                .error
                .unwrap_or_else(|| "Tool call returned no data".to_string())),
        }
    }

    /// Map the success value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ToolCallResult<U> {
        ToolCallResult {
            success: self.success,
            data: self.data.map(f),
            error: self.error,
            kind: self.kind,
        }
    }
}

impl<T> ToolCallResult<T> {
    /// Feed the success value through a fallible conversion. Failures keep
    /// their message and classification.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> McpResult<U>) -> ToolCallResult<U> {
        match self.data {
            Some(data) if self.success => match f(data) {
                Ok(data) => ToolCallResult::ok(data),
                Err(e) => e.into(),
            },
            _ => ToolCallResult {
                success: false,
                data: None,
                error: self
                    .error
                    .or_else(|| Some("Tool call returned no data".to_string())),
                kind: self.kind,
            },
        }
    }
}

impl<T> From<McpError> for ToolCallResult<T> {
    fn from(err: McpError) -> Self {
        Self::fail(err.kind(), err.to_string())
    }
}
