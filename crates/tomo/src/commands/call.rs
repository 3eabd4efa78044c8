//! Invoke a named tool as admin.

use super::{authenticate, Credentials};
use crate::runner::Runtime;
use anyhow::{bail, Context};
use serde_json::Value;

/// Parse the `--args` value. Must be a JSON object; absent means `{}`.
pub fn parse_tool_args(raw: Option<&str>) -> anyhow::Result<Value> {
    let Some(raw) = raw else {
        return Ok(Value::Object(Default::default()));
    };
    let value: Value = serde_json::from_str(raw).context("--args is not valid JSON")?;
    if !value.is_object() {
        bail!("--args must be a JSON object");
    }
    Ok(value)
}

/// Authenticate, call `tool` and print its payload as JSON.
pub async fn handle_call(
    runtime: &Runtime<'_>,
    credentials: &Credentials,
    tool: &str,
    args: Option<&str>,
) -> anyhow::Result<()> {
    let args = parse_tool_args(args)?;
    authenticate(runtime, credentials).await?;

    let result = runtime.auth.call_tool::<Value>(tool, args).await;
    match result.into_result() {
        Ok(data) => {
            println!("{}", serde_json::to_string_pretty(&data)?);
            Ok(())
        }
        Err(message) => bail!("{tool} failed: {message}"),
    }
}
