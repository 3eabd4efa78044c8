//! Session check against the control plane.

use crate::runner::Runtime;

/// Negotiate a session and report the outcome.
pub async fn handle_ping(runtime: &Runtime<'_>) -> anyhow::Result<()> {
    runtime.client.connect().await?;
    println!("Connected to {}", runtime.client.base_url());
    Ok(())
}
