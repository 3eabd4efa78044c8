//! Admin login.

use super::Credentials;
use crate::runner::Runtime;

/// Authenticate as admin and print the principal.
///
/// The session is revoked again when the runtime shuts down.
pub async fn handle_login(runtime: &Runtime<'_>, credentials: &Credentials) -> anyhow::Result<()> {
    authenticate(runtime, credentials).await?;
    let auth = &runtime.auth;
    println!(
        "Logged in as {} (role: {})",
        auth.get_username().unwrap_or_default(),
        auth.get_role().unwrap_or_default()
    );
    Ok(())
}

/// Authenticate as admin, turning policy and server errors into `anyhow`.
pub async fn authenticate(runtime: &Runtime<'_>, credentials: &Credentials) -> anyhow::Result<()> {
    runtime
        .auth
        .authenticate_admin(&credentials.username, &credentials.password)
        .await?;
    Ok(())
}
