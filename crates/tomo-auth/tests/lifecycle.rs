//! Auth lifecycle tests against a scripted tool caller.

use futures::FutureExt;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tomo_auth::{AuthContext, AuthError, AuthManager, LogoutReason, TokenPolicy};
use tomo_test_utils::assertions::{assert_tool_failed, assert_tool_ok};
use tomo_test_utils::fixtures::{login_grant, refresh_grant};
use tomo_test_utils::MockToolCaller;

const TOKEN: &str = "jwt-token-123456789";
const REFRESH: &str = "refresh-token-123456789";
const NEW_TOKEN: &str = "jwt-token-refreshed-987654";

fn manager(caller: &MockToolCaller) -> AuthManager {
    AuthManager::new(Arc::new(caller.clone()), Arc::new(AuthContext::new()))
}

fn logout_recorder(auth: &AuthManager) -> Arc<Mutex<Vec<LogoutReason>>> {
    let reasons = Arc::new(Mutex::new(Vec::new()));
    let sink = reasons.clone();
    auth.set_force_logout_handler(Arc::new(move |reason: LogoutReason| {
        sink.lock().unwrap().push(reason)
    }));
    reasons
}

async fn logged_in(caller: &MockToolCaller) -> AuthManager {
    caller.push_reply(
        "login",
        tomo_mcp::ToolCallResult::ok(login_grant(TOKEN, Some(REFRESH), "admin")),
    );
    let auth = manager(caller);
    auth.authenticate_admin("root", "hunter22").await.unwrap();
    auth
}

#[tokio::test]
async fn test_admin_login_populates_state() {
    let caller = MockToolCaller::new();
    let auth = logged_in(&caller).await;

    assert_eq!(auth.get_auth_token().as_deref(), Some(TOKEN));
    assert_eq!(auth.get_refresh_token().as_deref(), Some(REFRESH));
    assert_eq!(auth.get_username().as_deref(), Some("root"));
    assert_eq!(auth.get_role().as_deref(), Some("admin"));
    assert!(auth.is_admin());
    assert_eq!(caller.bearer().as_deref(), Some(TOKEN));

    let login = &caller.calls_to("login")[0];
    assert_eq!(
        login.args,
        json!({"username": "root", "password": "hunter22"})
    );
}

#[tokio::test]
async fn test_non_admin_role_is_rejected() {
    let caller = MockToolCaller::new().with_ok("login", login_grant(TOKEN, Some(REFRESH), "user"));
    let auth = manager(&caller);

    let err = auth.authenticate_admin("user", "pw").await.unwrap_err();
    assert_eq!(err, AuthError::NotAdmin);
    assert_eq!(err.to_string(), "Only admin users can run CLI commands");
    assert!(auth.get_auth_token().is_none());
    assert!(auth.get_refresh_token().is_none());
    assert!(caller.bearer_history().is_empty());
}

#[tokio::test]
async fn test_short_token_is_rejected() {
    let caller = MockToolCaller::new().with_ok("login", login_grant("short", Some(REFRESH), "admin"));
    let auth = manager(&caller);

    let err = auth.authenticate_admin("root", "pw").await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid token received from server");
    assert!(!auth.is_authenticated());
    assert!(auth.get_username().is_none());
}

#[tokio::test]
async fn test_token_threshold_is_configurable() {
    let caller = MockToolCaller::new().with_ok("login", login_grant("short", None, "admin"));
    let auth = manager(&caller).with_policy(TokenPolicy::default().with_min_token_length(5));

    auth.authenticate_admin("root", "pw").await.unwrap();
    assert_eq!(auth.get_auth_token().as_deref(), Some("short"));
}

#[tokio::test]
async fn test_login_tool_error_propagates() {
    let caller = MockToolCaller::new().with_error("login", "Invalid credentials");
    let auth = manager(&caller);

    let err = auth.authenticate_admin("root", "wrong").await.unwrap_err();
    assert_eq!(err, AuthError::Tool("Invalid credentials".to_string()));
    assert!(!auth.is_authenticated());
}

#[tokio::test]
async fn test_login_accepts_text_payload() {
    let text = login_grant(TOKEN, None, "admin").to_string();
    let caller = MockToolCaller::new().with_ok("login", Value::String(text));
    let auth = manager(&caller);

    auth.authenticate_admin("root", "pw").await.unwrap();
    assert_eq!(auth.get_auth_token().as_deref(), Some(TOKEN));
    assert!(auth.get_refresh_token().is_none());
}

#[tokio::test]
async fn test_clear_auth_is_idempotent() {
    let caller = MockToolCaller::new();
    let auth = logged_in(&caller).await;

    auth.clear_auth();
    auth.clear_auth();
    assert!(auth.get_auth_token().is_none());
    assert!(auth.get_role().is_none());
    assert_eq!(caller.bearer(), None);
}

#[tokio::test]
async fn test_revoke_clears_state_before_network() {
    let caller = MockToolCaller::new()
        .with_error("revoke_token", "server down")
        .with_error("revoke_token", "server down");
    let auth = logged_in(&caller).await;

    let context = auth.context().clone();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    caller.on_call(move |_, _| sink.lock().unwrap().push(context.access_token()));

    auth.revoke_token().await;

    assert!(auth.get_auth_token().is_none());
    assert_eq!(*seen.lock().unwrap(), vec![None, None]);

    // Refresh token revocation is attempted even though the first call failed.
    let revokes = caller.calls_to("revoke_token");
    assert_eq!(revokes.len(), 2);
    assert_eq!(revokes[0].args["token"], TOKEN);
    assert_eq!(revokes[1].args["token"], REFRESH);
}

#[tokio::test]
async fn test_revoke_without_tokens_is_noop() {
    let caller = MockToolCaller::new();
    let auth = manager(&caller);

    auth.revoke_token().await;
    assert!(caller.calls().is_empty());
    assert!(caller.bearer_history().is_empty());
    assert_eq!(auth.context().generation(), AuthContext::new().generation());
}

#[tokio::test]
async fn test_refresh_without_refresh_token_skips_network() {
    let caller = MockToolCaller::new().with_ok("login", login_grant(TOKEN, None, "admin"));
    let auth = manager(&caller);
    auth.authenticate_admin("root", "pw").await.unwrap();

    assert!(!auth.refresh_auth_token().await);
    assert_eq!(caller.call_count("refresh_token"), 0);
    assert!(!auth.is_authenticated());
}

#[tokio::test]
async fn test_refresh_replaces_tokens() {
    let caller = MockToolCaller::new();
    let auth = logged_in(&caller).await;
    caller.push_reply(
        "refresh_token",
        tomo_mcp::ToolCallResult::ok(refresh_grant(NEW_TOKEN, None)),
    );

    assert!(auth.refresh_auth_token().await);
    assert_eq!(auth.get_auth_token().as_deref(), Some(NEW_TOKEN));
    // No new refresh token handed out; the old one is kept.
    assert_eq!(auth.get_refresh_token().as_deref(), Some(REFRESH));
    assert_eq!(auth.get_username().as_deref(), Some("root"));
    assert_eq!(caller.bearer().as_deref(), Some(NEW_TOKEN));
    assert_eq!(
        caller.calls_to("refresh_token")[0].args,
        json!({"refresh_token": REFRESH})
    );
}

#[tokio::test]
async fn test_refresh_failure_clears_state() {
    let caller = MockToolCaller::new();
    let auth = logged_in(&caller).await;
    caller.push_reply(
        "refresh_token",
        tomo_mcp::ToolCallResult::ok(refresh_grant("tiny", None)),
    );

    assert!(!auth.refresh_auth_token().await);
    assert!(!auth.is_authenticated());
    assert_eq!(caller.bearer(), None);
}

#[tokio::test]
async fn test_concurrent_refreshes_share_one_call() {
    let caller = MockToolCaller::new();
    let auth = logged_in(&caller).await;
    caller.push_reply(
        "refresh_token",
        tomo_mcp::ToolCallResult::ok(refresh_grant(NEW_TOKEN, Some("refresh-token-next-1234"))),
    );
    let gate = caller.hold("refresh_token");

    let (first, second, _) = tokio::join!(
        auth.refresh_auth_token(),
        auth.refresh_auth_token(),
        async {
            gate.entered().await;
            gate.release();
        }
    );

    assert!(first);
    assert!(second);
    assert_eq!(caller.call_count("refresh_token"), 1);
    assert_eq!(auth.get_refresh_token().as_deref(), Some("refresh-token-next-1234"));

    // The settled refresh is not reused.
    caller.push_reply(
        "refresh_token",
        tomo_mcp::ToolCallResult::ok(refresh_grant(TOKEN, None)),
    );
    assert!(auth.refresh_auth_token().await);
    assert_eq!(caller.call_count("refresh_token"), 2);
}

#[tokio::test]
async fn test_logout_during_refresh_wins() {
    let caller = MockToolCaller::new();
    let auth = logged_in(&caller).await;
    caller.push_reply(
        "refresh_token",
        tomo_mcp::ToolCallResult::ok(refresh_grant(NEW_TOKEN, Some("refresh-token-next-1234"))),
    );
    let gate = caller.hold("refresh_token");

    let (refreshed, _) = tokio::join!(auth.refresh_auth_token(), async {
        gate.entered().await;
        auth.clear_auth();
        gate.release();
    });

    assert!(!refreshed);
    assert!(auth.get_auth_token().is_none());
    assert!(auth.get_refresh_token().is_none());
    assert_eq!(caller.bearer(), None);
}

#[tokio::test]
async fn test_unauthorized_call_refreshes_and_retries() {
    let caller = MockToolCaller::new();
    let auth = logged_in(&caller).await;
    let reasons = logout_recorder(&auth);
    caller.push_reply(
        "refresh_token",
        tomo_mcp::ToolCallResult::ok(refresh_grant(NEW_TOKEN, None)),
    );
    let caller = caller
        .with_unauthorized("list_servers")
        .with_ok("list_servers", json!({"servers": ["a"]}));

    let result = auth.call_tool::<Value>("list_servers", json!({})).await;

    assert_eq!(assert_tool_ok(result), json!({"servers": ["a"]}));
    assert_eq!(caller.call_count("list_servers"), 2);
    assert_eq!(auth.get_auth_token().as_deref(), Some(NEW_TOKEN));
    assert!(reasons.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unrefreshable_call_forces_logout() {
    let caller = MockToolCaller::new();
    let auth = logged_in(&caller).await;
    let reasons = logout_recorder(&auth);
    let caller = caller
        .with_error("refresh_token", "Refresh token expired")
        .with_unauthorized("list_servers");

    let result = auth.call_tool::<Value>("list_servers", json!({})).await;

    assert_tool_failed(&result, "Authentication required");
    assert!(result.is_unauthorized());
    assert_eq!(caller.call_count("list_servers"), 1);
    assert!(!auth.is_authenticated());
    assert_eq!(*reasons.lock().unwrap(), vec![LogoutReason::SessionExpired]);
}

#[tokio::test]
async fn test_login_during_call_refresh_is_kept() {
    const RELOGIN: &str = "jwt-token-relogin-555555";

    let caller = MockToolCaller::new();
    let auth = logged_in(&caller).await;
    let reasons = logout_recorder(&auth);
    let caller = caller
        .with_unauthorized("list_servers")
        .with_error("refresh_token", "Refresh token expired")
        .with_ok("login", login_grant(RELOGIN, Some(REFRESH), "admin"));
    let gate = caller.hold("refresh_token");

    let (result, login) = tokio::join!(auth.call_tool::<Value>("list_servers", json!({})), async {
        gate.entered().await;
        let login = auth.authenticate_admin("root", "hunter22").await;
        gate.release();
        login
    });

    login.unwrap();
    assert!(!result.success);
    assert_eq!(auth.get_auth_token().as_deref(), Some(RELOGIN));
    assert_eq!(caller.bearer().as_deref(), Some(RELOGIN));
    assert!(reasons.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_logout_during_call_refresh_does_not_force_logout() {
    let caller = MockToolCaller::new();
    let auth = logged_in(&caller).await;
    let reasons = logout_recorder(&auth);
    let caller = caller.with_unauthorized("list_servers").with_ok(
        "refresh_token",
        refresh_grant(NEW_TOKEN, Some("refresh-token-next-1234")),
    );
    let gate = caller.hold("refresh_token");

    let (result, _) = tokio::join!(auth.call_tool::<Value>("list_servers", json!({})), async {
        gate.entered().await;
        auth.clear_auth();
        gate.release();
    });

    assert!(!result.success);
    assert!(!auth.is_authenticated());
    assert_eq!(caller.call_count("list_servers"), 1);
    assert!(reasons.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_custom_refresher_is_used() {
    let caller = MockToolCaller::new();
    let auth = logged_in(&caller).await;
    let reasons = logout_recorder(&auth);
    let runs = Arc::new(Mutex::new(0));
    let counter = runs.clone();
    auth.set_token_refresher(Arc::new(move || {
        *counter.lock().unwrap() += 1;
        async { false }.boxed()
    }));
    let caller = caller.with_unauthorized("list_agents");

    let result = auth.call_tool::<Value>("list_agents", json!({})).await;

    assert!(!result.success);
    assert_eq!(*runs.lock().unwrap(), 1);
    assert_eq!(caller.call_count("refresh_token"), 0);
    assert_eq!(*reasons.lock().unwrap(), vec![LogoutReason::SessionExpired]);
}

#[tokio::test]
async fn test_typed_call_decodes_payload() {
    #[derive(Debug, serde::Deserialize)]
    struct Versions {
        api: String,
    }

    let caller = MockToolCaller::new().with_ok(
        "get_component_versions",
        Value::String(r#"{"api":"1.4.0"}"#.to_string()),
    );
    let auth = manager(&caller);

    let result = auth
        .call_tool::<Versions>("get_component_versions", json!({}))
        .await;
    assert_eq!(assert_tool_ok(result).api, "1.4.0");
}

#[tokio::test(start_paused = true)]
async fn test_inactivity_logs_out() {
    let caller = MockToolCaller::new().with_ok("login", login_grant(TOKEN, Some(REFRESH), "admin"));
    let auth = manager(&caller).with_inactivity_timeout(Some(Duration::from_secs(60)));
    let reasons = logout_recorder(&auth);
    auth.authenticate_admin("root", "pw").await.unwrap();

    tokio::time::advance(Duration::from_secs(30)).await;
    assert!(!auth.check_inactivity());
    assert!(auth.is_authenticated());

    tokio::time::advance(Duration::from_secs(31)).await;
    assert!(auth.check_inactivity());
    assert!(!auth.is_authenticated());
    assert_eq!(*reasons.lock().unwrap(), vec![LogoutReason::Inactivity]);

    // Nothing left to expire.
    assert!(!auth.check_inactivity());
}

#[tokio::test(start_paused = true)]
async fn test_activity_defers_inactivity_logout() {
    let caller = MockToolCaller::new()
        .with_ok("login", login_grant(TOKEN, None, "admin"))
        .with_ok("list_servers", json!([]));
    let auth = manager(&caller).with_inactivity_timeout(Some(Duration::from_secs(60)));
    auth.authenticate_admin("root", "pw").await.unwrap();

    tokio::time::advance(Duration::from_secs(50)).await;
    let _ = auth.call_tool::<Value>("list_servers", json!({})).await;
    tokio::time::advance(Duration::from_secs(50)).await;

    assert!(!auth.check_inactivity());
    assert!(auth.is_authenticated());
}

#[tokio::test(start_paused = true)]
async fn test_inactivity_watch() {
    let caller = MockToolCaller::new().with_ok("login", login_grant(TOKEN, None, "admin"));
    let auth = Arc::new(manager(&caller).with_inactivity_timeout(Some(Duration::from_secs(30))));
    let reasons = logout_recorder(&auth);
    auth.authenticate_admin("root", "pw").await.unwrap();

    let watch = auth.spawn_inactivity_watch(Duration::from_secs(10));
    assert!(watch.is_some());

    tokio::time::sleep(Duration::from_secs(45)).await;
    assert!(!auth.is_authenticated());
    assert_eq!(*reasons.lock().unwrap(), vec![LogoutReason::Inactivity]);
}

#[tokio::test]
async fn test_inactivity_disabled_by_default() {
    let caller = MockToolCaller::new();
    let auth = Arc::new(logged_in(&caller).await);
    assert!(!auth.check_inactivity());
    assert!(auth.spawn_inactivity_watch(Duration::from_secs(1)).is_none());
}

#[tokio::test]
async fn test_end_to_end_session() {
    let caller = MockToolCaller::new()
        .with_ok("login", login_grant("jwt-token-123456", None, "admin"))
        .with_ok("list_servers", json!({"servers": [{"name": "edge-1"}]}))
        .with_ok("revoke_token", json!({"revoked": true}));
    let auth = manager(&caller);

    auth.authenticate_admin("root", "pw").await.unwrap();
    let servers = auth.call_tool::<Value>("list_servers", json!({})).await;
    assert!(servers.success);
    assert_eq!(servers.data.unwrap()["servers"][0]["name"], "edge-1");

    auth.revoke_token().await;
    assert!(auth.get_auth_token().is_none());
    assert_eq!(caller.call_count("revoke_token"), 1);
}
