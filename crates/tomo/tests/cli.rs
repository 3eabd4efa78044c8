//! CLI integration tests.
//!
//! These run the `tomo` binary end-to-end, with HOME pointed at a temporary
//! directory so no user config or log files are touched.

use serde_json::json;
use std::process::{Command, Output};
use tempfile::TempDir;
use tomo_test_utils::fixtures::{login_grant, result_frame, structured_result};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn tomo(home: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tomo"));
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_DATA_HOME", home.path().join("data"))
        .env_remove("TOMO_URL")
        .env_remove("TOMO_TIMEOUT_MS")
        .env_remove("TOMO_LOG_LEVEL")
        .env_remove("TOMO_MIN_TOKEN_LENGTH")
        .env_remove("TOMO_USERNAME")
        .env_remove("TOMO_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

async fn run(mut cmd: Command) -> Output {
    tokio::task::spawn_blocking(move || cmd.output().expect("Failed to execute command"))
        .await
        .expect("command thread panicked")
}

fn frame(result: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/event-stream")
        .set_body_string(result_frame(1, result))
}

async fn control_plane() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/mcp"))
        .respond_with(ResponseTemplate::new(200).insert_header("mcp-session-id", "cli-1"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .and(body_string_contains("\"initialize\""))
        .respond_with(frame(json!({"protocolVersion": "2024-11-05"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .and(body_string_contains("notifications/initialized"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;
    server
}

#[test]
fn test_help_command() {
    let home = TempDir::new().expect("Failed to create temp dir");
    let output = tomo(&home)
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ping"));
    assert!(stdout.contains("login"));
    assert!(stdout.contains("call"));
    assert!(stdout.contains("--url"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_ping_command() {
    let server = control_plane().await;
    let home = TempDir::new().expect("Failed to create temp dir");
    let mut cmd = tomo(&home);
    cmd.args(["--url", &format!("{}/mcp/", server.uri()), "ping"]);

    let output = run(cmd).await;

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(&format!("Connected to {}/mcp", server.uri())));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_ping_without_session_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    let home = TempDir::new().expect("Failed to create temp dir");
    let mut cmd = tomo(&home);
    cmd.args(["--url", &format!("{}/mcp", server.uri()), "ping"]);

    let output = run(cmd).await;

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to get session ID"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_rejects_non_admin() {
    let server = control_plane().await;
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .and(body_string_contains("\"name\":\"login\""))
        .respond_with(frame(structured_result(login_grant(
            "jwt-token-123456789",
            None,
            "user",
        ))))
        .mount(&server)
        .await;
    let home = TempDir::new().expect("Failed to create temp dir");
    let mut cmd = tomo(&home);
    cmd.args(["--url", &format!("{}/mcp", server.uri()), "login", "-u", "bob"])
        .env("TOMO_PASSWORD", "pw");

    let output = run(cmd).await;

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr)
        .contains("Only admin users can run CLI commands"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_call_command_prints_json() {
    let server = control_plane().await;
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .and(body_string_contains("\"name\":\"login\""))
        .respond_with(frame(structured_result(login_grant(
            "jwt-token-123456789",
            None,
            "admin",
        ))))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .and(body_string_contains("\"name\":\"check_updates\""))
        .respond_with(frame(structured_result(json!({"available": false}))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .and(body_string_contains("\"name\":\"revoke_token\""))
        .respond_with(frame(structured_result(json!({"revoked": true}))))
        .expect(1)
        .mount(&server)
        .await;
    let home = TempDir::new().expect("Failed to create temp dir");
    let mut cmd = tomo(&home);
    cmd.args([
        "--url",
        &format!("{}/mcp", server.uri()),
        "call",
        "check_updates",
        "--args",
        r#"{"channel": "stable"}"#,
    ])
    .env("TOMO_USERNAME", "root")
    .env("TOMO_PASSWORD", "hunter22");

    let output = run(cmd).await;

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let printed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(printed, json!({"available": false}));
}
