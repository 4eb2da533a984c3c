use super::*;
use crate::test_support::client_for;
use crate::test_support::make_session;
use crate::test_support::mount_action;
use crate::test_support::tool_response;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::body_string_contains;
use wiremock::matchers::method;
use wiremock::matchers::query_param;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

#[test]
fn test_mouse_button_parse() {
    assert_eq!(MouseButton::parse("left").unwrap(), MouseButton::Left);
    assert_eq!(
        MouseButton::parse("double_left").unwrap(),
        MouseButton::DoubleLeft
    );
    assert!(matches!(
        MouseButton::parse("quadruple"),
        Err(AgentBayError::Validation(_))
    ));
}

#[tokio::test]
async fn test_click_mouse_sends_button_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(query_param("Action", "CallMcpTool"))
        .and(body_string_contains("Name=click_mouse"))
        .and(body_string_contains("double_left"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tool_response("req-1", "", false)))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session
        .computer()
        .click_mouse(10, 20, MouseButton::DoubleLeft)
        .await;
    assert!(result.success, "{}", result.error_message);
}

#[tokio::test]
async fn test_get_screen_size_parses_json() {
    let server = MockServer::start().await;
    let payload = json!({"width": 1920, "height": 1080, "dpiScalingFactor": 1.5});
    mount_action(
        &server,
        "CallMcpTool",
        tool_response("req-2", &payload.to_string(), false),
    )
    .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session.computer().get_screen_size().await;
    assert!(result.success);
    let size: ScreenSize = serde_json::from_value(result.data.unwrap()).unwrap();
    assert_eq!(size.width, 1920);
    assert_eq!(size.dpi_scaling_factor, 1.5);
}

#[tokio::test]
async fn test_screenshot_returns_url() {
    let server = MockServer::start().await;
    mount_action(
        &server,
        "CallMcpTool",
        tool_response("req-3", "https://oss.test/shot.png", false),
    )
    .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session.computer().screenshot().await;
    assert!(result.success);
    assert_eq!(result.data.unwrap(), json!("https://oss.test/shot.png"));
}

#[tokio::test]
async fn test_list_root_windows_parses_tree() {
    let payload = json!([{
        "window_id": 7,
        "title": "Terminal",
        "width": 800,
        "height": 600,
        "pid": 1234,
        "pname": "bash",
        "child_windows": [{"window_id": 8, "title": "tab"}],
    }]);
    let server = MockServer::start().await;
    mount_action(
        &server,
        "CallMcpTool",
        tool_response("req-4", &payload.to_string(), false),
    )
    .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session.computer().list_root_windows().await;
    assert!(result.success);
    assert_eq!(result.windows.len(), 1);
    assert_eq!(result.windows[0].title, "Terminal");
    assert_eq!(result.windows[0].child_windows.len(), 1);
}

#[tokio::test]
async fn test_list_visible_apps_parses_processes() {
    let payload = json!([
        {"pname": "firefox", "pid": 100, "cmdline": "/usr/bin/firefox"},
        {"pname": "code", "pid": 200},
    ]);
    let server = MockServer::start().await;
    mount_action(
        &server,
        "CallMcpTool",
        tool_response("req-5", &payload.to_string(), false),
    )
    .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session.computer().list_visible_apps().await;
    assert!(result.success);
    assert_eq!(result.processes.len(), 2);
    assert_eq!(result.processes[0].pname, "firefox");
    assert_eq!(result.processes[1].pid, 200);
}

#[tokio::test]
async fn test_tool_error_propagates() {
    let server = MockServer::start().await;
    mount_action(
        &server,
        "CallMcpTool",
        tool_response("req-6", "no display", true),
    )
    .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session.computer().input_text("hello").await;
    assert!(!result.success);
    assert_eq!(result.error_message, "no display");
}
