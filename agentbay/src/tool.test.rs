use super::*;
use crate::test_support::client_for;
use crate::test_support::make_session;
use crate::test_support::make_vpc_session;
use crate::test_support::mount_action;
use crate::test_support::tool_response;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::matchers::query_param;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

#[test]
fn test_normalize_key_mappings() {
    assert_eq!(normalize_key("Ctrl"), "ctrl");
    assert_eq!(normalize_key("Control"), "ctrl");
    assert_eq!(normalize_key("ESCAPE"), "esc");
    assert_eq!(normalize_key("Return"), "enter");
    assert_eq!(normalize_key("Meta"), "win");
    assert_eq!(normalize_key("Cmd"), "win");
    assert_eq!(normalize_key("Shift"), "shift");
    assert_eq!(normalize_key(" a "), "a");
}

#[test]
fn test_normalize_args_rewrites_press_keys_only() {
    let args = normalize_args("press_keys", json!({"keys": ["Ctrl", "C"]}));
    assert_eq!(args["keys"], json!(["ctrl", "c"]));

    let untouched = normalize_args("input_text", json!({"text": "Ctrl"}));
    assert_eq!(untouched["text"], "Ctrl");
}

#[test]
fn test_vpc_request_id_format() {
    let id = generate_vpc_request_id();
    let parts: Vec<&str> = id.splitn(3, '-').collect();
    assert_eq!(parts[0], "vpc");
    assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
    assert_eq!(parts[2].len(), 9);
    assert!(parts[2].chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
}

#[tokio::test]
async fn test_control_plane_call_collapses_text() {
    let server = MockServer::start().await;
    mount_action(&server, "CallMcpTool", tool_response("req-1", "hi\n", false)).await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session
        .call_mcp_tool("shell", json!({"command": "echo hi"}))
        .await;
    assert!(result.success);
    assert_eq!(result.request_id, "req-1");
    assert_eq!(result.data, "hi\n");
    assert_eq!(result.error_message, "");
}

#[tokio::test]
async fn test_control_plane_data_as_json_string() {
    let server = MockServer::start().await;
    let body = json!({
        "RequestId": "req-2",
        "Success": true,
        "Data": "{\"content\":[{\"type\":\"text\",\"text\":\"ok\"}],\"isError\":false}",
    });
    mount_action(&server, "CallMcpTool", body).await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session.call_mcp_tool("shell", json!({})).await;
    assert!(result.success);
    assert_eq!(result.data, "ok");
}

#[tokio::test]
async fn test_tool_error_becomes_failure_envelope() {
    let server = MockServer::start().await;
    mount_action(
        &server,
        "CallMcpTool",
        tool_response("req-3", "command not found", true),
    )
    .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session.call_mcp_tool("shell", json!({})).await;
    assert!(!result.success);
    assert_eq!(result.error_message, "command not found");
    assert_eq!(result.data, "");
    assert_eq!(result.request_id, "req-3");
}

#[tokio::test]
async fn test_empty_data_is_failure() {
    let server = MockServer::start().await;
    mount_action(&server, "CallMcpTool", json!({"RequestId": "req-4", "Success": true})).await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session.call_mcp_tool("shell", json!({})).await;
    assert!(!result.success);
    assert_eq!(result.error_message, "Empty response data");
}

#[tokio::test]
async fn test_vpc_routes_through_session_endpoint() {
    // One server plays both roles: control plane (unused) and the
    // in-session endpoint.
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/callTool"))
        .and(query_param("tool", "shell"))
        .and(query_param("server", "shell-server"))
        .and(query_param("token", "tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{"type": "text", "text": "hi\n"}],
            "isError": false,
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let address = server.address();
    let session = make_vpc_session(
        &client,
        "s-vpc",
        &address.ip().to_string(),
        &address.port().to_string(),
        "tok-1",
        vec![McpTool {
            name: "shell".into(),
            server: "shell-server".into(),
            ..Default::default()
        }],
    );

    let result = session.call_mcp_tool("shell", json!({"command": "echo hi"})).await;
    assert!(result.success, "{}", result.error_message);
    assert_eq!(result.data, "hi\n");
    assert!(result.request_id.starts_with("vpc-"));
}

#[tokio::test]
async fn test_vpc_unknown_tool_fails_closed() {
    let server = MockServer::start().await;

    let client = client_for(&server);
    let address = server.address();
    let session = make_vpc_session(
        &client,
        "s-vpc",
        &address.ip().to_string(),
        &address.port().to_string(),
        "tok-1",
        vec![McpTool {
            name: "shell".into(),
            server: "shell-server".into(),
            ..Default::default()
        }],
    );

    let result = session.call_mcp_tool("made_up", json!({})).await;
    assert!(!result.success);
    assert!(
        result
            .error_message
            .starts_with("server not found for tool: made_up"),
        "{}",
        result.error_message
    );
    assert_eq!(result.request_id, "");
    // No request reached the endpoint.
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_vpc_requires_network_configuration() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    let session = make_vpc_session(
        &client,
        "s-vpc",
        "",
        "",
        "",
        vec![McpTool {
            name: "shell".into(),
            server: "shell-server".into(),
            ..Default::default()
        }],
    );

    let result = session.call_mcp_tool("shell", json!({})).await;
    assert!(!result.success);
    assert!(result
        .error_message
        .contains("VPC network configuration incomplete"));
}

#[tokio::test]
async fn test_list_mcp_tools_parses_and_caches() {
    let server = MockServer::start().await;
    let tools_json = serde_json::to_string(&json!([
        {"name": "shell", "server": "shell-server", "description": "run commands",
         "inputSchema": {"type": "object"}, "tool": "shell"},
        {"name": "read_file", "server": "fs-server"},
    ]))
    .unwrap();
    mount_action(
        &server,
        "ListMcpTools",
        json!({"RequestId": "req-5", "Success": true, "Data": tools_json}),
    )
    .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session.list_mcp_tools(Some("linux_latest")).await;
    assert_eq!(result.request_id, "req-5");
    assert_eq!(result.tools.len(), 2);
    assert_eq!(result.tools[0].server, "shell-server");
    assert_eq!(session.mcp_tools().len(), 2);
    assert_eq!(
        session.find_server_for_tool("read_file").as_deref(),
        Some("fs-server")
    );
}
