use super::*;
use crate::test_support::client_for;
use crate::test_support::make_session;
use crate::test_support::tool_response;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::body_string_contains;
use wiremock::matchers::method;
use wiremock::matchers::query_param;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

async fn mount_tool(server: &MockServer, tool: &str, text: &str) {
    Mock::given(method("POST"))
        .and(query_param("Action", "CallMcpTool"))
        .and(body_string_contains(format!("Name={tool}")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(tool_response("req-agent", text, false)),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_execute_task_polls_to_finished() {
    let server = MockServer::start().await;
    mount_tool(
        &server,
        "flux_execute_task",
        &json!({"task_id": "t-1", "status": "running"}).to_string(),
    )
    .await;
    mount_tool(
        &server,
        "flux_get_task_status",
        &json!({"task_id": "t-1", "status": "finished"}).to_string(),
    )
    .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session.agent().execute_task("open the settings app", 5).await;
    assert!(result.success, "{}", result.error_message);
    assert_eq!(result.task_id, "t-1");
    assert_eq!(result.task_status, "finished");
}

#[tokio::test]
async fn test_execute_task_reports_failure_status() {
    let server = MockServer::start().await;
    mount_tool(
        &server,
        "flux_execute_task",
        &json!({"task_id": "t-2", "status": "running"}).to_string(),
    )
    .await;
    mount_tool(
        &server,
        "flux_get_task_status",
        &json!({"task_id": "t-2", "status": "failed"}).to_string(),
    )
    .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session.agent().execute_task("impossible", 5).await;
    assert!(!result.success);
    assert_eq!(result.task_status, "failed");
    assert!(result.error_message.contains("t-2"));
}

#[tokio::test]
async fn test_execute_task_requires_task_id() {
    let server = MockServer::start().await;
    mount_tool(&server, "flux_execute_task", "{}").await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session.agent().execute_task("anything", 1).await;
    assert!(!result.success);
    assert!(result.error_message.contains("task_id"));
}

#[tokio::test]
async fn test_terminate_task() {
    let server = MockServer::start().await;
    mount_tool(&server, "flux_terminate_task", "terminated").await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session.agent().terminate_task("t-3").await;
    assert!(result.success);
    assert_eq!(result.task_id, "t-3");
}
