use super::*;
use crate::test_support::client_for;
use crate::test_support::make_session;
use crate::test_support::tool_response;
use pretty_assertions::assert_eq;
use wiremock::matchers::body_string_contains;
use wiremock::matchers::method;
use wiremock::matchers::query_param;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

#[tokio::test]
async fn test_execute_command_returns_output() {
    let server = MockServer::start().await;
    // The default timeout rides inside the serialized args.
    Mock::given(method("POST"))
        .and(query_param("Action", "CallMcpTool"))
        .and(body_string_contains("Name=shell"))
        .and(body_string_contains("timeout_ms%22%3A60000"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(tool_response("req-cmd", "hi\n", false)),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session.command().execute_command("echo hi").await;
    assert!(result.success, "{}", result.error_message);
    assert_eq!(result.output, "hi\n");
    assert_eq!(result.request_id, "req-cmd");
}

#[tokio::test]
async fn test_execute_command_failure_carries_stderr() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(query_param("Action", "CallMcpTool"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tool_response(
            "req-cmd",
            "sh: nope: command not found",
            true,
        )))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session
        .command()
        .execute_command_with_timeout("nope", 1_000)
        .await;
    assert!(!result.success);
    assert_eq!(result.output, "");
    assert!(result.error_message.contains("command not found"));
}

#[test]
fn test_default_timeout_value() {
    assert_eq!(DEFAULT_COMMAND_TIMEOUT_MS, 60_000);
}
