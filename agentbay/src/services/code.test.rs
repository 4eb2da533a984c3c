use super::*;
use crate::test_support::client_for;
use crate::test_support::make_session;
use crate::test_support::mount_action;
use crate::test_support::tool_response;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::MockServer;

#[tokio::test]
async fn test_run_code_parses_rich_payload() {
    let payload = json!({
        "logs": {"stdout": ["1\n", "2\n"], "stderr": []},
        "results": [
            {"text": "42", "is_main_result": true},
            {"html": "<b>42</b>", "is_main_result": false},
        ],
        "execution_count": 3,
        "execution_time": 0.125,
    });
    let server = MockServer::start().await;
    mount_action(
        &server,
        "CallMcpTool",
        tool_response("req-code", &payload.to_string(), false),
    )
    .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session
        .code()
        .run_code("print(42)", CodeLanguage::Python)
        .await;
    assert!(result.success);
    assert_eq!(result.execution_count, Some(3));
    assert_eq!(result.logs.stdout.len(), 2);
    assert_eq!(result.results.len(), 2);
    assert_eq!(result.result(), "42");
}

#[tokio::test]
async fn test_run_code_plain_text_fallback() {
    let server = MockServer::start().await;
    mount_action(&server, "CallMcpTool", tool_response("req-code", "42\n", false)).await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session
        .code()
        .run_code("console.log(42)", CodeLanguage::JavaScript)
        .await;
    assert!(result.success);
    assert_eq!(result.result(), "42\n");
}

#[tokio::test]
async fn test_run_code_surfaces_execution_error() {
    let payload = json!({
        "logs": {"stdout": [], "stderr": ["Traceback..."]},
        "results": [],
        "error": {"name": "NameError", "value": "x is not defined", "traceback": "Traceback..."},
    });
    let server = MockServer::start().await;
    mount_action(
        &server,
        "CallMcpTool",
        tool_response("req-code", &payload.to_string(), false),
    )
    .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session.code().run_code("x", CodeLanguage::Python).await;
    assert!(!result.success);
    let error = result.error.expect("error should be present");
    assert_eq!(error.name, "NameError");
    assert_eq!(result.error_message, "NameError: x is not defined");
}

#[test]
fn test_scalar_result_prefers_main_then_first_then_stdout() {
    let mut result = CodeExecutionResult {
        results: vec![
            ExecutionResult {
                text: Some("first".into()),
                ..Default::default()
            },
            ExecutionResult {
                text: Some("main".into()),
                is_main_result: true,
                ..Default::default()
            },
        ],
        ..Default::default()
    };
    assert_eq!(result.result(), "main");

    result.results[1].is_main_result = false;
    assert_eq!(result.result(), "first");

    result.results.clear();
    result.logs.stdout = vec!["a".into(), "b".into()];
    assert_eq!(result.result(), "ab");

    result.logs.stdout.clear();
    assert_eq!(result.result(), "");
}
