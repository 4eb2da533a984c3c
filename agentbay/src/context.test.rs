use super::*;
use crate::test_support::client_for;
use crate::test_support::mount_action;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::method;
use wiremock::matchers::query_param;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

#[tokio::test]
async fn test_get_requires_name_or_id() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    let contexts = client.context();

    let result = contexts.get(None, false, None).await;
    assert!(!result.success);
    assert!(result.error_message.contains("'name' or 'context_id'"));
    assert_eq!(result.request_id, "");

    let result = contexts.get(None, true, Some("ctx-1")).await;
    assert!(!result.success);
    assert!(result.error_message.contains("Cannot create context using context_id"));
}

#[tokio::test]
async fn test_get_parses_context() {
    let server = MockServer::start().await;
    mount_action(
        &server,
        "GetContext",
        json!({
            "RequestId": "req-ctx",
            "Success": true,
            "Data": {
                "Id": "ctx-1",
                "Name": "my-volume",
                "State": "available",
                "CreateTime": "2026-07-01T00:00:00Z",
                "LastUsedTime": "2026-07-30T00:00:00Z",
            },
        }),
    )
    .await;

    let client = client_for(&server);
    let result = client.context().get(Some("my-volume"), true, None).await;
    assert!(result.success);
    assert_eq!(result.context_id, "ctx-1");
    let context = result.context.unwrap();
    assert_eq!(context.name, "my-volume");
    assert_eq!(context.state, "available");
}

#[tokio::test]
async fn test_list_parses_contexts_and_pagination() {
    let server = MockServer::start().await;
    mount_action(
        &server,
        "ListContexts",
        json!({
            "RequestId": "req-list",
            "Success": true,
            "Data": [
                {"Id": "ctx-1", "Name": "a", "State": "available"},
                {"Id": "ctx-2", "Name": "b", "State": "in-use"},
            ],
            "NextToken": "tok",
            "MaxResults": 10,
            "TotalCount": 7,
        }),
    )
    .await;

    let client = client_for(&server);
    let result = client.context().list(None).await;
    assert!(result.success);
    assert_eq!(result.contexts.len(), 2);
    assert_eq!(result.contexts[1].state, "in-use");
    assert_eq!(result.next_token, "tok");
    assert_eq!(result.total_count, 7);
}

#[tokio::test]
async fn test_file_urls_and_delete() {
    let server = MockServer::start().await;
    mount_action(
        &server,
        "GetContextFileUploadUrl",
        json!({
            "RequestId": "req-up",
            "Success": true,
            "Data": {"Url": "https://oss.test/put", "ExpireTime": 3600},
        }),
    )
    .await;
    mount_action(
        &server,
        "GetContextFileDownloadUrl",
        json!({
            "RequestId": "req-down",
            "Success": true,
            "Data": {"Url": "https://oss.test/get", "ExpireTime": 3600},
        }),
    )
    .await;
    mount_action(
        &server,
        "DeleteContextFile",
        json!({"RequestId": "req-delfile", "Success": true}),
    )
    .await;

    let client = client_for(&server);
    let contexts = client.context();

    let up = contexts.get_file_upload_url("ctx-1", "/data/a.bin").await;
    assert!(up.success);
    assert_eq!(up.url, "https://oss.test/put");
    assert_eq!(up.expire_time, Some(3600));

    let down = contexts.get_file_download_url("ctx-1", "/data/a.bin").await;
    assert!(down.success);
    assert_eq!(down.url, "https://oss.test/get");

    let deleted = contexts.delete_file("ctx-1", "/data/a.bin").await;
    assert!(deleted.success);
    assert_eq!(deleted.data, Some(serde_json::Value::Bool(true)));
}

#[tokio::test]
async fn test_list_files_parses_entries() {
    let server = MockServer::start().await;
    mount_action(
        &server,
        "DescribeContextFiles",
        json!({
            "RequestId": "req-files",
            "Success": true,
            "Count": 1,
            "Data": [{
                "FileId": "f-1",
                "FileName": "a.bin",
                "FilePath": "/data/a.bin",
                "FileType": "file",
                "Size": 42,
                "Status": "ready",
            }],
        }),
    )
    .await;

    let client = client_for(&server);
    let result = client.context().list_files("ctx-1", "/data", 1, 50).await;
    assert!(result.success);
    assert_eq!(result.count, Some(1));
    assert_eq!(result.entries.len(), 1);
    assert_eq!(result.entries[0].file_name, "a.bin");
    assert_eq!(result.entries[0].size, Some(42));
}

#[tokio::test]
async fn test_clear_async_reports_clearing() {
    let server = MockServer::start().await;
    mount_action(
        &server,
        "ClearContext",
        json!({"RequestId": "req-clear", "Success": true}),
    )
    .await;

    let client = client_for(&server);
    let result = client.context().clear_async("ctx-1").await;
    assert!(result.success);
    assert_eq!(result.status.as_deref(), Some("clearing"));
    assert_eq!(result.context_id.as_deref(), Some("ctx-1"));
}

fn context_state_body(state: &str) -> serde_json::Value {
    json!({
        "RequestId": "req-state",
        "Success": true,
        "Data": {"Id": "ctx-1", "Name": "my-volume", "State": state},
    })
}

#[tokio::test]
async fn test_clear_polls_until_available() {
    let server = MockServer::start().await;
    mount_action(
        &server,
        "ClearContext",
        json!({"RequestId": "req-clear", "Success": true}),
    )
    .await;
    // Three `clearing` samples, then `available`.
    Mock::given(method("POST"))
        .and(query_param("Action", "GetContext"))
        .respond_with(ResponseTemplate::new(200).set_body_json(context_state_body("clearing")))
        .up_to_n_times(3)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(query_param("Action", "GetContext"))
        .respond_with(ResponseTemplate::new(200).set_body_json(context_state_body("available")))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client
        .context()
        .clear("ctx-1", Duration::from_secs(10), Duration::from_millis(50))
        .await
        .expect("clear should not time out");
    assert!(result.success);
    assert_eq!(result.status.as_deref(), Some("available"));
}

#[tokio::test]
async fn test_clear_raises_on_timeout() {
    let server = MockServer::start().await;
    mount_action(
        &server,
        "ClearContext",
        json!({"RequestId": "req-clear", "Success": true}),
    )
    .await;
    mount_action(&server, "GetContext", context_state_body("clearing")).await;

    let client = client_for(&server);
    let result = client
        .context()
        .clear("ctx-1", Duration::from_millis(300), Duration::from_millis(50))
        .await;
    assert!(matches!(result, Err(AgentBayError::ClearanceTimeout(_))));
}

#[tokio::test]
async fn test_clear_short_circuits_on_status_failure() {
    let server = MockServer::start().await;
    mount_action(
        &server,
        "ClearContext",
        json!({"RequestId": "req-clear", "Success": true}),
    )
    .await;
    mount_action(
        &server,
        "GetContext",
        json!({
            "RequestId": "req-state",
            "Success": false,
            "Code": "InvalidContext",
            "Message": "gone",
        }),
    )
    .await;

    let client = client_for(&server);
    let result = client
        .context()
        .clear("ctx-1", Duration::from_secs(5), Duration::from_millis(50))
        .await
        .expect("failures short-circuit, not raise");
    assert!(!result.success);
    assert_eq!(result.error_message, "[InvalidContext] gone");
}
