use super::*;
use crate::test_support::client_for;
use crate::test_support::make_session;
use crate::test_support::mount_action;
use pretty_assertions::assert_eq;
use serde_json::json;

const NESTED_STATUS: &str = r#"[{"type":"data","data":"[{\"contextId\":\"c1\",\"path\":\"/a\",\"status\":\"Success\",\"taskType\":\"upload\",\"startTime\":0,\"finishTime\":1,\"errorMessage\":\"\"}]"}]"#;

#[test]
fn test_parse_context_status_two_layers() {
    let items = parse_context_status(NESTED_STATUS);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].context_id, "c1");
    assert_eq!(items[0].path, "/a");
    assert_eq!(items[0].status, "Success");
    assert_eq!(items[0].task_type, "upload");
    assert_eq!(items[0].finish_time, 1);
}

#[test]
fn test_parse_context_status_skips_non_data_entries() {
    let raw = r#"[{"type":"meta","data":"ignored"},{"type":"data","data":"[{\"contextId\":\"c2\",\"status\":\"Failed\",\"taskType\":\"download\"}]"}]"#;
    let items = parse_context_status(raw);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].context_id, "c2");
    assert_eq!(items[0].status, "Failed");
}

#[test]
fn test_parse_context_status_tolerates_garbage() {
    assert!(parse_context_status("not json").is_empty());
    assert!(parse_context_status(r#"[{"type":"data","data":"broken"}]"#).is_empty());
}

#[tokio::test]
async fn test_info_parses_nested_payload() {
    let server = wiremock::MockServer::start().await;
    mount_action(
        &server,
        "GetContextInfo",
        json!({
            "RequestId": "req-info",
            "Success": true,
            "Data": {"ContextStatus": NESTED_STATUS},
        }),
    )
    .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session.context().info().await;
    assert!(result.success);
    assert_eq!(result.request_id, "req-info");
    assert_eq!(result.context_status_data.len(), 1);
    assert_eq!(result.context_status_data[0].context_id, "c1");
}

#[tokio::test]
async fn test_sync_reports_success_when_tasks_finish() {
    let server = wiremock::MockServer::start().await;
    mount_action(
        &server,
        "SyncContext",
        json!({"RequestId": "req-sync", "Success": true}),
    )
    .await;
    mount_action(
        &server,
        "GetContextInfo",
        json!({
            "RequestId": "req-info",
            "Success": true,
            "Data": {"ContextStatus": NESTED_STATUS},
        }),
    )
    .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session.context().sync(None, None, None).await;
    assert!(result.success);
    assert_eq!(result.request_id, "req-sync");
}

#[tokio::test]
async fn test_sync_reports_failure_when_task_failed() {
    let server = wiremock::MockServer::start().await;
    mount_action(
        &server,
        "SyncContext",
        json!({"RequestId": "req-sync", "Success": true}),
    )
    .await;
    let failed = r#"[{"type":"data","data":"[{\"contextId\":\"c1\",\"path\":\"/a\",\"status\":\"Failed\",\"taskType\":\"upload\",\"errorMessage\":\"disk full\"}]"}]"#;
    mount_action(
        &server,
        "GetContextInfo",
        json!({
            "RequestId": "req-info",
            "Success": true,
            "Data": {"ContextStatus": failed},
        }),
    )
    .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session.context().sync(None, None, None).await;
    assert!(!result.success);
}

#[tokio::test]
async fn test_sync_ignores_non_transfer_tasks() {
    let server = wiremock::MockServer::start().await;
    mount_action(
        &server,
        "SyncContext",
        json!({"RequestId": "req-sync", "Success": true}),
    )
    .await;
    // Only a recycle task; no upload/download tasks means done.
    let recycle = r#"[{"type":"data","data":"[{\"contextId\":\"c1\",\"status\":\"Running\",\"taskType\":\"recycle\"}]"}]"#;
    mount_action(
        &server,
        "GetContextInfo",
        json!({
            "RequestId": "req-info",
            "Success": true,
            "Data": {"ContextStatus": recycle},
        }),
    )
    .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session.context().sync(None, None, None).await;
    assert!(result.success);
}

#[tokio::test]
async fn test_sync_polls_until_pending_settles() {
    let server = wiremock::MockServer::start().await;
    mount_action(
        &server,
        "SyncContext",
        json!({"RequestId": "req-sync", "Success": true}),
    )
    .await;
    let pending = r#"[{"type":"data","data":"[{\"contextId\":\"c1\",\"status\":\"Running\",\"taskType\":\"upload\"}]"}]"#;
    wiremock::Mock::given(wiremock::matchers::method("POST"))
        .and(wiremock::matchers::query_param("Action", "GetContextInfo"))
        .respond_with(
            wiremock::ResponseTemplate::new(200).set_body_json(json!({
                "RequestId": "req-info",
                "Success": true,
                "Data": {"ContextStatus": pending},
            })),
        )
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_action(
        &server,
        "GetContextInfo",
        json!({
            "RequestId": "req-info",
            "Success": true,
            "Data": {"ContextStatus": NESTED_STATUS},
        }),
    )
    .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session
        .context()
        .sync_with(None, None, None, 10, Duration::from_millis(50))
        .await;
    assert!(result.success);
}
