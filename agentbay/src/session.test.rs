use super::*;
use crate::test_support::client_for;
use crate::test_support::make_session;
use crate::test_support::mount_action;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::method;
use wiremock::matchers::query_param;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

#[test]
fn test_not_found_classifier() {
    assert!(is_not_found("InvalidMcpSession.NotFound", "", 200));
    assert!(is_not_found("", "session not found", 400));
    assert!(is_not_found("", "SessionNotFound marker", 400));
    assert!(is_not_found("", "Session s-1 not found", 0));
    assert!(!is_not_found("Throttling", "too many requests", 400));
    assert!(!is_not_found("", "internal error", 500));
}

#[test]
fn test_validate_labels_rejects_bad_shapes() {
    assert!(validate_labels(&json!([{}]))
        .unwrap()
        .contains("cannot be an array"));
    assert!(validate_labels(&json!(null))
        .unwrap()
        .contains("invalid type"));
    assert!(validate_labels(&json!("text"))
        .unwrap()
        .contains("invalid type"));
    assert!(validate_labels(&json!({}))
        .unwrap()
        .contains("cannot be empty"));
    assert!(validate_labels(&json!({"": "v"})).unwrap().contains("keys"));
    assert!(validate_labels(&json!({"k": ""})).unwrap().contains("values"));
    assert!(validate_labels(&json!({"k": 1})).unwrap().contains("values"));
    assert!(validate_labels(&json!({"env": "prod"})).is_none());
}

#[tokio::test]
async fn test_set_labels_validation_short_circuits() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session.set_labels(json!({})).await;
    assert!(!result.success);
    assert_eq!(result.request_id, "");
    assert!(result.error_message.contains("Labels cannot be empty"));
    // Nothing reached the server.
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_set_and_get_labels_round_trip() {
    let server = MockServer::start().await;
    mount_action(&server, "SetLabel", json!({"RequestId": "req-set", "Success": true})).await;
    mount_action(
        &server,
        "GetLabel",
        json!({
            "RequestId": "req-get",
            "Success": true,
            "Data": {"Labels": "{\"env\":\"prod\"}"},
        }),
    )
    .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let set = session.set_labels(json!({"env": "prod"})).await;
    assert!(set.success);
    assert_eq!(set.request_id, "req-set");

    let get = session.get_labels().await;
    assert!(get.success);
    assert_eq!(get.request_id, "req-get");
    assert_eq!(get.data.unwrap(), json!({"env": "prod"}));
}

#[tokio::test]
async fn test_get_link_validates_port_range() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    for bad in [0, 30099, 30200, 65535] {
        let result = session.get_link(None, Some(bad), None).await;
        assert!(!result.success);
        assert!(result.error_message.contains("[30100, 30199]"));
    }
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_get_link_returns_url() {
    let server = MockServer::start().await;
    mount_action(
        &server,
        "GetLink",
        json!({
            "RequestId": "req-link",
            "Success": true,
            "Data": {"Url": "wss://link.test/session"},
        }),
    )
    .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session.get_link(Some("wss"), Some(30150), None).await;
    assert!(result.success);
    assert_eq!(result.data.unwrap(), json!("wss://link.test/session"));
}

#[tokio::test]
async fn test_info_maps_desktop_fields() {
    let server = MockServer::start().await;
    mount_action(
        &server,
        "GetMcpResource",
        json!({
            "RequestId": "req-info",
            "Success": true,
            "Data": {
                "SessionId": "s-1",
                "ResourceUrl": "https://resource.test",
                "DesktopInfo": {
                    "AppId": "app-1",
                    "AuthCode": "auth-1",
                    "ConnectionProperties": "{}",
                    "ResourceId": "res-1",
                    "ResourceType": "desktop",
                    "Ticket": "ticket-1",
                },
            },
        }),
    )
    .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session.info().await;
    assert!(result.success);
    let data = result.data.unwrap();
    assert_eq!(data["session_id"], "s-1");
    assert_eq!(data["resource_id"], "res-1");
    assert_eq!(data["ticket"], "ticket-1");
}

#[tokio::test]
async fn test_info_not_found_is_benign() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(query_param("Action", "GetMcpResource"))
        .respond_with(ResponseTemplate::new(400).set_body_string(
            r#"{"RequestId":"req-nf","Code":"InvalidMcpSession.NotFound","Message":"session not found"}"#,
        ))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-gone");

    let result = session.info().await;
    assert!(!result.success);
    assert_eq!(result.error_message, "Session s-gone not found");
}

#[tokio::test]
async fn test_delete_polls_until_finish() {
    let server = MockServer::start().await;
    mount_action(
        &server,
        "DeleteSessionAsync",
        json!({"RequestId": "req-del", "Success": true}),
    )
    .await;
    mount_action(
        &server,
        "GetSession",
        json!({
            "RequestId": "req-get",
            "Success": true,
            "Data": {"SessionId": "s-1", "Status": "FINISH"},
        }),
    )
    .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session.delete(false).await;
    assert!(result.success, "{}", result.error_message);
    assert_eq!(result.request_id, "req-del");
}

#[tokio::test]
async fn test_delete_treats_not_found_as_success() {
    let server = MockServer::start().await;
    mount_action(
        &server,
        "DeleteSessionAsync",
        json!({"RequestId": "req-del", "Success": true}),
    )
    .await;
    Mock::given(method("POST"))
        .and(query_param("Action", "GetSession"))
        .respond_with(ResponseTemplate::new(400).set_body_string(
            r#"{"RequestId":"req-get","Code":"InvalidMcpSession.NotFound","Message":"session not found"}"#,
        ))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session.delete(false).await;
    assert!(result.success);
}

#[tokio::test]
async fn test_delete_reports_trigger_failure() {
    let server = MockServer::start().await;
    mount_action(
        &server,
        "DeleteSessionAsync",
        json!({
            "RequestId": "req-del",
            "Success": false,
            "Code": "Forbidden",
            "Message": "no permission",
        }),
    )
    .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session.delete(false).await;
    assert!(!result.success);
    assert_eq!(result.error_message, "[Forbidden] no permission");
}

#[tokio::test]
async fn test_pause_polls_to_paused() {
    let server = MockServer::start().await;
    mount_action(
        &server,
        "PauseSessionAsync",
        json!({"RequestId": "req-pause", "Success": true}),
    )
    .await;
    mount_action(
        &server,
        "GetSession",
        json!({
            "RequestId": "req-get",
            "Success": true,
            "Data": {"SessionId": "s-1", "Status": "PAUSED"},
        }),
    )
    .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session
        .pause_with(Duration::from_secs(5), Duration::from_millis(50))
        .await;
    assert!(result.success);
    assert_eq!(result.status.as_deref(), Some("PAUSED"));
    assert_eq!(result.request_id, "req-pause");
}

#[tokio::test]
async fn test_pause_async_reports_transient_status() {
    let server = MockServer::start().await;
    mount_action(
        &server,
        "PauseSessionAsync",
        json!({"RequestId": "req-pause", "Success": true}),
    )
    .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session.pause_async().await;
    assert!(result.success);
    assert_eq!(result.status.as_deref(), Some("PAUSING"));
}

#[tokio::test]
async fn test_resume_stops_on_error_state() {
    let server = MockServer::start().await;
    mount_action(
        &server,
        "ResumeSessionAsync",
        json!({"RequestId": "req-resume", "Success": true}),
    )
    .await;
    mount_action(
        &server,
        "GetSession",
        json!({
            "RequestId": "req-get",
            "Success": true,
            "Data": {"SessionId": "s-1", "Status": "ERROR"},
        }),
    )
    .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session
        .resume_with(Duration::from_secs(5), Duration::from_millis(50))
        .await;
    assert!(!result.success);
    assert_eq!(result.status.as_deref(), Some("ERROR"));
    assert!(result.error_message.contains("error state"));
}
