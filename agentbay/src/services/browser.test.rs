use super::*;
use crate::test_support::client_for;
use crate::test_support::make_session;
use crate::test_support::mount_action;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::body_string_contains;
use wiremock::matchers::method;
use wiremock::matchers::query_param;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

#[tokio::test]
async fn test_initialize_succeeds_when_port_present() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(query_param("Action", "InitBrowser"))
        .and(body_string_contains("PersistentPath"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "RequestId": "req-init",
            "Success": true,
            "Data": {"Port": 9223},
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session.browser().initialize(None).await;
    assert!(result.success, "{}", result.error_message);
    assert_eq!(result.request_id, "req-init");
}

#[tokio::test]
async fn test_initialize_fails_without_port() {
    let server = MockServer::start().await;
    mount_action(
        &server,
        "InitBrowser",
        json!({"RequestId": "req-init", "Success": true, "Data": {}}),
    )
    .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session.browser().initialize(Some(json!({"useStealth": true}))).await;
    assert!(!result.success);
    assert!(result.error_message.contains("initialization failed"));
}

#[tokio::test]
async fn test_cdp_url() {
    let server = MockServer::start().await;
    mount_action(
        &server,
        "GetCdpLink",
        json!({
            "RequestId": "req-cdp",
            "Success": true,
            "Data": {"Url": "ws://10.0.0.5:9223/devtools/browser"},
        }),
    )
    .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session.browser().cdp_url(None).await;
    assert!(result.success);
    assert_eq!(
        result.data.unwrap(),
        json!("ws://10.0.0.5:9223/devtools/browser")
    );
}
