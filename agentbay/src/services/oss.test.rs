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
async fn test_env_init_sends_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(query_param("Action", "CallMcpTool"))
        .and(body_string_contains("Name=oss_env_init"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tool_response("req-1", "ok", false)))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session
        .oss()
        .env_init("ak", "sk", Some("sts"), Some("oss-cn-shanghai.aliyuncs.com"), None)
        .await;
    assert!(result.success, "{}", result.error_message);
}

#[tokio::test]
async fn test_upload_and_download() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(query_param("Action", "CallMcpTool"))
        .and(body_string_contains("Name=oss_upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tool_response(
            "req-up",
            "uploaded to oss://bucket/obj",
            false,
        )))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session.oss().upload("bucket", "obj", "/tmp/file").await;
    assert!(result.success);
    assert_eq!(
        result.data.unwrap(),
        serde_json::json!("uploaded to oss://bucket/obj")
    );
}

#[tokio::test]
async fn test_download_anonymous_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(query_param("Action", "CallMcpTool"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tool_response(
            "req-down",
            "404 not found",
            true,
        )))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session
        .oss()
        .download_anonymous("https://example.test/file", "/tmp/file")
        .await;
    assert!(!result.success);
    assert_eq!(result.error_message, "404 not found");
}
