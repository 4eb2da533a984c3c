use super::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::body_string_contains;
use wiremock::matchers::method;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

fn token_body() -> serde_json::Value {
    json!({
        "Code": "Success",
        "RequestId": "req-token",
        "Success": true,
        "Data": {
            "StsToken": {
                "AccessKeyId": "STS.ak",
                "AccessKeySecret": "secret",
                "SecurityToken": "token",
                "Expiration": "2026-08-01T12:00:00Z",
                "TraceSlsInfo": {
                    "Project": "proj",
                    "LogStore": "store",
                    "ServerUrl": "sls.example.test",
                },
            },
        },
    })
}

#[test]
fn test_parse_token_response_full() {
    let response = parse_token_response(&token_body().to_string()).unwrap();
    assert!(response.success);
    assert_eq!(response.request_id, "req-token");
    let sts = response.sts_token.unwrap();
    assert_eq!(sts.access_key_id, "STS.ak");
    assert_eq!(sts.security_token, "token");
    let sls = response.trace_sls_info.unwrap();
    assert_eq!(sls.project, "proj");
    assert_eq!(sls.server_url, "sls.example.test");
}

#[test]
fn test_parse_token_response_requires_code_and_data() {
    assert!(parse_token_response(r#"{"Code":"X"}"#).is_err());
    assert!(parse_token_response(r#"{"Data":{}}"#).is_err());
    assert!(parse_token_response("not json").is_err());
}

#[test]
fn test_parse_token_response_requires_sts_token() {
    let body = r#"{"Code":"Success","Data":{}}"#;
    assert!(matches!(
        parse_token_response(body),
        Err(AgentBayError::Parse(_))
    ));
}

#[test]
fn test_fresh_manager_has_invalid_token() {
    let manager = TokenManager::new();
    assert!(manager.is_token_invalid());
    assert!(!manager.uuid().is_empty());
}

#[tokio::test]
async fn test_request_token_posts_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("Action=GetTerminalReportToken"))
        .and(body_string_contains("product=wyota"))
        .and(body_string_contains("NetworkType=internet"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
        .mount(&server)
        .await;

    let manager = TokenManager::with_endpoint(server.uri());
    let response = manager
        .request_token()
        .await
        .unwrap()
        .expect("no request should be in flight");
    assert!(response.success);
    // A successful fetch stamps the token age.
    assert!(!manager.is_token_invalid());
}

#[tokio::test]
async fn test_request_token_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let manager = TokenManager::with_endpoint(server.uri());
    let result = manager.request_token().await;
    assert!(matches!(
        result,
        Err(AgentBayError::HttpStatus { status: 403, .. })
    ));
    assert!(manager.is_token_invalid());
}
