use super::*;
use crate::api::types::GetSessionRequest;
use pretty_assertions::assert_eq;
use wiremock::matchers::body_string_contains;
use wiremock::matchers::header;
use wiremock::matchers::method;
use wiremock::matchers::query_param;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

fn make_client(endpoint: &str) -> ApiClient {
    let config = ApiConfig {
        endpoint: endpoint.to_string(),
        read_timeout_ms: 5_000,
        connect_timeout_ms: 5_000,
        signature_algorithm: "v2".to_string(),
        region_id: "cn-shanghai".to_string(),
    };
    ApiClient::new(config).expect("client creation should succeed")
}

async fn mock_get_session(template: ResponseTemplate) -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(query_param("Action", "GetSession"))
        .and(query_param("Version", API_VERSION))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("SessionId=s-1"))
        .respond_with(template)
        .mount(&server)
        .await;
    let client = make_client(&server.uri());
    (server, client)
}

fn get_session_request() -> GetSessionRequest {
    GetSessionRequest {
        authorization: "Bearer key".into(),
        session_id: "s-1".into(),
    }
}

#[test]
fn test_empty_endpoint_rejected() {
    let config = ApiConfig {
        endpoint: String::new(),
        read_timeout_ms: 1,
        connect_timeout_ms: 1,
        signature_algorithm: "v2".to_string(),
        region_id: String::new(),
    };
    assert!(matches!(
        ApiClient::new(config),
        Err(AgentBayError::Configuration(_))
    ));
}

#[tokio::test]
async fn test_call_parses_envelope() {
    let body = serde_json::json!({
        "RequestId": "req-42",
        "Success": true,
        "Data": {"Status": "RUNNING"}
    });
    let (_server, client) = mock_get_session(ResponseTemplate::new(200).set_body_json(&body)).await;

    let response = client.call(&get_session_request()).await.unwrap();
    assert_eq!(response.request_id, "req-42");
    assert_eq!(response.data()["Status"], "RUNNING");
}

#[tokio::test]
async fn test_business_failure_returned_verbatim() {
    let body = serde_json::json!({
        "RequestId": "req-7",
        "Success": false,
        "Code": "Throttling",
        "Message": "too many requests",
        "HttpStatusCode": 200
    });
    let (_server, client) = mock_get_session(ResponseTemplate::new(200).set_body_json(&body)).await;

    let response = client.call(&get_session_request()).await.unwrap();
    assert!(!response.succeeded(true));
    assert_eq!(response.api_error().unwrap(), "[Throttling] too many requests");
}

#[tokio::test]
async fn test_non_2xx_maps_to_http_status() {
    let (_server, client) = mock_get_session(ResponseTemplate::new(400).set_body_string(
        r#"{"RequestId":"req-9","Code":"InvalidMcpSession.NotFound","Message":"session not found"}"#,
    ))
    .await;

    let err = client.call(&get_session_request()).await.unwrap_err();
    match err {
        AgentBayError::HttpStatus { status, body } => {
            assert_eq!(status, 400);
            let parsed = parse_error_body(&body).unwrap();
            assert_eq!(parsed.code.as_deref(), Some("InvalidMcpSession.NotFound"));
        }
        other => panic!("expected HttpStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_maps_to_parse() {
    let (_server, client) =
        mock_get_session(ResponseTemplate::new(200).set_body_string("{broken")).await;

    let err = client.call(&get_session_request()).await.unwrap_err();
    assert!(matches!(err, AgentBayError::Parse(_)));
}

#[tokio::test]
async fn test_connection_refused_maps_to_network() {
    // Nothing listens on this port.
    let client = make_client("http://127.0.0.1:9");
    let err = client.call(&get_session_request()).await.unwrap_err();
    assert!(matches!(err, AgentBayError::Network(_)));
}

#[test]
fn test_parse_error_body_requires_code() {
    assert!(parse_error_body(r#"{"RequestId":"r"}"#).is_none());
    assert!(parse_error_body("plain text").is_none());
    assert!(parse_error_body(r#"{"Code":"X","Message":"y"}"#).is_some());
}
