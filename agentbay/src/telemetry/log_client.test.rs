use super::*;
use pretty_assertions::assert_eq;
use wiremock::matchers::header;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

fn credentials(token: &str) -> StsToken {
    StsToken {
        access_key_id: "STS.ak".into(),
        access_key_secret: "secret".into(),
        security_token: token.into(),
        expiration: String::new(),
    }
}

fn item(key: &str, value: &str) -> LogItem {
    let mut item = LogItem::new();
    item.insert(key.to_string(), value.to_string());
    item
}

#[tokio::test]
async fn test_put_logs_sends_batch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/logstores/store/track"))
        .and(header("x-log-apiversion", "0.6.0"))
        .and(header("x-acs-security-token", "tok-1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = LogStoreClient::new(server.uri(), "proj", "store", credentials("tok-1"));
    client
        .put_logs(&[item("owner", "session"), item("owner", "context")])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_put_logs_surfaces_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&server)
        .await;

    let client = LogStoreClient::new(server.uri(), "proj", "store", credentials("tok-1"));
    let err = client.put_logs(&[item("owner", "x")]).await.unwrap_err();
    match err {
        AgentBayError::HttpStatus { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "unauthorized");
        }
        other => panic!("expected HttpStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn test_update_credentials_applies_to_next_put() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-acs-security-token", "tok-2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = LogStoreClient::new(server.uri(), "proj", "store", credentials("tok-1"));
    client.update_credentials(credentials("tok-2"));
    client.put_logs(&[item("owner", "x")]).await.unwrap();
}
