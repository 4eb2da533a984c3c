use super::*;
use crate::session_params::BrowserContext;
use crate::test_support::client_for;
use crate::test_support::mount_action;
use crate::test_support::tool_response;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::body_string_contains;
use wiremock::matchers::method;
use wiremock::matchers::query_param;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

fn created_body(session_id: &str) -> serde_json::Value {
    json!({
        "RequestId": "req-create",
        "Success": true,
        "Data": {
            "SessionId": session_id,
            "ResourceUrl": "https://resource.test/session",
        },
    })
}

#[test]
fn test_missing_api_key_rejected() {
    // Neither an explicit key nor the environment variable.
    let previous = std::env::var(API_KEY_ENV).ok();
    unsafe { std::env::remove_var(API_KEY_ENV) };
    let result = AgentBay::new("", None);
    if let Some(value) = previous {
        unsafe { std::env::set_var(API_KEY_ENV, value) };
    }
    assert!(matches!(result, Err(AgentBayError::Authentication(_))));
}

#[tokio::test]
async fn test_create_call_delete_happy_path() {
    let server = MockServer::start().await;
    mount_action(&server, "CreateMcpSession", created_body("s-1")).await;
    mount_action(&server, "CallMcpTool", tool_response("req-tool", "hi\n", false)).await;
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

    let created = client.create(CreateSessionParams::new()).await;
    assert!(created.success, "{}", created.error_message);
    let session = created.session.clone().expect("session should be present");
    assert!(client.has_session("s-1"));

    let shell = session
        .command()
        .execute_command("echo hi")
        .await;
    assert!(shell.success);
    assert_eq!(shell.output, "hi\n");

    let deleted = client.delete(&session, false).await;
    assert!(deleted.success);
    assert!(!client.has_session("s-1"));

    // Three distinct, non-empty request ids.
    let ids = [created.request_id, shell.request_id, deleted.request_id];
    assert!(ids.iter().all(|id| !id.is_empty()));
    assert_eq!(
        ids.iter().collect::<std::collections::HashSet<_>>().len(),
        3
    );
}

#[tokio::test]
async fn test_create_reports_api_error() {
    let server = MockServer::start().await;
    mount_action(
        &server,
        "CreateMcpSession",
        json!({
            "RequestId": "req-create",
            "Success": false,
            "Code": "QuotaExceeded",
            "Message": "no capacity",
        }),
    )
    .await;

    let client = client_for(&server);
    let result = client.create(CreateSessionParams::new()).await;
    assert!(!result.success);
    assert_eq!(result.error_message, "[QuotaExceeded] no capacity");
    assert_eq!(result.request_id, "req-create");
}

#[tokio::test]
async fn test_create_reports_data_level_failure() {
    let server = MockServer::start().await;
    mount_action(
        &server,
        "CreateMcpSession",
        json!({
            "RequestId": "req-create",
            "Success": true,
            "Data": {"Success": false, "ErrMsg": "image not found"},
        }),
    )
    .await;

    let client = client_for(&server);
    let result = client.create(CreateSessionParams::new()).await;
    assert!(!result.success);
    assert_eq!(result.error_message, "image not found");
}

#[tokio::test]
async fn test_create_sends_browser_context_binding() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(query_param("Action", "CreateMcpSession"))
        .and(body_string_contains("PersistenceDataList"))
        .and(body_string_contains("ctx-browser"))
        .respond_with(ResponseTemplate::new(200).set_body_json(created_body("s-2")))
        .mount(&server)
        .await;
    // Context-sync bindings make create wait for their completion; report
    // no pending items.
    mount_action(
        &server,
        "GetContextInfo",
        json!({
            "RequestId": "req-info",
            "Success": true,
            "Data": {"ContextStatus": ""},
        }),
    )
    .await;

    let client = client_for(&server);
    let params =
        CreateSessionParams::new().with_browser_context(BrowserContext::new("ctx-browser", true));
    let result = client.create(params).await;
    assert!(result.success, "{}", result.error_message);
}

#[tokio::test]
async fn test_create_vpc_fetches_tool_catalog() {
    let server = MockServer::start().await;
    let body = json!({
        "RequestId": "req-create",
        "Success": true,
        "Data": {
            "SessionId": "s-vpc",
            "NetworkInterfaceIp": "10.0.0.5",
            "HttpPort": "8080",
            "Token": "tok",
        },
    });
    mount_action(&server, "CreateMcpSession", body).await;
    let tools_json =
        serde_json::to_string(&json!([{"name": "shell", "server": "shell-server"}])).unwrap();
    mount_action(
        &server,
        "ListMcpTools",
        json!({"RequestId": "req-tools", "Success": true, "Data": tools_json}),
    )
    .await;

    let client = client_for(&server);
    let result = client
        .create(CreateSessionParams::new().with_is_vpc(true))
        .await;
    assert!(result.success, "{}", result.error_message);
    let session = result.session.expect("session should be present");
    assert!(session.is_vpc());
    assert_eq!(session.network_interface_ip(), "10.0.0.5");
    assert_eq!(session.http_port(), "8080");
    assert_eq!(session.mcp_tools().len(), 1);
}

#[tokio::test]
async fn test_get_builds_readonly_handle() {
    let server = MockServer::start().await;
    mount_action(
        &server,
        "GetSession",
        json!({
            "RequestId": "req-get",
            "Success": true,
            "Data": {
                "SessionId": "s-9",
                "VpcResource": true,
                "NetworkInterfaceIp": "10.1.1.1",
                "HttpPort": "9000",
                "Token": "tok-9",
                "ResourceUrl": "https://resource.test/s-9",
                "Status": "RUNNING",
            },
        }),
    )
    .await;

    let client = client_for(&server);
    let result = client.get("s-9").await;
    assert!(result.success);
    let session = result.session.expect("session should be present");
    assert!(session.is_vpc());
    assert_eq!(session.resource_url(), "https://resource.test/s-9");
    // Read-only shape: not cached in the owned map.
    assert!(!client.has_session("s-9"));
}

#[tokio::test]
async fn test_get_requires_session_id() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    let result = client.get("  ").await;
    assert!(!result.success);
    assert_eq!(result.error_message, "session_id is required");
    assert_eq!(result.request_id, "");
}

#[tokio::test]
async fn test_list_single_page() {
    let server = MockServer::start().await;
    mount_action(
        &server,
        "ListSession",
        json!({
            "RequestId": "req-list",
            "Success": true,
            "Data": [{"SessionId": "s-1"}, {"SessionId": "s-2"}],
            "NextToken": "tok-next",
            "MaxResults": 10,
            "TotalCount": 12,
        }),
    )
    .await;

    let client = client_for(&server);
    let result = client.list(None, None, None).await;
    assert!(result.success);
    assert_eq!(result.session_ids, vec!["s-1", "s-2"]);
    assert_eq!(result.next_token, "tok-next");
    assert_eq!(result.total_count, 12);
}

#[tokio::test]
async fn test_list_unreachable_page() {
    let server = MockServer::start().await;
    // One page, no continuation token.
    mount_action(
        &server,
        "ListSession",
        json!({
            "RequestId": "req-list",
            "Success": true,
            "Data": [{"SessionId": "s-1"}],
            "TotalCount": 1,
        }),
    )
    .await;

    let client = client_for(&server);
    let result = client.list(None, Some(5), None).await;
    assert!(!result.success);
    assert_eq!(
        result.error_message,
        "Cannot reach page 5: No more pages available"
    );
    assert!(result.session_ids.is_empty());
}

#[tokio::test]
async fn test_list_rejects_page_zero() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    let result = client.list(None, Some(0), Some(10)).await;
    assert!(!result.success);
    assert!(result.error_message.contains("Page number must be >= 1"));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[test]
fn test_browser_sync_policy_white_lists() {
    let policy = browser_sync_policy(true);
    let bw_list = policy.bw_list.expect("bw list should be present");
    let paths: Vec<&str> = bw_list
        .white_lists
        .iter()
        .map(|wl| wl.path.as_str())
        .collect();
    assert_eq!(
        paths,
        vec!["/Local State", "/Default/Cookies", "/Default/Cookies-journal"]
    );
    assert!(policy.upload_policy.expect("upload policy").auto_upload);
    // The rest of the tree keeps defaults.
    assert!(policy.download_policy.is_some());
    assert!(policy.recycle_policy.is_some());
}
