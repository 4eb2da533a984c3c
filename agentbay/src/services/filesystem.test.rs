use super::*;
use crate::test_support::client_for;
use crate::test_support::make_session;
use crate::test_support::mount_action;
use crate::test_support::tool_response;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::body_string_contains;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::matchers::query_param;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

#[test]
fn test_parse_directory_listing_lines() {
    let text = "[DIR] src\n[FILE] Cargo.toml\n[FILE] README.md\n";
    let entries = parse_directory_listing(text);
    assert_eq!(entries.len(), 3);
    assert!(entries[0].is_directory);
    assert_eq!(entries[0].name, "src");
    assert!(entries[1].is_file);
    assert_eq!(entries[2].name, "README.md");
}

#[test]
fn test_parse_directory_listing_json() {
    let text = r#"[{"name": "src", "isDirectory": true}, {"name": "a.txt", "isFile": true, "size": 12}]"#;
    let entries = parse_directory_listing(text);
    assert_eq!(entries.len(), 2);
    assert!(entries[0].is_directory);
    assert_eq!(entries[1].size, 12);
}

#[test]
fn test_parse_file_info_lines() {
    let text = "name: a.txt\npath: /tmp/a.txt\nsize: 1024\nisFile: true\nisDirectory: false\npermissions: rw-r--r--\nmodified: 2026-07-30";
    let info = parse_file_info(text);
    assert_eq!(info.name, "a.txt");
    assert_eq!(info.size, 1024);
    assert!(info.is_file);
    assert!(!info.is_directory);
    assert_eq!(info.permissions, "rw-r--r--");
}

#[test]
fn test_parse_multiple_files_records() {
    let text = "/tmp/a.txt:\nalpha\n\n---\n/tmp/b.txt:\nbeta\nlines";
    let contents = parse_multiple_files(text);
    assert_eq!(contents.len(), 2);
    assert_eq!(contents["/tmp/a.txt"], "alpha");
    assert_eq!(contents["/tmp/b.txt"], "beta\nlines");
}

#[tokio::test]
async fn test_write_file_rejects_bad_mode() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session.file_system().write_file("/tmp/a", "data", "replace").await;
    assert!(!result.success);
    assert!(result.error_message.contains("Invalid mode"));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_read_file_single_chunk() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(query_param("Action", "CallMcpTool"))
        .and(body_string_contains("Name=get_file_info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tool_response(
            "req-info",
            "name: a.txt\nsize: 5\nisFile: true",
            false,
        )))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(query_param("Action", "CallMcpTool"))
        .and(body_string_contains("Name=read_file"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(tool_response("req-read", "hello", false)),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session.file_system().read_file("/tmp/a.txt").await;
    assert!(result.success, "{}", result.error_message);
    assert_eq!(result.content, "hello");
}

#[tokio::test]
async fn test_read_file_propagates_missing_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(query_param("Action", "CallMcpTool"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tool_response(
            "req-info",
            "No such file or directory",
            true,
        )))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session.file_system().read_file("/missing").await;
    assert!(!result.success);
    assert!(result.error_message.contains("No such file"));
}

#[tokio::test]
async fn test_search_files_splits_matches() {
    let server = MockServer::start().await;
    mount_action(
        &server,
        "CallMcpTool",
        tool_response("req-search", "/tmp/a.log\n/tmp/b.log\n", false),
    )
    .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session.file_system().search_files("/tmp", "*.log").await;
    assert!(result.success);
    assert_eq!(result.matches, vec!["/tmp/a.log", "/tmp/b.log"]);
}

#[tokio::test]
async fn test_search_files_no_matches_sentinel() {
    let server = MockServer::start().await;
    mount_action(
        &server,
        "CallMcpTool",
        tool_response("req-search", "No matches found", false),
    )
    .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session.file_system().search_files("/tmp", "*.rs").await;
    assert!(result.success);
    assert!(result.matches.is_empty());
}

#[tokio::test]
async fn test_upload_file_puts_and_syncs() {
    let server = MockServer::start().await;
    let upload_url = format!("{}/put-object", server.uri());
    mount_action(
        &server,
        "GetContextFileUploadUrl",
        json!({
            "RequestId": "req-url",
            "Success": true,
            "Data": {"Url": upload_url, "ExpireTime": 3600},
        }),
    )
    .await;
    Mock::given(method("PUT"))
        .and(path("/put-object"))
        .respond_with(ResponseTemplate::new(200).insert_header("etag", "\"abc123\""))
        .mount(&server)
        .await;
    mount_action(
        &server,
        "SyncContext",
        json!({"RequestId": "req-sync", "Success": true}),
    )
    .await;
    let status = r#"[{"type":"data","data":"[{\"contextId\":\"ctx-1\",\"path\":\"/data/a.bin\",\"status\":\"Success\",\"taskType\":\"download\"}]"}]"#;
    mount_action(
        &server,
        "GetContextInfo",
        json!({
            "RequestId": "req-info",
            "Success": true,
            "Data": {"ContextStatus": status},
        }),
    )
    .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session
        .file_system()
        .upload_file("ctx-1", "/data/a.bin", b"payload".to_vec())
        .await;
    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.bytes_sent, 7);
    assert_eq!(result.http_status, Some(200));
    assert_eq!(result.etag.as_deref(), Some("\"abc123\""));
    assert_eq!(result.request_id_upload_url, "req-url");
    assert_eq!(result.request_id_sync, "req-sync");
}

#[tokio::test]
async fn test_download_file_syncs_then_fetches() {
    let server = MockServer::start().await;
    mount_action(
        &server,
        "SyncContext",
        json!({"RequestId": "req-sync", "Success": true}),
    )
    .await;
    let status = r#"[{"type":"data","data":"[{\"contextId\":\"ctx-1\",\"path\":\"/data/a.bin\",\"status\":\"Success\",\"taskType\":\"upload\"}]"}]"#;
    mount_action(
        &server,
        "GetContextInfo",
        json!({
            "RequestId": "req-info",
            "Success": true,
            "Data": {"ContextStatus": status},
        }),
    )
    .await;
    let download_url = format!("{}/get-object", server.uri());
    mount_action(
        &server,
        "GetContextFileDownloadUrl",
        json!({
            "RequestId": "req-url",
            "Success": true,
            "Data": {"Url": download_url, "ExpireTime": 3600},
        }),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/get-object"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"payload".to_vec()))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session
        .file_system()
        .download_file("ctx-1", "/data/a.bin")
        .await;
    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.bytes_received, 7);
    assert_eq!(result.content, b"payload");
}
