use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_get_session_data_parses_wire_names() {
    let data: GetSessionData = serde_json::from_str(
        r#"{
            "AppInstanceId": "app-1",
            "ResourceId": "res-1",
            "SessionId": "s-1",
            "Success": true,
            "HttpPort": "30199",
            "NetworkInterfaceIp": "10.0.0.8",
            "Token": "tok",
            "VpcResource": true,
            "ResourceUrl": "https://example.test/s-1",
            "Status": "RUNNING"
        }"#,
    )
    .unwrap();
    assert_eq!(data.session_id, "s-1");
    assert_eq!(data.http_port, "30199");
    assert!(data.vpc_resource);
    assert_eq!(data.status, "RUNNING");
}

#[test]
fn test_get_session_data_defaults() {
    let data: GetSessionData = serde_json::from_str(r#"{"SessionId": "s-2"}"#).unwrap();
    assert_eq!(data.session_id, "s-2");
    assert!(!data.vpc_resource);
    assert_eq!(data.status, "");
}

#[test]
fn test_failure_constructors_leave_request_id_empty_when_client_side() {
    let op = OperationResult::failure("", "bad input");
    assert!(!op.success);
    assert_eq!(op.request_id, "");
    assert_eq!(op.error_message, "bad input");

    let list = SessionListResult::failure("", "bad page", 10);
    assert_eq!(list.max_results, 10);
    assert!(list.session_ids.is_empty());
}

#[test]
fn test_success_constructors() {
    let op = OperationResult::success("req-1", Some(serde_json::json!({"k": "v"})));
    assert!(op.success);
    assert_eq!(op.request_id, "req-1");
    assert_eq!(op.error_message, "");

    let flag = BoolResult::success("req-2");
    assert_eq!(flag.data, Some(true));
}
