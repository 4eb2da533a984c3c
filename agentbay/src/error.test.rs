use super::*;

#[test]
fn test_transport_classification() {
    assert!(AgentBayError::Network("timed out".into()).is_transport());
    assert!(
        AgentBayError::HttpStatus {
            status: 502,
            body: "bad gateway".into(),
        }
        .is_transport()
    );
    assert!(!AgentBayError::Validation("bad page".into()).is_transport());
    assert!(!AgentBayError::ClearanceTimeout("60s".into()).is_transport());
}

#[test]
fn test_display_includes_status() {
    let err = AgentBayError::HttpStatus {
        status: 400,
        body: "nope".into(),
    };
    assert_eq!(err.to_string(), "http status 400: nope");
}

#[test]
fn test_json_error_converts_to_parse() {
    let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    let err: AgentBayError = json_err.into();
    assert!(matches!(err, AgentBayError::Parse(_)));
}
