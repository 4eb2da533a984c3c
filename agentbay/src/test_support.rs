//! Shared helpers for unit tests.

use std::sync::Arc;

use serde_json::json;
use serde_json::Value;
use wiremock::matchers::method;
use wiremock::matchers::query_param;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

use crate::agent_bay::AgentBay;
use crate::config::Config;
use crate::session::Session;
use crate::session::SessionState;
use crate::tool::McpTool;

pub(crate) fn client_for(server: &MockServer) -> AgentBay {
    let config = Config::new("", server.uri(), 5_000);
    AgentBay::new("test-api-key", Some(config)).expect("client creation should succeed")
}

pub(crate) fn make_session(client: &AgentBay, session_id: &str) -> Session {
    Session::new(
        Arc::clone(client.core()),
        Arc::new(SessionState::new(session_id)),
    )
}

pub(crate) fn make_vpc_session(
    client: &AgentBay,
    session_id: &str,
    ip: &str,
    port: &str,
    token: &str,
    tools: Vec<McpTool>,
) -> Session {
    let mut state = SessionState::new(session_id);
    state.is_vpc = true;
    state.network_interface_ip = ip.to_string();
    state.http_port = port.to_string();
    state.token = token.to_string();
    let session = Session::new(Arc::clone(client.core()), Arc::new(state));
    session.set_mcp_tools(tools);
    session
}

/// Mount a mock answering one control-plane action.
pub(crate) async fn mount_action(server: &MockServer, action: &str, body: Value) {
    Mock::given(method("POST"))
        .and(query_param("Action", action))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(server)
        .await;
}

/// A `CallMcpTool` envelope whose data carries one text content element.
pub(crate) fn tool_response(request_id: &str, text: &str, is_error: bool) -> Value {
    json!({
        "RequestId": request_id,
        "Success": true,
        "Data": {
            "content": [{"type": "text", "text": text}],
            "isError": is_error,
        },
    })
}
