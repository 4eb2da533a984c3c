//! Session handle and lifecycle operations bound to one session id.

use std::sync::Arc;
use std::sync::RwLock;
use std::time::Duration;
use std::time::Instant;

use serde_json::Value;

use crate::agent_bay::Core;
use crate::api::types::DeleteSessionAsyncRequest;
use crate::api::types::GetLabelRequest;
use crate::api::types::GetLinkRequest;
use crate::api::types::GetMcpResourceRequest;
use crate::api::types::PauseSessionAsyncRequest;
use crate::api::types::ResumeSessionAsyncRequest;
use crate::api::types::SetLabelRequest;
use crate::response::DeleteResult;
use crate::response::OperationResult;
use crate::response::SessionStateResult;
use crate::services::agent::Agent;
use crate::services::browser::Browser;
use crate::services::code::Code;
use crate::services::command::Command;
use crate::services::computer::Computer;
use crate::services::filesystem::FileSystem;
use crate::services::mobile::Mobile;
use crate::services::oss::Oss;
use crate::context_manager::ContextManager;
use crate::tool::McpTool;

const DELETE_POLL_TIMEOUT: Duration = Duration::from_secs(50);
const DELETE_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default budget for pause/resume status polling.
pub const STATE_POLL_TIMEOUT: Duration = Duration::from_secs(600);
/// Default interval for pause/resume status polling.
pub const STATE_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Connection details for a session, from `GetMcpResource`.
#[derive(Debug, Clone, Default)]
pub struct SessionInfo {
    pub session_id: String,
    pub resource_url: String,
    pub app_id: String,
    pub auth_code: String,
    pub connection_properties: String,
    pub resource_id: String,
    pub resource_type: String,
    pub ticket: String,
}

#[derive(Debug)]
pub(crate) struct SessionState {
    pub(crate) session_id: String,
    pub(crate) is_vpc: bool,
    pub(crate) network_interface_ip: String,
    pub(crate) http_port: String,
    pub(crate) token: String,
    pub(crate) resource_url: String,
    pub(crate) image_id: String,
    pub(crate) enable_browser_replay: bool,
    pub(crate) mcp_tools: RwLock<Vec<McpTool>>,
}

impl SessionState {
    pub(crate) fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            is_vpc: false,
            network_interface_ip: String::new(),
            http_port: String::new(),
            token: String::new(),
            resource_url: String::new(),
            image_id: String::new(),
            enable_browser_replay: true,
            mcp_tools: RwLock::new(Vec::new()),
        }
    }
}

/// A sandboxed runtime leased from the cloud.
///
/// Cloneable handle; all clones address the same remote session. The owning
/// [`crate::AgentBay`] keeps sessions in its map until deletion is
/// confirmed.
#[derive(Debug, Clone)]
pub struct Session {
    core: Arc<Core>,
    state: Arc<SessionState>,
}

impl Session {
    pub(crate) fn new(core: Arc<Core>, state: Arc<SessionState>) -> Self {
        Self { core, state }
    }

    pub(crate) fn core(&self) -> &Core {
        &self.core
    }

    pub(crate) fn core_arc(&self) -> Arc<Core> {
        Arc::clone(&self.core)
    }

    /// The opaque session id.
    pub fn session_id(&self) -> &str {
        &self.state.session_id
    }

    /// Whether tool calls bypass the control plane.
    pub fn is_vpc(&self) -> bool {
        self.state.is_vpc
    }

    /// Network interface IP of the in-session endpoint (VPC sessions).
    pub fn network_interface_ip(&self) -> &str {
        &self.state.network_interface_ip
    }

    /// HTTP port of the in-session endpoint (VPC sessions).
    pub fn http_port(&self) -> &str {
        &self.state.http_port
    }

    /// Session token used by the VPC endpoint.
    pub fn token(&self) -> &str {
        &self.state.token
    }

    /// URL for accessing the session resource.
    pub fn resource_url(&self) -> &str {
        &self.state.resource_url
    }

    /// Image the session was created from.
    pub fn image_id(&self) -> &str {
        &self.state.image_id
    }

    /// Whether browser recording is enabled for this session.
    pub fn enable_browser_replay(&self) -> bool {
        self.state.enable_browser_replay
    }

    /// Snapshot of the cached tool catalog.
    pub fn mcp_tools(&self) -> Vec<McpTool> {
        self.state
            .mcp_tools
            .read()
            .map(|tools| tools.clone())
            .unwrap_or_default()
    }

    pub(crate) fn set_mcp_tools(&self, tools: Vec<McpTool>) {
        if let Ok(mut slot) = self.state.mcp_tools.write() {
            *slot = tools;
        }
    }

    pub(crate) fn find_server_for_tool(&self, tool_name: &str) -> Option<String> {
        let tools = self.state.mcp_tools.read().ok()?;
        tools
            .iter()
            .find(|tool| tool.name == tool_name)
            .map(|tool| tool.server.clone())
            .filter(|server| !server.is_empty())
    }

    /// Filesystem operations inside the session.
    pub fn file_system(&self) -> FileSystem<'_> {
        FileSystem::new(self)
    }

    /// Shell command execution.
    pub fn command(&self) -> Command<'_> {
        Command::new(self)
    }

    /// Code execution.
    pub fn code(&self) -> Code<'_> {
        Code::new(self)
    }

    /// Desktop UI automation.
    pub fn computer(&self) -> Computer<'_> {
        Computer::new(self)
    }

    /// Mobile UI automation and device configuration.
    pub fn mobile(&self) -> Mobile<'_> {
        Mobile::new(self)
    }

    /// Object-storage transfer through the session.
    pub fn oss(&self) -> Oss<'_> {
        Oss::new(self)
    }

    /// Browser bootstrap plumbing.
    pub fn browser(&self) -> Browser<'_> {
        Browser::new(self)
    }

    /// Task-oriented agent module.
    pub fn agent(&self) -> Agent<'_> {
        Agent::new(self)
    }

    /// Per-session context synchronization.
    pub fn context(&self) -> ContextManager<'_> {
        ContextManager::new(self)
    }

    /// Set the labels for this session.
    ///
    /// `labels` must be a non-empty JSON object with non-empty string keys
    /// and values; anything else is rejected client-side.
    pub async fn set_labels(&self, labels: Value) -> OperationResult {
        if let Some(error) = validate_labels(&labels) {
            return OperationResult::failure("", error);
        }

        let labels_json = match serde_json::to_string(&labels) {
            Ok(json) => json,
            Err(e) => return OperationResult::failure("", format!("Invalid labels: {e}")),
        };

        let request = SetLabelRequest {
            authorization: self.core.authorization(),
            session_id: self.state.session_id.clone(),
            labels: labels_json,
        };

        match self.core.api.call(&request).await {
            Ok(body) => {
                if let Some(error) = body.api_error() {
                    return OperationResult::failure(body.request_id, error);
                }
                tracing::info!(
                    session_id = %self.state.session_id,
                    request_id = %body.request_id,
                    "SetLabel"
                );
                OperationResult::success(body.request_id, None)
            }
            Err(e) => OperationResult::failure(
                "",
                format!(
                    "Failed to set labels for session {}: {e}",
                    self.state.session_id
                ),
            ),
        }
    }

    /// Get the labels for this session as a JSON object.
    pub async fn get_labels(&self) -> OperationResult {
        let request = GetLabelRequest {
            authorization: self.core.authorization(),
            session_id: self.state.session_id.clone(),
        };

        match self.core.api.call(&request).await {
            Ok(body) => {
                if let Some(error) = body.api_error() {
                    return OperationResult::failure(body.request_id, error);
                }
                let labels = body
                    .data()
                    .get("Labels")
                    .and_then(Value::as_str)
                    .and_then(|raw| serde_json::from_str::<Value>(raw).ok())
                    .unwrap_or_else(|| Value::Object(Default::default()));
                OperationResult::success(body.request_id, Some(labels))
            }
            Err(e) => OperationResult::failure(
                "",
                format!(
                    "Failed to get labels for session {}: {e}",
                    self.state.session_id
                ),
            ),
        }
    }

    /// Get connection details via `GetMcpResource`.
    ///
    /// A missing session (`InvalidMcpSession.NotFound`) is an expected
    /// condition and reports a plain "not found" failure.
    pub async fn info(&self) -> OperationResult {
        let request = GetMcpResourceRequest {
            authorization: self.core.authorization(),
            session_id: self.state.session_id.clone(),
        };

        tracing::debug!(session_id = %self.state.session_id, "GetMcpResource");

        let body = match self.core.api.call(&request).await {
            Ok(body) => body,
            Err(e) => {
                let text = e.to_string();
                if text.contains("InvalidMcpSession.NotFound") || text.contains("NotFound") {
                    tracing::info!(session_id = %self.state.session_id, "session not found");
                    return OperationResult::failure(
                        "",
                        format!("Session {} not found", self.state.session_id),
                    );
                }
                return OperationResult::failure(
                    "",
                    format!(
                        "Failed to get session info for session {}: {e}",
                        self.state.session_id
                    ),
                );
            }
        };

        if let Some(error) = body.api_error() {
            return OperationResult::failure(body.request_id, error);
        }

        let data = body.data();
        let mut info = SessionInfo {
            session_id: string_field(data, "SessionId"),
            resource_url: string_field(data, "ResourceUrl"),
            ..Default::default()
        };
        if let Some(desktop) = data.get("DesktopInfo") {
            info.app_id = string_field(desktop, "AppId");
            info.auth_code = string_field(desktop, "AuthCode");
            info.connection_properties = string_field(desktop, "ConnectionProperties");
            info.resource_id = string_field(desktop, "ResourceId");
            info.resource_type = string_field(desktop, "ResourceType");
            info.ticket = string_field(desktop, "Ticket");
        }

        let payload = serde_json::json!({
            "session_id": info.session_id,
            "resource_url": info.resource_url,
            "app_id": info.app_id,
            "auth_code": info.auth_code,
            "connection_properties": info.connection_properties,
            "resource_id": info.resource_id,
            "resource_type": info.resource_type,
            "ticket": info.ticket,
        });

        OperationResult::success(body.request_id, Some(payload))
    }

    /// Get a link associated with this session.
    ///
    /// `port`, when given, must fall in `[30100, 30199]`.
    pub async fn get_link(
        &self,
        protocol_type: Option<&str>,
        port: Option<i32>,
        options: Option<&str>,
    ) -> OperationResult {
        if let Some(port) = port {
            if !(30100..=30199).contains(&port) {
                return OperationResult::failure(
                    "",
                    format!(
                        "Invalid port value: {port}. Port must be an integer in the range [30100, 30199]."
                    ),
                );
            }
        }

        let request = GetLinkRequest {
            authorization: self.core.authorization(),
            session_id: self.state.session_id.clone(),
            protocol_type: protocol_type.map(str::to_string),
            port,
            options: options.map(str::to_string),
        };

        match self.core.api.call(&request).await {
            Ok(body) => {
                if let Some(error) = body.api_error() {
                    return OperationResult::failure(body.request_id, error);
                }
                let url = body
                    .data()
                    .get("Url")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                OperationResult::success(body.request_id, Some(Value::String(url)))
            }
            Err(e) => OperationResult::failure("", format!("Failed to get link: {e}")),
        }
    }

    /// Delete this session and wait for the remote status to turn terminal.
    ///
    /// With `sync_context`, a full context sync runs first; sync failures are
    /// logged and do not block deletion.
    pub async fn delete(&self, sync_context: bool) -> DeleteResult {
        if sync_context {
            tracing::info!(session_id = %self.state.session_id, "syncing contexts before deletion");
            let sync_result = self.context().sync(None, None, None).await;
            if !sync_result.success {
                tracing::warn!(
                    session_id = %self.state.session_id,
                    "context sync completed with failures"
                );
            }
        }

        let request = DeleteSessionAsyncRequest {
            authorization: self.core.authorization(),
            session_id: self.state.session_id.clone(),
        };

        let body = match self.core.api.call(&request).await {
            Ok(body) => body,
            Err(e) => {
                return DeleteResult {
                    request_id: String::new(),
                    success: false,
                    error_message: format!(
                        "Failed to delete session {}: {e}",
                        self.state.session_id
                    ),
                };
            }
        };

        let request_id = body.request_id.clone();
        if let Some(error) = body.api_error() {
            return DeleteResult {
                request_id,
                success: false,
                error_message: error,
            };
        }

        tracing::info!(session_id = %self.state.session_id, "waiting for session deletion");
        let start = Instant::now();
        loop {
            if start.elapsed() >= DELETE_POLL_TIMEOUT {
                let error_message = format!(
                    "Timeout waiting for session deletion after {}s",
                    DELETE_POLL_TIMEOUT.as_secs()
                );
                tracing::warn!(session_id = %self.state.session_id, "{error_message}");
                return DeleteResult {
                    request_id,
                    success: false,
                    error_message,
                };
            }

            let status = self.core.get_session(&self.state.session_id).await;
            if !status.success {
                if is_not_found(&status.code, &status.error_message, status.http_status_code) {
                    tracing::info!(
                        session_id = %self.state.session_id,
                        "session deleted (not found)"
                    );
                    break;
                }
                tracing::debug!(
                    session_id = %self.state.session_id,
                    error = %status.error_message,
                    "get session error, will retry"
                );
            } else if let Some(data) = &status.data {
                tracing::debug!(session_id = %self.state.session_id, status = %data.status, "poll");
                if data.status == "FINISH" {
                    tracing::info!(session_id = %self.state.session_id, "session deleted");
                    break;
                }
            }

            tokio::time::sleep(DELETE_POLL_INTERVAL).await;
        }

        DeleteResult {
            request_id,
            success: true,
            error_message: String::new(),
        }
    }

    /// Pause this session and wait until it reports `PAUSED`.
    pub async fn pause(&self) -> SessionStateResult {
        self.pause_with(STATE_POLL_TIMEOUT, STATE_POLL_INTERVAL).await
    }

    /// Pause with an explicit poll budget.
    pub async fn pause_with(&self, timeout: Duration, poll_interval: Duration) -> SessionStateResult {
        let triggered = self.pause_async().await;
        if !triggered.success {
            return triggered;
        }
        self.await_status(triggered.request_id, "PAUSED", "PAUSING", timeout, poll_interval)
            .await
    }

    /// Trigger the pause without waiting; status is `PAUSING` on success.
    pub async fn pause_async(&self) -> SessionStateResult {
        let request = PauseSessionAsyncRequest {
            authorization: self.core.authorization(),
            session_id: self.state.session_id.clone(),
        };
        tracing::debug!(session_id = %self.state.session_id, "PauseSessionAsync");
        self.trigger_state_change(self.core.api.call(&request).await, "PAUSING")
    }

    /// Resume this session and wait until it reports `RUNNING`.
    pub async fn resume(&self) -> SessionStateResult {
        self.resume_with(STATE_POLL_TIMEOUT, STATE_POLL_INTERVAL).await
    }

    /// Resume with an explicit poll budget.
    pub async fn resume_with(
        &self,
        timeout: Duration,
        poll_interval: Duration,
    ) -> SessionStateResult {
        let triggered = self.resume_async().await;
        if !triggered.success {
            return triggered;
        }
        self.await_status(triggered.request_id, "RUNNING", "RESUMING", timeout, poll_interval)
            .await
    }

    /// Trigger the resume without waiting; status is `RESUMING` on success.
    pub async fn resume_async(&self) -> SessionStateResult {
        let request = ResumeSessionAsyncRequest {
            authorization: self.core.authorization(),
            session_id: self.state.session_id.clone(),
        };
        tracing::debug!(session_id = %self.state.session_id, "ResumeSessionAsync");
        self.trigger_state_change(self.core.api.call(&request).await, "RESUMING")
    }

    fn trigger_state_change(
        &self,
        outcome: crate::error::Result<crate::api::ApiResponseBody>,
        transient_status: &str,
    ) -> SessionStateResult {
        match outcome {
            Ok(body) => {
                let request_id = body.request_id.clone();
                if !body.succeeded(false) {
                    let code = body.code.clone().unwrap_or_default();
                    let message = body.message.clone().unwrap_or_default();
                    let error_message = if code.is_empty() && message.is_empty() {
                        "Unknown error".to_string()
                    } else {
                        format!("[{code}] {message}")
                    };
                    return SessionStateResult {
                        request_id,
                        success: false,
                        error_message,
                        code,
                        message,
                        http_status_code: body.http_status_code.unwrap_or_default(),
                        status: None,
                    };
                }
                SessionStateResult {
                    request_id,
                    success: true,
                    status: Some(transient_status.to_string()),
                    ..Default::default()
                }
            }
            Err(e) => SessionStateResult {
                request_id: String::new(),
                success: false,
                error_message: format!(
                    "Failed to change state of session {}: {e}",
                    self.state.session_id
                ),
                ..Default::default()
            },
        }
    }

    async fn await_status(
        &self,
        request_id: String,
        target: &str,
        transient: &str,
        timeout: Duration,
        poll_interval: Duration,
    ) -> SessionStateResult {
        let start = Instant::now();
        while start.elapsed() < timeout {
            let status = self.core.get_session(&self.state.session_id).await;
            if status.success {
                if let Some(data) = &status.data {
                    if data.status == target {
                        return SessionStateResult {
                            request_id,
                            success: true,
                            status: Some(target.to_string()),
                            ..Default::default()
                        };
                    }
                    if data.status == "ERROR" || data.status == "FAILED" {
                        return SessionStateResult {
                            request_id,
                            success: false,
                            error_message: format!(
                                "Session entered error state: {}",
                                data.status
                            ),
                            status: Some(data.status.clone()),
                            ..Default::default()
                        };
                    }
                }
            }
            tokio::time::sleep(poll_interval).await;
        }

        SessionStateResult {
            request_id,
            success: false,
            error_message: format!(
                "Timed out after {} seconds waiting for session to reach {target}",
                timeout.as_secs()
            ),
            status: Some(transient.to_string()),
            ..Default::default()
        }
    }
}

/// Classify a `GetSession` failure as "the session no longer exists".
///
/// NOT_FOUND arrives as an error code, as HTTP 400 with textual markers, or
/// as plain "not found" text; all three mean the deletion took effect.
pub(crate) fn is_not_found(code: &str, message: &str, http_status: u32) -> bool {
    if code == "InvalidMcpSession.NotFound" {
        return true;
    }
    let message_lower = message.to_lowercase();
    if http_status == 400
        && (message_lower.contains("not found")
            || message.contains("NotFound")
            || code.to_lowercase().contains("not found"))
    {
        return true;
    }
    message_lower.contains("not found")
}

fn validate_labels(labels: &Value) -> Option<String> {
    if labels.is_array() {
        return Some("Labels cannot be an array. Please provide a valid labels object.".into());
    }
    let Some(map) = labels.as_object() else {
        return Some(
            "Labels cannot be null, undefined, or invalid type. Please provide a valid labels object."
                .into(),
        );
    };
    if map.is_empty() {
        return Some("Labels cannot be empty. Please provide at least one label.".into());
    }
    for (key, value) in map {
        if key.trim().is_empty() {
            return Some("Label keys cannot be empty. Please provide valid keys.".into());
        }
        match value.as_str() {
            Some(text) if !text.trim().is_empty() => {}
            _ => {
                return Some("Label values cannot be empty. Please provide valid values.".into());
            }
        }
    }
    None
}

fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
#[path = "session.test.rs"]
mod tests;
