//! The AgentBay client: session lifecycle against the control plane.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;

use crate::api::client::parse_error_body;
use crate::api::types::CreateMcpSessionRequest;
use crate::api::types::GetSessionRequest;
use crate::api::types::ListSessionRequest;
use crate::api::types::PersistenceData;
use crate::api::ApiClient;
use crate::api::ApiConfig;
use crate::config::load_config;
use crate::config::Config;
use crate::config::API_KEY_ENV;
use crate::context::ContextService;
use crate::context_sync::BWList;
use crate::context_sync::ContextSync;
use crate::context_sync::SyncPolicy;
use crate::context_sync::UploadPolicy;
use crate::context_sync::WhiteList;
use crate::error::AgentBayError;
use crate::error::Result;
use crate::response::DeleteResult;
use crate::response::GetSessionData;
use crate::response::GetSessionResult;
use crate::response::SessionListResult;
use crate::response::SessionResult;
use crate::response::SessionStateResult;
use crate::session::Session;
use crate::session::SessionState;
use crate::session_params::CreateSessionParams;
use crate::session_params::BROWSER_DATA_PATH;
use crate::session_params::MOBILE_INFO_DEFAULT_PATH;

const CREATE_SYNC_MAX_RETRIES: u32 = 150;
const CREATE_SYNC_INTERVAL: Duration = Duration::from_millis(2_000);

/// Shared innards of the client, reachable from every session handle.
#[derive(Debug)]
pub(crate) struct Core {
    pub(crate) api: ApiClient,
    pub(crate) api_key: String,
    pub(crate) region_id: String,
    /// Plain HTTP client for VPC endpoints and presigned-URL transfer.
    pub(crate) http: reqwest::Client,
    /// Owned session handles; guarded insert/remove only, never held
    /// across I/O.
    pub(crate) sessions: Mutex<HashMap<String, Arc<SessionState>>>,
}

impl Core {
    pub(crate) fn authorization(&self) -> String {
        format!("Bearer {}", self.api_key)
    }

    /// Fetch raw session metadata.
    ///
    /// NOT_FOUND is an expected outcome here (deletion polling relies on
    /// it), reported as a failure envelope without diagnostics noise.
    pub(crate) async fn get_session(&self, session_id: &str) -> GetSessionResult {
        let request = GetSessionRequest {
            authorization: self.authorization(),
            session_id: session_id.to_string(),
        };

        match self.api.call(&request).await {
            Ok(body) => {
                let request_id = body.request_id.clone();
                let http_status_code = body.http_status_code.unwrap_or_default();
                let code = body.code.clone().unwrap_or_default();
                let success = body.succeeded(false);

                if !success && !code.is_empty() {
                    let message = body
                        .message
                        .clone()
                        .filter(|m| !m.is_empty())
                        .unwrap_or_else(|| "Unknown error".to_string());
                    return GetSessionResult {
                        request_id,
                        http_status_code,
                        code: code.clone(),
                        success: false,
                        data: None,
                        error_message: format!("[{code}] {message}"),
                    };
                }

                let data = body
                    .data
                    .as_ref()
                    .and_then(|d| serde_json::from_value::<GetSessionData>(d.clone()).ok());

                GetSessionResult {
                    request_id,
                    http_status_code,
                    code,
                    success,
                    data,
                    error_message: String::new(),
                }
            }
            Err(AgentBayError::HttpStatus { status, body }) => {
                if let Some(parsed) = parse_error_body(&body) {
                    let code = parsed.code.unwrap_or_default();
                    let message = parsed.message.unwrap_or_default();
                    if code == "InvalidMcpSession.NotFound" {
                        tracing::info!(session_id, "session not found");
                        return GetSessionResult {
                            request_id: parsed.request_id,
                            http_status_code: status as u32,
                            code,
                            success: false,
                            data: None,
                            error_message: format!("Session {session_id} not found"),
                        };
                    }
                    tracing::error!(session_id, code = %code, "GetSession failed");
                    return GetSessionResult {
                        request_id: parsed.request_id,
                        http_status_code: status as u32,
                        code: code.clone(),
                        success: false,
                        data: None,
                        error_message: format!("[{code}] {message}"),
                    };
                }
                GetSessionResult {
                    http_status_code: status as u32,
                    success: false,
                    error_message: format!(
                        "Failed to get session {session_id}: http status {status}"
                    ),
                    ..Default::default()
                }
            }
            Err(e) => {
                tracing::error!(session_id, error = %e, "GetSession failed");
                GetSessionResult {
                    success: false,
                    error_message: format!("Failed to get session {session_id}: {e}"),
                    ..Default::default()
                }
            }
        }
    }
}

/// Entry point for the AgentBay cloud runtime.
///
/// Owns the transport, the session map, and the context service. Cheap to
/// clone.
#[derive(Debug, Clone)]
pub struct AgentBay {
    core: Arc<Core>,
}

impl AgentBay {
    /// Create a client with an explicit API key and optional configuration.
    pub fn new(api_key: impl Into<String>, config: Option<Config>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Self::from_env_with_config(config);
        }
        Self::build(api_key, config)
    }

    /// Create a client using the `AGENTBAY_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with_config(None)
    }

    fn from_env_with_config(config: Option<Config>) -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV).unwrap_or_default();
        if api_key.is_empty() {
            return Err(AgentBayError::Authentication(format!(
                "API key is required. Provide it as a parameter or set the {API_KEY_ENV} environment variable"
            )));
        }
        Self::build(api_key, config)
    }

    fn build(api_key: String, config: Option<Config>) -> Result<Self> {
        let config = load_config(config, None);
        let api = ApiClient::new(ApiConfig::from_config(&config))?;
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| AgentBayError::Configuration(e.to_string()))?;

        Ok(Self {
            core: Arc::new(Core {
                api,
                api_key,
                region_id: config.region_id,
                http,
                sessions: Mutex::new(HashMap::new()),
            }),
        })
    }

    pub(crate) fn core(&self) -> &Arc<Core> {
        &self.core
    }

    /// Persistent-volume management.
    pub fn context(&self) -> ContextService {
        ContextService::new(Arc::clone(&self.core))
    }

    /// Whether the client currently caches a handle for `session_id`.
    pub fn has_session(&self, session_id: &str) -> bool {
        self.core
            .sessions
            .lock()
            .map(|sessions| sessions.contains_key(session_id))
            .unwrap_or(false)
    }

    /// Create a new session.
    ///
    /// On success the handle is cached; if the request declared context
    /// syncs the call waits for their completion, and VPC sessions get
    /// their tool catalog fetched before the result is returned.
    pub async fn create(&self, params: CreateSessionParams) -> SessionResult {
        let mut params = params;

        // Mobile simulation mounts its device-info context like any other
        // sync binding.
        let simulate = params
            .extra_configs
            .as_ref()
            .and_then(|extra| extra.mobile.as_ref())
            .and_then(|mobile| mobile.simulate_config.clone())
            .filter(|sim| sim.simulate);
        if let Some(sim) = &simulate {
            if let Some(context_id) = &sim.simulated_context_id {
                tracing::info!(%context_id, "adding context sync for mobile simulation");
                params
                    .context_syncs
                    .push(ContextSync::new(context_id.clone(), MOBILE_INFO_DEFAULT_PATH));
            }
        }

        let mut request = CreateMcpSessionRequest {
            authorization: self.core.authorization(),
            ..Default::default()
        };

        if params.enable_browser_replay == Some(false) {
            request.enable_record = Some(false);
        }

        request.sdk_stats = Some(format!(
            r#"{{"source":"sdk","sdk_language":"rust","sdk_version":"{}","is_release":{},"framework":"{}"}}"#,
            env!("CARGO_PKG_VERSION"),
            !cfg!(debug_assertions),
            params.framework,
        ));

        if !self.core.region_id.is_empty() {
            request.login_region_id = Some(self.core.region_id.clone());
        }
        if let Some(policy_id) = &params.policy_id {
            request.mcp_policy_id = Some(policy_id.clone());
        }
        request.vpc_resource = Some(params.is_vpc);

        let mut persistence = Vec::new();
        for sync in &params.context_syncs {
            let policy = match &sync.policy {
                Some(policy) => match policy.to_json_string() {
                    Ok(json) => Some(json),
                    Err(e) => return SessionResult::failure("", format!("Invalid sync policy: {e}")),
                },
                None => None,
            };
            persistence.push(PersistenceData {
                context_id: sync.context_id.clone(),
                path: sync.path.clone(),
                policy,
            });
        }

        if let Some(browser_context) = &params.browser_context {
            let policy = browser_sync_policy(browser_context.auto_upload);
            let policy_json = match policy.to_json_string() {
                Ok(json) => json,
                Err(e) => return SessionResult::failure("", format!("Invalid sync policy: {e}")),
            };
            persistence.push(PersistenceData {
                context_id: browser_context.context_id.clone(),
                path: BROWSER_DATA_PATH.to_string(),
                policy: Some(policy_json),
            });
            tracing::info!(
                total = persistence.len(),
                "added browser context to persistence data list"
            );
        }

        let needs_context_sync = !persistence.is_empty();
        if needs_context_sync {
            match serde_json::to_string(&persistence) {
                Ok(json) => request.persistence_data_list = Some(json),
                Err(e) => {
                    return SessionResult::failure(
                        "",
                        format!("Invalid persistence data list: {e}"),
                    );
                }
            }
        }

        if !params.labels.is_empty() {
            match serde_json::to_string(&params.labels) {
                Ok(json) => request.labels = Some(json),
                Err(e) => return SessionResult::failure("", format!("Invalid labels: {e}")),
            }
        }
        if let Some(image_id) = &params.image_id {
            request.image_id = Some(image_id.clone());
        }
        if let Some(extra) = &params.extra_configs {
            match serde_json::to_string(extra) {
                Ok(json) => request.extra_configs = Some(json),
                Err(e) => return SessionResult::failure("", format!("Invalid extra configs: {e}")),
            }
        }

        tracing::debug!(body = %request.masked_json(), "CreateMcpSession request");

        let body = match self.core.api.call(&request).await {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, "CreateMcpSession failed");
                return SessionResult::failure("", format!("Failed to create session: {e}"));
            }
        };

        let request_id = body.request_id.clone();
        if let Some(error) = body.api_error() {
            return SessionResult::failure(request_id, error);
        }

        let data = body.data();
        if data.get("Success").and_then(Value::as_bool) == Some(false) {
            let error = data
                .get("ErrMsg")
                .and_then(Value::as_str)
                .unwrap_or("Session creation failed");
            return SessionResult::failure(request_id, error);
        }

        let Some(session_id) = data.get("SessionId").and_then(Value::as_str) else {
            return SessionResult::failure(request_id, "SessionId not found in response");
        };

        tracing::info!(session_id, request_id = %request_id, "session created");

        let mut state = SessionState::new(session_id);
        state.is_vpc = params.is_vpc;
        if let Some(ip) = data.get("NetworkInterfaceIp").and_then(Value::as_str) {
            state.network_interface_ip = ip.to_string();
        }
        if let Some(port) = data.get("HttpPort") {
            state.http_port = match port {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
        }
        if let Some(token) = data.get("Token").and_then(Value::as_str) {
            state.token = token.to_string();
        }
        state.resource_url = data
            .get("ResourceUrl")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        state.enable_browser_replay = params.enable_browser_replay.unwrap_or(true);
        state.image_id = params.image_id.clone().unwrap_or_default();

        let state = Arc::new(state);
        let session = Session::new(Arc::clone(&self.core), Arc::clone(&state));

        if let Some(mobile) = params.extra_configs.as_ref().and_then(|e| e.mobile.as_ref()) {
            session.mobile().configure(mobile).await;
        }

        if let Ok(mut sessions) = self.core.sessions.lock() {
            sessions.insert(session_id.to_string(), state);
        }

        if params.is_vpc {
            tracing::info!("fetching tool catalog for VPC session");
            let tools = session.list_mcp_tools(None).await;
            if tools.tools.is_empty() {
                tracing::warn!("no tools fetched for VPC session; tool calls will fail closed");
            }
        }

        if needs_context_sync {
            self.wait_for_context_synchronization(&session).await;
        }

        if let Some(sim) = &simulate {
            if !sim.simulate_path.is_empty() {
                session
                    .mobile()
                    .run_simulation(&sim.simulate_path, sim.simulate_mode)
                    .await;
            }
        }

        SessionResult {
            request_id,
            success: true,
            error_message: String::new(),
            session: Some(session),
        }
    }

    /// Wait for every context item of a fresh session to settle.
    async fn wait_for_context_synchronization(&self, session: &Session) {
        tracing::info!("waiting for context synchronization");
        for attempt in 0..CREATE_SYNC_MAX_RETRIES {
            let info = session.context().info().await;

            let mut all_completed = true;
            let mut has_failure = false;
            for item in &info.context_status_data {
                tracing::info!(
                    context_id = %item.context_id,
                    status = %item.status,
                    path = %item.path,
                    "context status"
                );
                if item.status != "Success" && item.status != "Failed" {
                    all_completed = false;
                    break;
                }
                if item.status == "Failed" {
                    has_failure = true;
                    tracing::error!(
                        context_id = %item.context_id,
                        error = %item.error_message,
                        "context synchronization failed"
                    );
                }
            }

            if all_completed || info.context_status_data.is_empty() {
                if has_failure {
                    tracing::warn!("context synchronization completed with failures");
                } else {
                    tracing::info!("context synchronization complete");
                }
                return;
            }

            tracing::debug!(
                attempt = attempt + 1,
                max = CREATE_SYNC_MAX_RETRIES,
                "waiting for context synchronization"
            );
            tokio::time::sleep(CREATE_SYNC_INTERVAL).await;
        }
    }

    /// Fetch raw session metadata by id.
    pub async fn get_session(&self, session_id: &str) -> GetSessionResult {
        self.core.get_session(session_id).await
    }

    /// Get a session handle by id.
    ///
    /// Builds a fresh read-only handle from `GetSession` data; the handle is
    /// not inserted into the owned session map.
    pub async fn get(&self, session_id: &str) -> SessionResult {
        if session_id.trim().is_empty() {
            return SessionResult::failure("", "session_id is required");
        }

        let result = self.core.get_session(session_id).await;
        if !result.success {
            let error = if result.error_message.is_empty() {
                "Unknown error".to_string()
            } else {
                result.error_message
            };
            return SessionResult::failure(
                result.request_id,
                format!("Failed to get session {session_id}: {error}"),
            );
        }

        let mut state = SessionState::new(session_id);
        if let Some(data) = &result.data {
            state.is_vpc = data.vpc_resource;
            state.network_interface_ip = data.network_interface_ip.clone();
            state.http_port = data.http_port.clone();
            state.token = data.token.clone();
            state.resource_url = data.resource_url.clone();
        }

        SessionResult {
            request_id: result.request_id,
            success: true,
            error_message: String::new(),
            session: Some(Session::new(Arc::clone(&self.core), Arc::new(state))),
        }
    }

    /// List session ids filtered by labels, with page-based pagination.
    ///
    /// Pages beyond the first are reached by walking the token chain;
    /// asking for a page past the end reports
    /// `Cannot reach page N: No more pages available`.
    pub async fn list(
        &self,
        labels: Option<&HashMap<String, String>>,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> SessionListResult {
        let empty = HashMap::new();
        let labels = labels.unwrap_or(&empty);
        let limit = limit.unwrap_or(10);

        if let Some(page) = page {
            if page < 1 {
                return SessionListResult::failure(
                    "",
                    format!("Cannot reach page {page}: Page number must be >= 1"),
                    limit,
                );
            }
        }

        let labels_json = match serde_json::to_string(labels) {
            Ok(json) => json,
            Err(e) => {
                return SessionListResult::failure("", format!("Invalid labels: {e}"), limit);
            }
        };

        // Walk pages 1..page-1 chaining tokens.
        let mut next_token = String::new();
        if let Some(page) = page {
            let mut current_page = 1;
            while current_page < page {
                let request = ListSessionRequest {
                    authorization: self.core.authorization(),
                    labels: labels_json.clone(),
                    max_results: limit,
                    next_token: (!next_token.is_empty()).then(|| next_token.clone()),
                };

                let body = match self.core.api.call(&request).await {
                    Ok(body) => body,
                    Err(e) => {
                        return SessionListResult::failure(
                            "",
                            format!("Failed to list sessions: {e}"),
                            limit,
                        );
                    }
                };

                if !body.succeeded(false) {
                    let error = body
                        .message
                        .clone()
                        .or(body.code.clone())
                        .unwrap_or_else(|| "Unknown error".to_string());
                    return SessionListResult::failure(
                        body.request_id,
                        format!("Cannot reach page {page}: {error}"),
                        limit,
                    );
                }

                next_token = body.next_token.clone().unwrap_or_default();
                if next_token.is_empty() {
                    let mut result = SessionListResult::failure(
                        body.request_id.clone(),
                        format!("Cannot reach page {page}: No more pages available"),
                        limit,
                    );
                    result.total_count = body.total_count.unwrap_or(0);
                    return result;
                }
                current_page += 1;
            }
        }

        let request = ListSessionRequest {
            authorization: self.core.authorization(),
            labels: labels_json,
            max_results: limit,
            next_token: (!next_token.is_empty()).then_some(next_token),
        };

        tracing::debug!(labels = %request.labels, max_results = limit, "ListSession");

        let body = match self.core.api.call(&request).await {
            Ok(body) => body,
            Err(e) => {
                return SessionListResult::failure(
                    "",
                    format!("Failed to list sessions: {e}"),
                    limit,
                );
            }
        };

        if !body.succeeded(false) {
            let error = body
                .message
                .clone()
                .or(body.code.clone())
                .unwrap_or_else(|| "Unknown error".to_string());
            return SessionListResult::failure(
                body.request_id,
                format!("Failed to list sessions: {error}"),
                limit,
            );
        }

        let mut session_ids = Vec::new();
        if let Some(Value::Array(items)) = &body.data {
            for item in items {
                if let Some(session_id) = item.get("SessionId").and_then(Value::as_str) {
                    session_ids.push(session_id.to_string());
                }
            }
        }

        SessionListResult {
            request_id: body.request_id.clone(),
            success: true,
            error_message: String::new(),
            session_ids,
            next_token: body.next_token.clone().unwrap_or_default(),
            max_results: body.max_results.unwrap_or(limit),
            total_count: body.total_count.unwrap_or(0),
        }
    }

    /// Delete a session, optionally syncing its contexts first, and drop it
    /// from the owned map once the remote confirms.
    pub async fn delete(&self, session: &Session, sync_context: bool) -> DeleteResult {
        let result = session.delete(sync_context).await;
        if result.success {
            if let Ok(mut sessions) = self.core.sessions.lock() {
                sessions.remove(session.session_id());
            }
        }
        result
    }

    /// Pause a session and wait for `PAUSED`.
    pub async fn pause(&self, session: &Session) -> SessionStateResult {
        session.pause().await
    }

    /// Trigger a pause without waiting.
    pub async fn pause_async(&self, session: &Session) -> SessionStateResult {
        session.pause_async().await
    }

    /// Resume a session and wait for `RUNNING`.
    pub async fn resume(&self, session: &Session) -> SessionStateResult {
        session.resume().await
    }

    /// Trigger a resume without waiting.
    pub async fn resume_async(&self, session: &Session) -> SessionStateResult {
        session.resume_async().await
    }
}

/// Default policy for the synthetic browser-data binding: upload per the
/// caller's choice, white-listed to the browser profile files.
fn browser_sync_policy(auto_upload: bool) -> SyncPolicy {
    let white_lists = ["/Local State", "/Default/Cookies", "/Default/Cookies-journal"]
        .iter()
        .map(|path| WhiteList {
            path: (*path).to_string(),
            exclude_paths: Vec::new(),
        })
        .collect();

    SyncPolicy {
        upload_policy: Some(UploadPolicy {
            auto_upload,
            ..Default::default()
        }),
        bw_list: Some(BWList { white_lists }),
        ..Default::default()
    }
}

#[cfg(test)]
#[path = "agent_bay.test.rs"]
mod tests;
