//! Persistent-context management.
//!
//! Contexts are named volumes that outlive sessions; bulk payload I/O goes
//! through presigned URLs, never through the control plane itself. Clearing
//! is asynchronous on the server: `clear_async` starts it, `get_clear_status`
//! reads `context.state`, and `clear` wraps both in a poll loop.

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use serde::Deserialize;
use serde_json::Value;

use crate::agent_bay::Core;
use crate::api::types::ClearContextRequest;
use crate::api::types::DeleteContextFileRequest;
use crate::api::types::DeleteContextRequest;
use crate::api::types::DescribeContextFilesRequest;
use crate::api::types::GetContextFileDownloadUrlRequest;
use crate::api::types::GetContextFileUploadUrlRequest;
use crate::api::types::GetContextRequest;
use crate::api::types::ListContextsRequest;
use crate::api::types::ModifyContextRequest;
use crate::error::AgentBayError;
use crate::error::Result;
use crate::response::OperationResult;

/// Default poll budget for [`ContextService::clear`].
pub const CLEAR_TIMEOUT: Duration = Duration::from_secs(60);
/// Default poll interval for [`ContextService::clear`].
pub const CLEAR_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// A named persistent volume.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub id: String,
    pub name: String,
    /// `available`, `in-use`, `pre-available`, `clearing`, …
    pub state: String,
    pub created_at: Option<String>,
    pub last_used_at: Option<String>,
    pub os_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ContextData {
    id: String,
    name: String,
    state: String,
    create_time: Option<String>,
    last_used_time: Option<String>,
    os_type: Option<String>,
}

impl From<ContextData> for Context {
    fn from(data: ContextData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            state: data.state,
            created_at: data.create_time,
            last_used_at: data.last_used_time,
            os_type: data.os_type,
        }
    }
}

/// Result of operations returning a single context.
#[derive(Debug, Clone, Default)]
pub struct ContextResult {
    pub request_id: String,
    pub success: bool,
    pub context_id: String,
    pub context: Option<Context>,
    pub error_message: String,
}

impl ContextResult {
    fn failure(request_id: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            error_message: error_message.into(),
            ..Default::default()
        }
    }
}

/// Result of listing contexts.
#[derive(Debug, Clone, Default)]
pub struct ContextListResult {
    pub request_id: String,
    pub success: bool,
    pub contexts: Vec<Context>,
    pub next_token: String,
    pub max_results: u32,
    pub total_count: u32,
    pub error_message: String,
}

impl ContextListResult {
    fn failure(request_id: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            error_message: error_message.into(),
            ..Default::default()
        }
    }
}

/// A file inside a context, as listed by `DescribeContextFiles`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContextFileEntry {
    pub file_id: String,
    pub file_name: String,
    pub file_path: String,
    pub file_type: Option<String>,
    pub gmt_create: Option<String>,
    pub gmt_modified: Option<String>,
    pub size: Option<u64>,
    pub status: Option<String>,
}

/// Result of a presigned-URL request.
#[derive(Debug, Clone, Default)]
pub struct FileUrlResult {
    pub request_id: String,
    pub success: bool,
    pub url: String,
    pub expire_time: Option<u64>,
    pub error_message: String,
}

/// Result of a context file listing.
#[derive(Debug, Clone, Default)]
pub struct ContextFileListResult {
    pub request_id: String,
    pub success: bool,
    pub entries: Vec<ContextFileEntry>,
    pub count: Option<u32>,
    pub error_message: String,
}

/// Result of clear operations, carrying the observed context state.
#[derive(Debug, Clone, Default)]
pub struct ClearContextResult {
    pub request_id: String,
    pub success: bool,
    pub error_message: String,
    /// `clearing` while in progress, `available` when done.
    pub status: Option<String>,
    pub context_id: Option<String>,
}

/// Pagination parameters for [`ContextService::list`].
#[derive(Debug, Clone, Default)]
pub struct ContextListParams {
    pub max_results: Option<u32>,
    pub next_token: Option<String>,
}

/// Context CRUD and file operations.
#[derive(Debug, Clone)]
pub struct ContextService {
    core: Arc<Core>,
}

impl ContextService {
    pub(crate) fn new(core: Arc<Core>) -> Self {
        Self { core }
    }

    /// List contexts with server-driven pagination.
    pub async fn list(&self, params: Option<ContextListParams>) -> ContextListResult {
        let params = params.unwrap_or_default();
        let max_results = params.max_results.unwrap_or(10);

        let request = ListContextsRequest {
            authorization: self.core.authorization(),
            max_results,
            next_token: params.next_token.clone(),
        };

        tracing::debug!(max_results, "ListContexts");

        let body = match self.core.api.call(&request).await {
            Ok(body) => body,
            Err(e) => {
                return ContextListResult::failure("", format!("Failed to list contexts: {e}"));
            }
        };

        if let Some(error) = body.api_error() {
            return ContextListResult::failure(body.request_id, error);
        }

        let mut contexts = Vec::new();
        if let Some(Value::Array(items)) = &body.data {
            for item in items {
                if let Ok(data) = serde_json::from_value::<ContextData>(item.clone()) {
                    contexts.push(Context::from(data));
                }
            }
        }

        ContextListResult {
            request_id: body.request_id.clone(),
            success: true,
            contexts,
            next_token: body.next_token.clone().unwrap_or_default(),
            max_results: body.max_results.unwrap_or(max_results),
            total_count: body.total_count.unwrap_or(0),
            error_message: String::new(),
        }
    }

    /// Get a context by name or id, optionally creating it by name.
    ///
    /// Exactly one lookup key is needed; `allow_create` only combines with
    /// `name`.
    pub async fn get(
        &self,
        name: Option<&str>,
        allow_create: bool,
        context_id: Option<&str>,
    ) -> ContextResult {
        if name.is_none() && context_id.is_none() {
            return ContextResult::failure("", "Either 'name' or 'context_id' must be provided");
        }
        if allow_create && context_id.is_some() {
            return ContextResult::failure(
                "",
                "Cannot create context using context_id. Use 'name' parameter when allow_create is true",
            );
        }

        let request = GetContextRequest {
            authorization: self.core.authorization(),
            name: name.map(str::to_string),
            context_id: context_id.map(str::to_string),
            allow_create: Some(allow_create),
        };

        tracing::debug!(name, context_id, allow_create, "GetContext");

        let body = match self.core.api.call(&request).await {
            Ok(body) => body,
            Err(e) => {
                let identifier = name.or(context_id).unwrap_or_default();
                return ContextResult::failure(
                    "",
                    format!("Failed to get context {identifier}: {e}"),
                );
            }
        };

        if let Some(error) = body.api_error() {
            return ContextResult::failure(body.request_id, error);
        }

        let data_value = body.data();
        let data = if data_value.is_null() {
            ContextData::default()
        } else {
            match serde_json::from_value::<ContextData>(data_value.clone()) {
                Ok(data) => data,
                Err(e) => {
                    return ContextResult::failure(
                        body.request_id,
                        format!("Failed to parse response: {e}"),
                    );
                }
            }
        };

        let mut context = Context::from(data);
        if context.name.is_empty() {
            context.name = name.unwrap_or_default().to_string();
        }
        if context.state.is_empty() {
            context.state = "available".to_string();
        }

        ContextResult {
            request_id: body.request_id,
            success: true,
            context_id: context.id.clone(),
            context: Some(context),
            error_message: String::new(),
        }
    }

    /// Create a context with the given name.
    pub async fn create(&self, name: &str) -> ContextResult {
        self.get(Some(name), true, None).await
    }

    /// Rename a context.
    pub async fn update(&self, context: &Context) -> OperationResult {
        let request = ModifyContextRequest {
            authorization: self.core.authorization(),
            id: context.id.clone(),
            name: context.name.clone(),
        };

        tracing::debug!(id = %context.id, name = %context.name, "ModifyContext");
        self.simple_call(request, "Failed to update context").await
    }

    /// Delete a context.
    pub async fn delete(&self, context: &Context) -> OperationResult {
        let request = DeleteContextRequest {
            authorization: self.core.authorization(),
            id: context.id.clone(),
        };

        tracing::debug!(id = %context.id, "DeleteContext");
        self.simple_call(request, "Failed to delete context").await
    }

    /// Get a presigned upload URL for a file path inside a context.
    pub async fn get_file_upload_url(&self, context_id: &str, file_path: &str) -> FileUrlResult {
        let request = GetContextFileUploadUrlRequest {
            authorization: self.core.authorization(),
            context_id: context_id.to_string(),
            file_path: file_path.to_string(),
        };
        self.file_url_call(request).await
    }

    /// Get a presigned download URL for a file path inside a context.
    pub async fn get_file_download_url(&self, context_id: &str, file_path: &str) -> FileUrlResult {
        let request = GetContextFileDownloadUrlRequest {
            authorization: self.core.authorization(),
            context_id: context_id.to_string(),
            file_path: file_path.to_string(),
        };
        self.file_url_call(request).await
    }

    /// Delete a file inside a context.
    pub async fn delete_file(&self, context_id: &str, file_path: &str) -> OperationResult {
        let request = DeleteContextFileRequest {
            authorization: self.core.authorization(),
            context_id: context_id.to_string(),
            file_path: file_path.to_string(),
        };
        self.simple_call(request, "Failed to delete file").await
    }

    /// List files under a folder inside a context.
    pub async fn list_files(
        &self,
        context_id: &str,
        parent_folder_path: &str,
        page_number: u32,
        page_size: u32,
    ) -> ContextFileListResult {
        let request = DescribeContextFilesRequest {
            authorization: self.core.authorization(),
            context_id: context_id.to_string(),
            parent_folder_path: parent_folder_path.to_string(),
            page_number,
            page_size,
        };

        let body = match self.core.api.call(&request).await {
            Ok(body) => body,
            Err(e) => {
                return ContextFileListResult {
                    error_message: format!("Failed to list files: {e}"),
                    ..Default::default()
                };
            }
        };

        if let Some(error) = body.api_error() {
            return ContextFileListResult {
                request_id: body.request_id,
                error_message: error,
                ..Default::default()
            };
        }

        let mut entries = Vec::new();
        if let Some(Value::Array(items)) = &body.data {
            for item in items {
                if let Ok(entry) = serde_json::from_value::<ContextFileEntry>(item.clone()) {
                    entries.push(entry);
                }
            }
        }

        ContextFileListResult {
            request_id: body.request_id.clone(),
            success: body.succeeded(false),
            entries,
            count: body.count,
            error_message: String::new(),
        }
    }

    /// Start clearing a context's data; returns immediately with status
    /// `clearing`.
    pub async fn clear_async(&self, context_id: &str) -> ClearContextResult {
        let request = ClearContextRequest {
            authorization: self.core.authorization(),
            id: context_id.to_string(),
        };

        tracing::debug!(context_id, "ClearContext");

        let body = match self.core.api.call(&request).await {
            Ok(body) => body,
            Err(e) => {
                return ClearContextResult {
                    error_message: format!(
                        "Failed to start context clearing for {context_id}: {e}"
                    ),
                    ..Default::default()
                };
            }
        };

        if let Some(error) = body.api_error() {
            return ClearContextResult {
                request_id: body.request_id,
                error_message: error,
                ..Default::default()
            };
        }

        ClearContextResult {
            request_id: body.request_id,
            success: true,
            error_message: String::new(),
            status: Some("clearing".to_string()),
            context_id: Some(context_id.to_string()),
        }
    }

    /// Read the clearing status from the context's `state`.
    pub async fn get_clear_status(&self, context_id: &str) -> ClearContextResult {
        let request = GetContextRequest {
            authorization: self.core.authorization(),
            context_id: Some(context_id.to_string()),
            allow_create: Some(false),
            ..Default::default()
        };

        let body = match self.core.api.call(&request).await {
            Ok(body) => body,
            Err(e) => {
                return ClearContextResult {
                    error_message: format!("Failed to get clear status: {e}"),
                    ..Default::default()
                };
            }
        };

        if let Some(error) = body.api_error() {
            return ClearContextResult {
                request_id: body.request_id,
                error_message: error,
                ..Default::default()
            };
        }

        let request_id = body.request_id.clone();
        let data = body.data();
        if data.is_null() {
            return ClearContextResult {
                request_id,
                error_message: "No data in response".to_string(),
                ..Default::default()
            };
        }

        let id = data.get("Id").and_then(Value::as_str).unwrap_or_default();
        let state = data
            .get("State")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or("clearing");

        ClearContextResult {
            request_id,
            success: true,
            error_message: String::new(),
            status: Some(state.to_string()),
            context_id: Some(id.to_string()),
        }
    }

    /// Clear a context and wait for its state to return to `available`.
    ///
    /// Any state other than `available` keeps the poll going; the only way
    /// out besides success is a failed status read or
    /// [`AgentBayError::ClearanceTimeout`] once the budget expires.
    pub async fn clear(
        &self,
        context_id: &str,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<ClearContextResult> {
        let start_result = self.clear_async(context_id).await;
        if !start_result.success {
            return Ok(start_result);
        }

        tracing::info!(context_id, "started context clearing task");

        let start = Instant::now();
        let max_attempts = (timeout.as_millis() / poll_interval.as_millis().max(1)) as u64;

        for attempt in 0..max_attempts {
            tokio::time::sleep(poll_interval).await;

            let status_result = self.get_clear_status(context_id).await;
            if !status_result.success {
                tracing::error!(
                    context_id,
                    error = %status_result.error_message,
                    "failed to get clear status"
                );
                return Ok(status_result);
            }

            let status = status_result.status.as_deref().unwrap_or_default();
            tracing::info!(
                context_id,
                status,
                attempt = attempt + 1,
                max_attempts,
                "clear task status"
            );

            if status == "available" {
                tracing::info!(
                    context_id,
                    elapsed_s = start.elapsed().as_secs_f64(),
                    "context cleared"
                );
                return Ok(ClearContextResult {
                    request_id: status_result.request_id,
                    success: true,
                    error_message: String::new(),
                    status: Some("available".to_string()),
                    context_id: status_result.context_id,
                });
            }
            if status != "clearing" && status != "pre-available" {
                tracing::warn!(context_id, status, "context in unexpected state, still polling");
            }
        }

        Err(AgentBayError::ClearanceTimeout(format!(
            "Context clearing timed out after {:.2} seconds",
            start.elapsed().as_secs_f64()
        )))
    }

    async fn simple_call<R: crate::api::ApiRequest>(
        &self,
        request: R,
        error_prefix: &str,
    ) -> OperationResult {
        let body = match self.core.api.call(&request).await {
            Ok(body) => body,
            Err(e) => return OperationResult::failure("", format!("{error_prefix}: {e}")),
        };

        let success = body.succeeded(false);
        if !success {
            let code = body.code.clone().unwrap_or_else(|| "Unknown".to_string());
            let message = body
                .message
                .clone()
                .unwrap_or_else(|| "Unknown error".to_string());
            return OperationResult {
                request_id: body.request_id,
                success: false,
                data: Some(Value::Bool(false)),
                error_message: format!("[{code}] {message}"),
            };
        }

        OperationResult {
            request_id: body.request_id,
            success: true,
            data: Some(Value::Bool(true)),
            error_message: String::new(),
        }
    }

    async fn file_url_call<R: crate::api::ApiRequest>(&self, request: R) -> FileUrlResult {
        let body = match self.core.api.call(&request).await {
            Ok(body) => body,
            Err(e) => {
                return FileUrlResult {
                    error_message: format!("Failed to get file URL: {e}"),
                    ..Default::default()
                };
            }
        };

        if !body.succeeded(false) {
            let code = body.code.clone().unwrap_or_else(|| "Unknown".to_string());
            let message = body
                .message
                .clone()
                .unwrap_or_else(|| "Unknown error".to_string());
            return FileUrlResult {
                request_id: body.request_id,
                error_message: format!("[{code}] {message}"),
                ..Default::default()
            };
        }

        let data = body.data();
        FileUrlResult {
            request_id: body.request_id.clone(),
            success: true,
            url: data
                .get("Url")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            expire_time: data.get("ExpireTime").and_then(Value::as_u64),
            error_message: String::new(),
        }
    }
}

#[cfg(test)]
#[path = "context.test.rs"]
mod tests;
