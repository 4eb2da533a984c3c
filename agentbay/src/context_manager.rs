//! Per-session context synchronization.
//!
//! `GetContextInfo` returns `Data.ContextStatus` as a doubly-encoded JSON
//! string: the outer layer is `[{"type": "data", "data": "<json>"}, …]` and
//! each inner `data` is itself a JSON array of status items. Both layers are
//! parsed here; nothing upstream ever sees the raw string.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::api::types::GetContextInfoRequest;
use crate::api::types::SyncContextRequest;
use crate::session::Session;

/// Default number of poll attempts for [`ContextManager::sync`].
pub const SYNC_MAX_RETRIES: u32 = 150;
/// Default interval between poll attempts for [`ContextManager::sync`].
pub const SYNC_RETRY_INTERVAL: Duration = Duration::from_millis(1_500);

/// One server-side sync task, parsed from the nested payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContextStatusData {
    #[serde(rename = "contextId")]
    pub context_id: String,
    pub path: String,
    #[serde(rename = "errorMessage")]
    pub error_message: String,
    /// `Success`, `Failed`, or an in-progress vocabulary the service does
    /// not document; anything else counts as pending.
    pub status: String,
    #[serde(rename = "startTime")]
    pub start_time: i64,
    #[serde(rename = "finishTime")]
    pub finish_time: i64,
    #[serde(rename = "taskType")]
    pub task_type: String,
}

/// Result of [`ContextManager::info`].
#[derive(Debug, Clone, Default)]
pub struct ContextInfoResult {
    pub request_id: String,
    pub success: bool,
    pub context_status_data: Vec<ContextStatusData>,
    pub error_message: String,
}

/// Result of [`ContextManager::sync`].
#[derive(Debug, Clone, Default)]
pub struct ContextSyncResult {
    pub request_id: String,
    pub success: bool,
    pub error_message: String,
}

#[derive(Debug, Deserialize)]
struct ContextStatusOuter {
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    data: String,
}

/// Parse the doubly-encoded `ContextStatus` payload.
fn parse_context_status(raw: &str) -> Vec<ContextStatusData> {
    let mut items = Vec::new();
    let outer: Vec<ContextStatusOuter> = match serde_json::from_str(raw) {
        Ok(outer) => outer,
        Err(e) => {
            tracing::error!(error = %e, "error parsing context status");
            return items;
        }
    };
    for entry in outer {
        if entry.kind != "data" {
            continue;
        }
        match serde_json::from_str::<Vec<ContextStatusData>>(&entry.data) {
            Ok(mut inner) => items.append(&mut inner),
            Err(e) => tracing::error!(error = %e, "error parsing context status data"),
        }
    }
    items
}

/// Context-sync operations bound to one session.
#[derive(Debug, Clone, Copy)]
pub struct ContextManager<'a> {
    session: &'a Session,
}

impl<'a> ContextManager<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Fetch the status of sync tasks for this session.
    pub async fn info(&self) -> ContextInfoResult {
        self.info_with(None, None, None).await
    }

    /// Fetch sync-task status filtered by context, path, or task type.
    pub async fn info_with(
        &self,
        context_id: Option<&str>,
        path: Option<&str>,
        task_type: Option<&str>,
    ) -> ContextInfoResult {
        let request = GetContextInfoRequest {
            authorization: self.session.core().authorization(),
            session_id: self.session.session_id().to_string(),
            context_id: context_id.map(str::to_string),
            path: path.map(str::to_string),
            task_type: task_type.map(str::to_string),
        };

        tracing::debug!(
            session_id = self.session.session_id(),
            context_id,
            path,
            task_type,
            "GetContextInfo"
        );

        let body = match self.session.core().api.call(&request).await {
            Ok(body) => body,
            Err(e) => {
                return ContextInfoResult {
                    error_message: format!("Failed to get context info: {e}"),
                    ..Default::default()
                };
            }
        };

        if let Some(error) = body.api_error() {
            return ContextInfoResult {
                request_id: body.request_id,
                error_message: error,
                ..Default::default()
            };
        }

        let mut context_status_data = Vec::new();
        if let Some(raw) = body.data().get("ContextStatus").and_then(Value::as_str) {
            if !raw.is_empty() {
                context_status_data = parse_context_status(raw);
            }
        }
        for item in &context_status_data {
            if item.status != "Success" && item.status != "Failed" && !item.status.is_empty() {
                tracing::warn!(
                    context_id = %item.context_id,
                    status = %item.status,
                    "unrecognized context status, treating as pending"
                );
            }
        }

        ContextInfoResult {
            request_id: body.request_id,
            success: true,
            context_status_data,
            error_message: String::new(),
        }
    }

    /// Trigger a context sync and wait for its upload/download tasks to
    /// settle.
    ///
    /// Reports success only when every relevant task reaches `Success`;
    /// `Failed` tasks make the overall result a failure envelope, never an
    /// `Err`.
    pub async fn sync(
        &self,
        context_id: Option<&str>,
        path: Option<&str>,
        mode: Option<&str>,
    ) -> ContextSyncResult {
        self.sync_with(context_id, path, mode, SYNC_MAX_RETRIES, SYNC_RETRY_INTERVAL)
            .await
    }

    /// [`Self::sync`] with an explicit poll budget.
    pub async fn sync_with(
        &self,
        context_id: Option<&str>,
        path: Option<&str>,
        mode: Option<&str>,
        max_retries: u32,
        retry_interval: Duration,
    ) -> ContextSyncResult {
        let request = SyncContextRequest {
            authorization: self.session.core().authorization(),
            session_id: self.session.session_id().to_string(),
            context_id: context_id.map(str::to_string),
            path: path.map(str::to_string),
            mode: mode.map(str::to_string),
        };

        tracing::debug!(
            session_id = self.session.session_id(),
            context_id,
            path,
            mode,
            "SyncContext"
        );

        let body = match self.session.core().api.call(&request).await {
            Ok(body) => body,
            Err(e) => {
                return ContextSyncResult {
                    error_message: format!("Failed to sync context: {e}"),
                    ..Default::default()
                };
            }
        };

        if let Some(error) = body.api_error() {
            return ContextSyncResult {
                request_id: body.request_id,
                error_message: error,
                ..Default::default()
            };
        }

        if !body.succeeded(false) {
            return ContextSyncResult {
                request_id: body.request_id,
                success: false,
                error_message: String::new(),
            };
        }

        let request_id = body.request_id;
        let completed = self
            .poll_for_completion(context_id, path, max_retries, retry_interval)
            .await;

        ContextSyncResult {
            request_id,
            success: completed,
            error_message: String::new(),
        }
    }

    async fn poll_for_completion(
        &self,
        context_id: Option<&str>,
        path: Option<&str>,
        max_retries: u32,
        retry_interval: Duration,
    ) -> bool {
        for attempt in 0..max_retries {
            let info = self.info_with(context_id, path, None).await;

            let mut all_completed = true;
            let mut has_failure = false;
            let mut has_sync_tasks = false;

            for item in &info.context_status_data {
                if item.task_type != "upload" && item.task_type != "download" {
                    continue;
                }
                has_sync_tasks = true;
                tracing::info!(
                    context_id = %item.context_id,
                    status = %item.status,
                    path = %item.path,
                    "sync task"
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
                        "sync failed"
                    );
                }
            }

            if all_completed || !has_sync_tasks {
                if has_failure {
                    tracing::warn!("context sync completed with failures");
                    return false;
                }
                tracing::info!("context sync completed");
                return true;
            }

            tracing::debug!(
                attempt = attempt + 1,
                max_retries,
                "waiting for context sync to complete"
            );
            tokio::time::sleep(retry_interval).await;
        }

        tracing::error!(max_retries, "context sync polling timed out");
        false
    }
}

#[cfg(test)]
#[path = "context_manager.test.rs"]
mod tests;
