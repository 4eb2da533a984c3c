//! Task-oriented agent module.
//!
//! Tasks are described in natural language, executed remotely, and polled
//! to completion through the `flux_*` tools.

use std::time::Duration;

use serde_json::json;
use serde_json::Value;

use crate::session::Session;

const TASK_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Result of executing an agent task.
#[derive(Debug, Clone, Default)]
pub struct ExecutionResult {
    pub request_id: String,
    pub success: bool,
    pub error_message: String,
    pub task_id: String,
    /// `finished`, `failed`, `unsupported`, or the last observed state.
    pub task_status: String,
}

/// Result of querying an agent task.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    pub request_id: String,
    pub success: bool,
    pub error_message: String,
    pub output: String,
}

/// Agent operations bound to one session.
#[derive(Debug, Clone, Copy)]
pub struct Agent<'a> {
    session: &'a Session,
}

impl<'a> Agent<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Execute a task and poll until it settles or the attempt budget runs
    /// out.
    pub async fn execute_task(&self, task: &str, max_try_times: u32) -> ExecutionResult {
        let result = self
            .session
            .call_mcp_tool("flux_execute_task", json!({ "task": task }))
            .await;
        if !result.success {
            return ExecutionResult {
                request_id: result.request_id,
                success: false,
                error_message: result.error_message,
                ..Default::default()
            };
        }

        let task_id = match serde_json::from_str::<Value>(&result.data) {
            Ok(value) => value
                .get("task_id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            Err(_) => String::new(),
        };
        if task_id.is_empty() {
            return ExecutionResult {
                request_id: result.request_id,
                success: false,
                error_message: "task_id not found in response".to_string(),
                ..Default::default()
            };
        }

        let mut last_status = String::new();
        for _ in 0..max_try_times {
            let status_result = self.get_task_status(&task_id).await;
            if !status_result.success {
                return ExecutionResult {
                    request_id: status_result.request_id,
                    success: false,
                    error_message: status_result.error_message,
                    task_id,
                    task_status: last_status,
                };
            }

            let status = serde_json::from_str::<Value>(&status_result.output)
                .ok()
                .and_then(|v| {
                    v.get("status")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                })
                .unwrap_or_default();
            last_status = status.clone();

            match status.as_str() {
                "finished" => {
                    return ExecutionResult {
                        request_id: status_result.request_id,
                        success: true,
                        error_message: String::new(),
                        task_id,
                        task_status: status,
                    };
                }
                "failed" | "unsupported" => {
                    return ExecutionResult {
                        request_id: status_result.request_id,
                        success: false,
                        error_message: format!("Task {task_id} {status}"),
                        task_id,
                        task_status: status,
                    };
                }
                _ => {}
            }

            tokio::time::sleep(TASK_POLL_INTERVAL).await;
        }

        ExecutionResult {
            request_id: result.request_id,
            success: false,
            error_message: format!("Task {task_id} did not finish within {max_try_times} attempts"),
            task_id,
            task_status: last_status,
        }
    }

    /// Query the raw status payload of a task.
    pub async fn get_task_status(&self, task_id: &str) -> QueryResult {
        let result = self
            .session
            .call_mcp_tool("flux_get_task_status", json!({ "task_id": task_id }))
            .await;
        QueryResult {
            request_id: result.request_id,
            success: result.success,
            error_message: result.error_message,
            output: result.data,
        }
    }

    /// Ask the remote to terminate a task.
    pub async fn terminate_task(&self, task_id: &str) -> ExecutionResult {
        let result = self
            .session
            .call_mcp_tool("flux_terminate_task", json!({ "task_id": task_id }))
            .await;
        ExecutionResult {
            request_id: result.request_id,
            success: result.success,
            error_message: result.error_message,
            task_id: task_id.to_string(),
            task_status: String::new(),
        }
    }
}

#[cfg(test)]
#[path = "agent.test.rs"]
mod tests;
