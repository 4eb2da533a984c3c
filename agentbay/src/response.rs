//! Result envelopes returned by public operations.
//!
//! API-level failures never surface as `Err`; they land in these envelopes
//! with `success == false` and a populated `error_message`. `request_id` is
//! set whenever any server call happened and empty when the failure was
//! purely client-side.

use serde::Deserialize;
use serde_json::Value;

use crate::session::Session;

/// Result of session creation and lookup.
#[derive(Debug, Clone, Default)]
pub struct SessionResult {
    pub request_id: String,
    pub success: bool,
    pub error_message: String,
    pub session: Option<Session>,
}

impl SessionResult {
    pub(crate) fn failure(request_id: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            success: false,
            error_message: error_message.into(),
            session: None,
        }
    }
}

/// Result of listing session ids.
#[derive(Debug, Clone, Default)]
pub struct SessionListResult {
    pub request_id: String,
    pub success: bool,
    pub error_message: String,
    pub session_ids: Vec<String>,
    pub next_token: String,
    pub max_results: u32,
    pub total_count: u32,
}

impl SessionListResult {
    pub(crate) fn failure(
        request_id: impl Into<String>,
        error_message: impl Into<String>,
        max_results: u32,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            error_message: error_message.into(),
            max_results,
            ..Default::default()
        }
    }
}

/// Result of session deletion.
#[derive(Debug, Clone, Default)]
pub struct DeleteResult {
    pub request_id: String,
    pub success: bool,
    pub error_message: String,
}

/// Result of pause/resume operations, carrying the observed session status.
#[derive(Debug, Clone, Default)]
pub struct SessionStateResult {
    pub request_id: String,
    pub success: bool,
    pub error_message: String,
    pub code: String,
    pub message: String,
    pub http_status_code: u32,
    /// `PAUSING`/`PAUSED` or `RESUMING`/`RUNNING`, when known.
    pub status: Option<String>,
}

/// Data returned by the `GetSession` action.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GetSessionData {
    pub app_instance_id: String,
    pub resource_id: String,
    pub session_id: String,
    pub success: bool,
    pub http_port: String,
    pub network_interface_ip: String,
    pub token: String,
    pub vpc_resource: bool,
    pub resource_url: String,
    pub status: String,
}

/// Result of `GetSession`, exposing raw session metadata.
#[derive(Debug, Clone, Default)]
pub struct GetSessionResult {
    pub request_id: String,
    pub http_status_code: u32,
    pub code: String,
    pub success: bool,
    pub data: Option<GetSessionData>,
    pub error_message: String,
}

/// Result of operations with an untyped payload.
#[derive(Debug, Clone, Default)]
pub struct OperationResult {
    pub request_id: String,
    pub success: bool,
    pub data: Option<Value>,
    pub error_message: String,
}

impl OperationResult {
    pub(crate) fn failure(request_id: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            success: false,
            data: None,
            error_message: error_message.into(),
        }
    }

    pub(crate) fn success(request_id: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            request_id: request_id.into(),
            success: true,
            data,
            error_message: String::new(),
        }
    }
}

/// Result of operations returning a boolean.
#[derive(Debug, Clone, Default)]
pub struct BoolResult {
    pub request_id: String,
    pub success: bool,
    pub data: Option<bool>,
    pub error_message: String,
}

impl BoolResult {
    pub(crate) fn failure(request_id: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            success: false,
            data: None,
            error_message: error_message.into(),
        }
    }

    pub(crate) fn success(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            success: true,
            data: Some(true),
            error_message: String::new(),
        }
    }
}

/// Result of one tool invocation.
#[derive(Debug, Clone, Default)]
pub struct McpToolResult {
    pub request_id: String,
    pub success: bool,
    /// First text content of the tool output.
    pub data: String,
    pub error_message: String,
}

impl McpToolResult {
    pub(crate) fn failure(request_id: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            success: false,
            data: String::new(),
            error_message: error_message.into(),
        }
    }
}

#[cfg(test)]
#[path = "response.test.rs"]
mod tests;
