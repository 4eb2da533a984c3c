//! Wire types for the control-plane RPC protocol.
//!
//! Every action takes a flat, form-encoded request whose field names are
//! PascalCase on the wire, and answers with the JSON envelope modeled by
//! [`ApiResponseBody`]. Values that the service defines as JSON blobs
//! (labels, persistence policies, extra configs, sdk stats) are serialized
//! to strings before they enter a request.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// Protocol version sent with every request.
pub const API_VERSION: &str = "2025-05-06";

/// Signature algorithm identifier carried by the transport.
pub const SIGNATURE_ALGORITHM: &str = "v2";

/// A control-plane request bound to a named action.
pub trait ApiRequest: Serialize {
    /// RPC action name.
    const ACTION: &'static str;
}

macro_rules! api_request {
    ($name:ident, $action:literal) => {
        impl ApiRequest for $name {
            const ACTION: &'static str = $action;
        }
    };
}

/// Response envelope shared by every control-plane action.
///
/// `success` is optional on the wire; actions differ on whether a missing
/// flag means success, so callers pick the default via [`Self::succeeded`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ApiResponseBody {
    pub request_id: String,
    pub success: Option<bool>,
    pub code: Option<String>,
    pub message: Option<String>,
    pub http_status_code: Option<u32>,
    pub data: Option<Value>,
    /// Pagination fields carried at the top level by list actions.
    pub next_token: Option<String>,
    pub max_results: Option<u32>,
    pub total_count: Option<u32>,
    pub count: Option<u32>,
}

impl ApiResponseBody {
    /// Interpret the success flag, falling back to `default` when absent.
    pub fn succeeded(&self, default: bool) -> bool {
        self.success.unwrap_or(default)
    }

    /// Format the API-level error as `[Code] Message`, if the envelope
    /// carries one.
    pub fn api_error(&self) -> Option<String> {
        if self.succeeded(true) {
            return None;
        }
        let code = self.code.as_deref().filter(|c| !c.is_empty())?;
        let message = self
            .message
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or("Unknown error");
        Some(format!("[{code}] {message}"))
    }

    /// The `Data` field, or `Value::Null` when absent.
    pub fn data(&self) -> &Value {
        static NULL: Value = Value::Null;
        self.data.as_ref().unwrap_or(&NULL)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateMcpSessionRequest {
    pub authorization: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    /// Labels as a JSON object string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_region_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mcp_policy_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_record: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc_resource: Option<bool>,
    /// Context-sync bindings, pre-serialized as a JSON array string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistence_data_list: Option<String>,
    /// Opaque extra configuration blob as a JSON string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_configs: Option<String>,
    /// SDK telemetry stamp as a JSON string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdk_stats: Option<String>,
}
api_request!(CreateMcpSessionRequest, "CreateMcpSession");

impl CreateMcpSessionRequest {
    /// Render the request as JSON with the authorization value masked, for
    /// debug logging.
    pub fn masked_json(&self) -> Value {
        let mut value = serde_json::to_value(self).unwrap_or(Value::Null);
        if let Some(auth) = value.get("Authorization").and_then(Value::as_str) {
            let masked = crate::logger::mask_authorization(auth);
            value["Authorization"] = Value::String(masked);
        }
        value
    }
}

/// One entry of `CreateMcpSessionRequest.persistence_data_list` before it is
/// flattened to a JSON string.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PersistenceData {
    pub context_id: String,
    pub path: String,
    /// Sync policy serialized as a JSON string, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetSessionRequest {
    pub authorization: String,
    pub session_id: String,
}
api_request!(GetSessionRequest, "GetSession");

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListSessionRequest {
    pub authorization: String,
    /// Label filter as a JSON object string.
    pub labels: String,
    pub max_results: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}
api_request!(ListSessionRequest, "ListSession");

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteSessionAsyncRequest {
    pub authorization: String,
    pub session_id: String,
}
api_request!(DeleteSessionAsyncRequest, "DeleteSessionAsync");

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PauseSessionAsyncRequest {
    pub authorization: String,
    pub session_id: String,
}
api_request!(PauseSessionAsyncRequest, "PauseSessionAsync");

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResumeSessionAsyncRequest {
    pub authorization: String,
    pub session_id: String,
}
api_request!(ResumeSessionAsyncRequest, "ResumeSessionAsync");

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SetLabelRequest {
    pub authorization: String,
    pub session_id: String,
    /// Labels as a JSON object string.
    pub labels: String,
}
api_request!(SetLabelRequest, "SetLabel");

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetLabelRequest {
    pub authorization: String,
    pub session_id: String,
}
api_request!(GetLabelRequest, "GetLabel");

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetMcpResourceRequest {
    pub authorization: String,
    pub session_id: String,
}
api_request!(GetMcpResourceRequest, "GetMcpResource");

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetLinkRequest {
    pub authorization: String,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
}
api_request!(GetLinkRequest, "GetLink");

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetAdbLinkRequest {
    pub authorization: String,
    pub session_id: String,
}
api_request!(GetAdbLinkRequest, "GetAdbLink");

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetCdpLinkRequest {
    pub authorization: String,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
}
api_request!(GetCdpLinkRequest, "GetCdpLink");

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InitBrowserRequest {
    pub authorization: String,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistent_path: Option<String>,
    /// Opaque browser option blob as a JSON string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_option: Option<String>,
}
api_request!(InitBrowserRequest, "InitBrowser");

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CallMcpToolRequest {
    pub authorization: String,
    pub session_id: String,
    pub name: String,
    /// Tool arguments as a JSON object string.
    pub args: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_gen_session: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
}
api_request!(CallMcpToolRequest, "CallMcpTool");

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListMcpToolsRequest {
    pub authorization: String,
    pub image_id: String,
}
api_request!(ListMcpToolsRequest, "ListMcpTools");

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetContextRequest {
    pub authorization: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_create: Option<bool>,
}
api_request!(GetContextRequest, "GetContext");

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListContextsRequest {
    pub authorization: String,
    pub max_results: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}
api_request!(ListContextsRequest, "ListContexts");

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModifyContextRequest {
    pub authorization: String,
    pub id: String,
    pub name: String,
}
api_request!(ModifyContextRequest, "ModifyContext");

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteContextRequest {
    pub authorization: String,
    pub id: String,
}
api_request!(DeleteContextRequest, "DeleteContext");

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClearContextRequest {
    pub authorization: String,
    pub id: String,
}
api_request!(ClearContextRequest, "ClearContext");

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SyncContextRequest {
    pub authorization: String,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}
api_request!(SyncContextRequest, "SyncContext");

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetContextInfoRequest {
    pub authorization: String,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
}
api_request!(GetContextInfoRequest, "GetContextInfo");

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeContextFilesRequest {
    pub authorization: String,
    pub context_id: String,
    pub parent_folder_path: String,
    pub page_number: u32,
    pub page_size: u32,
}
api_request!(DescribeContextFilesRequest, "DescribeContextFiles");

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetContextFileUploadUrlRequest {
    pub authorization: String,
    pub context_id: String,
    pub file_path: String,
}
api_request!(GetContextFileUploadUrlRequest, "GetContextFileUploadUrl");

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetContextFileDownloadUrlRequest {
    pub authorization: String,
    pub context_id: String,
    pub file_path: String,
}
api_request!(GetContextFileDownloadUrlRequest, "GetContextFileDownloadUrl");

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteContextFileRequest {
    pub authorization: String,
    pub context_id: String,
    pub file_path: String,
}
api_request!(DeleteContextFileRequest, "DeleteContextFile");

#[cfg(test)]
#[path = "types.test.rs"]
mod tests;
