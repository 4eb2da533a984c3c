//! Object-storage transfer through the session.
//!
//! Uploads and downloads run inside the session against bucket-style URLs;
//! credentials are injected once with [`Oss::env_init`].

use serde_json::json;
use serde_json::Value;

use crate::response::OperationResult;
use crate::session::Session;

/// OSS operations bound to one session.
#[derive(Debug, Clone, Copy)]
pub struct Oss<'a> {
    session: &'a Session,
}

impl<'a> Oss<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Inject OSS credentials into the session environment.
    pub async fn env_init(
        &self,
        access_key_id: &str,
        access_key_secret: &str,
        security_token: Option<&str>,
        endpoint: Option<&str>,
        region: Option<&str>,
    ) -> OperationResult {
        let mut args = json!({
            "access_key_id": access_key_id,
            "access_key_secret": access_key_secret,
        });
        if let Some(token) = security_token {
            args["security_token"] = json!(token);
        }
        if let Some(endpoint) = endpoint {
            args["endpoint"] = json!(endpoint);
        }
        if let Some(region) = region {
            args["region"] = json!(region);
        }
        self.text_call("oss_env_init", args).await
    }

    /// Upload a session-local file to a bucket.
    pub async fn upload(&self, bucket: &str, object: &str, path: &str) -> OperationResult {
        let args = json!({
            "bucket": bucket,
            "object": object,
            "path": path,
        });
        self.text_call("oss_upload", args).await
    }

    /// Upload a session-local file to a presigned URL.
    pub async fn upload_anonymous(&self, url: &str, path: &str) -> OperationResult {
        self.text_call("oss_upload_annon", json!({ "url": url, "path": path }))
            .await
    }

    /// Download an object from a bucket to a session-local path.
    pub async fn download(&self, bucket: &str, object: &str, path: &str) -> OperationResult {
        let args = json!({
            "bucket": bucket,
            "object": object,
            "path": path,
        });
        self.text_call("oss_download", args).await
    }

    /// Download from a presigned URL to a session-local path.
    pub async fn download_anonymous(&self, url: &str, path: &str) -> OperationResult {
        self.text_call("oss_download_annon", json!({ "url": url, "path": path }))
            .await
    }

    async fn text_call(&self, tool: &str, args: Value) -> OperationResult {
        let result = self.session.call_mcp_tool(tool, args).await;
        if !result.success {
            return OperationResult::failure(result.request_id, result.error_message);
        }
        OperationResult::success(result.request_id, Some(Value::String(result.data)))
    }
}

#[cfg(test)]
#[path = "oss.test.rs"]
mod tests;
