//! Minimal log-store client speaking the SLS-compatible PutLogs protocol.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::AgentBayError;
use crate::error::Result;
use crate::telemetry::token_manager::StsToken;

/// Topic stamped on every uploaded log group.
pub const LOG_TOPIC: &str = "rust_sdk_trace";

const LOG_API_VERSION: &str = "0.6.0";

/// One event, already flattened to string fields.
pub type LogItem = BTreeMap<String, String>;

/// Pushes log items to one project/logstore with swappable credentials.
///
/// Credentials swap atomically; a put already in flight keeps the
/// credentials it started with.
#[derive(Debug)]
pub struct LogStoreClient {
    http: reqwest::Client,
    endpoint: String,
    project: String,
    logstore: String,
    credentials: RwLock<StsToken>,
}

impl LogStoreClient {
    pub fn new(
        endpoint: impl Into<String>,
        project: impl Into<String>,
        logstore: impl Into<String>,
        credentials: StsToken,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            project: project.into(),
            logstore: logstore.into(),
            credentials: RwLock::new(credentials),
        }
    }

    /// Swap in fresh credentials.
    pub fn update_credentials(&self, credentials: StsToken) {
        if let Ok(mut slot) = self.credentials.write() {
            *slot = credentials;
        }
    }

    fn snapshot_credentials(&self) -> StsToken {
        self.credentials
            .read()
            .map(|creds| creds.clone())
            .unwrap_or_default()
    }

    /// Upload a batch of log items.
    pub async fn put_logs(&self, items: &[LogItem]) -> Result<()> {
        let credentials = self.snapshot_credentials();

        let logs: Vec<_> = items
            .iter()
            .map(|item| serde_json::json!(item))
            .collect();
        let body = serde_json::json!({
            "__topic__": LOG_TOPIC,
            "__logs__": logs,
        });
        let payload = serde_json::to_vec(&body)?;

        let url = format!(
            "{}/logstores/{}/track",
            self.endpoint.trim_end_matches('/'),
            self.logstore
        );

        let response = self
            .http
            .post(&url)
            .header("x-log-apiversion", LOG_API_VERSION)
            .header("x-log-bodyrawsize", payload.len().to_string())
            .header("x-log-project", &self.project)
            .header("x-acs-security-token", &credentials.security_token)
            .header(
                "Authorization",
                format!("LOG {}", credentials.access_key_id),
            )
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentBayError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "log_client.test.rs"]
mod tests;
