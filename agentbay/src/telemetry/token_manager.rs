//! STS token side channel for the telemetry pipeline.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;

use crate::error::AgentBayError;
use crate::error::Result;

/// Endpoint answering `GetTerminalReportToken`.
pub const TOKEN_ENDPOINT: &str = "https://wyota.cn-hangzhou.aliyuncs.com";

const TOKEN_API_VERSION: &str = "2021-04-20";
const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Short-lived credentials for the log store.
#[derive(Debug, Clone, Default)]
pub struct StsToken {
    pub access_key_id: String,
    pub access_key_secret: String,
    pub security_token: String,
    pub expiration: String,
}

/// Where the log store lives.
#[derive(Debug, Clone, Default)]
pub struct TraceSlsInfo {
    pub project: String,
    pub log_store: String,
    pub log_store_path: String,
    pub log_store_url: String,
    pub server_url: String,
}

/// Parsed answer of `GetTerminalReportToken`.
#[derive(Debug, Clone, Default)]
pub struct TokenResponse {
    pub code: String,
    pub request_id: String,
    pub success: bool,
    pub sts_token: Option<StsToken>,
    pub trace_sls_info: Option<TraceSlsInfo>,
}

/// Fetches and ages STS tokens.
#[derive(Debug)]
pub struct TokenManager {
    uuid: String,
    http: reqwest::Client,
    endpoint: String,
    requesting: AtomicBool,
    success_time_ms: AtomicI64,
}

impl TokenManager {
    pub fn new() -> Self {
        Self::with_endpoint(TOKEN_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            uuid: uuid::Uuid::new_v4().to_string(),
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            requesting: AtomicBool::new(false),
            success_time_ms: AtomicI64::new(0),
        }
    }

    /// Stable installation id stamped on every event.
    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// Whether the cached token is older than 24 hours.
    pub fn is_token_invalid(&self) -> bool {
        let now = Utc::now().timestamp_millis();
        now - self.success_time_ms.load(Ordering::Relaxed) >= MILLIS_PER_DAY
    }

    /// Request a fresh token.
    ///
    /// Single-flight: a request already in progress makes this return
    /// `Ok(None)` immediately.
    pub async fn request_token(&self) -> Result<Option<TokenResponse>> {
        if self
            .requesting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("token request already in flight");
            return Ok(None);
        }

        let outcome = self.request_token_inner().await;
        self.requesting.store(false, Ordering::Release);

        let response = outcome?;
        if response.success {
            self.success_time_ms
                .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
            tracing::info!(request_id = %response.request_id, "telemetry token refreshed");
        }
        Ok(Some(response))
    }

    async fn request_token_inner(&self) -> Result<TokenResponse> {
        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let form = [
            ("Format", "json"),
            ("Version", TOKEN_API_VERSION),
            ("product", "wyota"),
            ("Timestamp", timestamp.as_str()),
            ("Action", "GetTerminalReportToken"),
            ("Uuid", self.uuid.as_str()),
            ("NetworkType", "internet"),
        ];

        let response = self
            .http
            .post(&self.endpoint)
            .timeout(REQUEST_TIMEOUT)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AgentBayError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        parse_token_response(&body)
    }
}

impl Default for TokenManager {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_token_response(body: &str) -> Result<TokenResponse> {
    let root: Value = serde_json::from_str(body)
        .map_err(|e| AgentBayError::Parse(format!("invalid token response: {e}")))?;

    if root.get("Code").is_none() || root.get("Data").is_none() {
        return Err(AgentBayError::Parse(
            "invalid token response: missing Code or Data".to_string(),
        ));
    }

    let mut response = TokenResponse {
        code: string_of(&root, "Code"),
        request_id: root
            .get("RequestId")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string(),
        success: root.get("Success").and_then(Value::as_bool).unwrap_or(false),
        sts_token: None,
        trace_sls_info: None,
    };

    let data = &root["Data"];
    let Some(token) = data.get("StsToken") else {
        return Err(AgentBayError::Parse(
            "invalid token response: missing StsToken".to_string(),
        ));
    };

    response.sts_token = Some(StsToken {
        access_key_id: string_of(token, "AccessKeyId"),
        access_key_secret: string_of(token, "AccessKeySecret"),
        security_token: string_of(token, "SecurityToken"),
        expiration: string_of(token, "Expiration"),
    });

    response.trace_sls_info = Some(match token.get("TraceSlsInfo") {
        Some(sls) => TraceSlsInfo {
            project: string_of(sls, "Project"),
            log_store: string_of(sls, "LogStore"),
            log_store_path: string_of(sls, "LogStorePath"),
            log_store_url: string_of(sls, "LogStoreUrl"),
            server_url: string_of(sls, "ServerUrl"),
        },
        None => TraceSlsInfo::default(),
    });

    Ok(response)
}

fn string_of(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
#[path = "token_manager.test.rs"]
mod tests;
