//! HTTP transport for the control plane.
//!
//! One call here is exactly one RPC: a form-encoded POST carrying the
//! action's request struct, answered by the JSON envelope. Retries are the
//! caller's business; only callers know which actions are idempotent.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;

use crate::api::types::ApiRequest;
use crate::api::types::ApiResponseBody;
use crate::api::types::API_VERSION;
use crate::api::types::SIGNATURE_ALGORITHM;
use crate::error::AgentBayError;
use crate::error::Result;

/// Transport configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Control-plane host, without scheme.
    pub endpoint: String,
    /// Read timeout in milliseconds.
    pub read_timeout_ms: u64,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Signature algorithm identifier.
    pub signature_algorithm: String,
    /// Region id forwarded to region-scoped actions.
    pub region_id: String,
}

impl ApiConfig {
    /// Build a transport config from the SDK configuration.
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            read_timeout_ms: config.timeout_ms,
            connect_timeout_ms: config.timeout_ms,
            signature_algorithm: SIGNATURE_ALGORITHM.to_string(),
            region_id: config.region_id.clone(),
        }
    }
}

/// The control-plane RPC client.
///
/// Cheap to clone; safe for concurrent calls. The only state is the
/// immutable configuration and the pooled HTTP client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: String,
    config: ApiConfig,
}

impl ApiClient {
    /// Create a new transport client.
    ///
    /// The endpoint is a bare host (`https://` is assumed) or a full URL.
    pub fn new(config: ApiConfig) -> Result<Self> {
        if config.endpoint.is_empty() {
            return Err(AgentBayError::Configuration(
                "endpoint is required".to_string(),
            ));
        }

        let base_url = if config.endpoint.contains("://") {
            config.endpoint.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", config.endpoint)
        };

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.read_timeout_ms))
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .build()?;

        Ok(Self {
            http_client,
            base_url,
            config,
        })
    }

    /// The configured region id.
    pub fn region_id(&self) -> &str {
        &self.config.region_id
    }

    /// Perform one RPC with the configured timeouts.
    pub async fn call<R: ApiRequest>(&self, request: &R) -> Result<ApiResponseBody> {
        self.call_with_timeouts(request, None, None).await
    }

    /// Perform one RPC, optionally overriding the read/connect timeouts for
    /// this call only.
    pub async fn call_with_timeouts<R: ApiRequest>(
        &self,
        request: &R,
        read_timeout: Option<Duration>,
        connect_timeout: Option<Duration>,
    ) -> Result<ApiResponseBody> {
        let url = format!(
            "{}/?Action={}&Version={}",
            self.base_url,
            R::ACTION,
            API_VERSION
        );

        let mut builder = self
            .http_client
            .post(&url)
            .headers(self.default_headers())
            .form(request);

        if read_timeout.is_some() || connect_timeout.is_some() {
            let read = read_timeout
                .unwrap_or(Duration::from_millis(self.config.read_timeout_ms));
            let connect = connect_timeout
                .unwrap_or(Duration::from_millis(self.config.connect_timeout_ms));
            builder = builder.timeout(read + connect);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::debug!(action = R::ACTION, error = %e, "rpc transport failure");
            AgentBayError::Network(e.to_string())
        })?;

        let status = response.status();
        let body_text = response.text().await?;

        if !status.is_success() {
            return Err(AgentBayError::HttpStatus {
                status: status.as_u16(),
                body: body_text,
            });
        }

        serde_json::from_str::<ApiResponseBody>(&body_text).map_err(|e| {
            AgentBayError::Parse(format!(
                "failed to parse {} response: {e}\nBody: {body_text}",
                R::ACTION
            ))
        })
    }

    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        if let Ok(value) = HeaderValue::from_str(&self.config.signature_algorithm) {
            headers.insert("x-signature-algorithm", value);
        }
        headers
    }
}

/// Try to parse the body of a non-2xx answer as an API envelope.
///
/// Error statuses still carry `{RequestId, Code, Message, …}` when the
/// control plane itself rejected the call; pure proxy errors do not.
pub fn parse_error_body(body: &str) -> Option<ApiResponseBody> {
    let parsed = serde_json::from_str::<ApiResponseBody>(body).ok()?;
    parsed.code.as_deref().filter(|c| !c.is_empty())?;
    Some(parsed)
}

#[cfg(test)]
#[path = "client.test.rs"]
mod tests;
