//! Browser bootstrap plumbing.
//!
//! The SDK does not own browser automation; it initializes the in-session
//! browser with an opaque option blob and hands back connection URLs.

use serde_json::Value;

use crate::api::types::GetCdpLinkRequest;
use crate::api::types::InitBrowserRequest;
use crate::response::BoolResult;
use crate::response::OperationResult;
use crate::session::Session;
use crate::session_params::BROWSER_DATA_PATH;

/// Environment variable disabling browser behavior simulation when `"0"`.
pub const BROWSER_BEHAVIOR_SIMULATE_ENV: &str = "AGENTBAY_BROWSER_BEHAVIOR_SIMULATE";

/// Browser plumbing bound to one session.
#[derive(Debug, Clone, Copy)]
pub struct Browser<'a> {
    session: &'a Session,
}

impl<'a> Browser<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Initialize the in-session browser.
    ///
    /// `option` is forwarded verbatim; recording and behavior-simulation
    /// flags are stamped in from session state and the environment.
    pub async fn initialize(&self, option: Option<Value>) -> BoolResult {
        let mut option = option.unwrap_or_else(|| Value::Object(Default::default()));
        if !option.is_object() {
            return BoolResult::failure("", "Browser option must be a JSON object");
        }
        if self.session.enable_browser_replay() {
            option["enableRecord"] = Value::Bool(true);
        }
        let simulate = std::env::var(BROWSER_BEHAVIOR_SIMULATE_ENV)
            .map(|v| v != "0")
            .unwrap_or(true);
        if !simulate {
            option["behaviorSimulate"] = Value::Bool(false);
        }

        let option_json = match serde_json::to_string(&option) {
            Ok(json) => json,
            Err(e) => return BoolResult::failure("", format!("Invalid browser option: {e}")),
        };

        let request = InitBrowserRequest {
            authorization: self.session.core().authorization(),
            session_id: self.session.session_id().to_string(),
            persistent_path: Some(BROWSER_DATA_PATH.to_string()),
            browser_option: Some(option_json),
        };

        tracing::debug!(session_id = self.session.session_id(), "InitBrowser");

        match self.session.core().api.call(&request).await {
            Ok(body) => {
                if let Some(error) = body.api_error() {
                    return BoolResult::failure(body.request_id, error);
                }
                // Initialization succeeded when the endpoint router port
                // shows up in the data.
                if body.data().get("Port").is_some() {
                    BoolResult::success(body.request_id)
                } else {
                    BoolResult::failure(body.request_id, "Browser initialization failed")
                }
            }
            Err(e) => BoolResult::failure("", format!("Failed to initialize browser: {e}")),
        }
    }

    /// The CDP websocket URL for driving the in-session browser.
    pub async fn cdp_url(&self, options: Option<&str>) -> OperationResult {
        let request = GetCdpLinkRequest {
            authorization: self.session.core().authorization(),
            session_id: self.session.session_id().to_string(),
            options: options.map(str::to_string),
        };

        match self.session.core().api.call(&request).await {
            Ok(body) => {
                if let Some(error) = body.api_error() {
                    return OperationResult::failure(body.request_id, error);
                }
                let url = body
                    .data()
                    .get("Url")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                OperationResult::success(body.request_id, Some(Value::String(url)))
            }
            Err(e) => OperationResult::failure("", format!("Failed to get CDP link: {e}")),
        }
    }
}

#[cfg(test)]
#[path = "browser.test.rs"]
mod tests;
