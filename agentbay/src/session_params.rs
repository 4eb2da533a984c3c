//! Parameters for creating and listing sessions.

use std::collections::HashMap;

use crate::context_sync::ContextSync;
use crate::services::mobile::ExtraConfigs;

/// Fixed in-session mount point for synchronized browser data.
pub(crate) const BROWSER_DATA_PATH: &str = "/tmp/agentbay_browser";

/// Fixed in-session mount point for mobile simulation data.
pub(crate) const MOBILE_INFO_DEFAULT_PATH: &str = "/data/local/tmp/mobile_info";

/// Browser data persistence bound to a session.
///
/// Produces a synthetic context-sync entry covering the browser profile
/// files; the browser itself is driven elsewhere, this only persists its
/// state.
#[derive(Debug, Clone)]
pub struct BrowserContext {
    /// Context holding the browser data.
    pub context_id: String,
    /// Upload browser data automatically when the session ends.
    pub auto_upload: bool,
}

impl BrowserContext {
    pub fn new(context_id: impl Into<String>, auto_upload: bool) -> Self {
        Self {
            context_id: context_id.into(),
            auto_upload,
        }
    }
}

/// Parameters for [`crate::AgentBay::create`].
#[derive(Debug, Clone, Default)]
pub struct CreateSessionParams {
    /// Custom labels attached to the session.
    pub labels: HashMap<String, String>,
    /// Image to boot the session from.
    pub image_id: Option<String>,
    /// Context-sync bindings mounted into the session.
    pub context_syncs: Vec<ContextSync>,
    /// Browser data persistence.
    pub browser_context: Option<BrowserContext>,
    /// Lease VPC resources; tool calls then go to the in-session endpoint.
    pub is_vpc: bool,
    /// Policy applied at creation.
    pub policy_id: Option<String>,
    /// Browser recording; the service default is on, so only an explicit
    /// `false` is transmitted.
    pub enable_browser_replay: Option<bool>,
    /// Advanced device configuration (mobile environments).
    pub extra_configs: Option<ExtraConfigs>,
    /// Framework name stamped into the SDK stats (e.g. "langchain").
    pub framework: String,
}

impl CreateSessionParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_labels(mut self, labels: HashMap<String, String>) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_image_id(mut self, image_id: impl Into<String>) -> Self {
        self.image_id = Some(image_id.into());
        self
    }

    pub fn with_context_sync(mut self, sync: ContextSync) -> Self {
        self.context_syncs.push(sync);
        self
    }

    pub fn with_browser_context(mut self, browser_context: BrowserContext) -> Self {
        self.browser_context = Some(browser_context);
        self
    }

    pub fn with_is_vpc(mut self, is_vpc: bool) -> Self {
        self.is_vpc = is_vpc;
        self
    }

    pub fn with_policy_id(mut self, policy_id: impl Into<String>) -> Self {
        self.policy_id = Some(policy_id.into());
        self
    }

    pub fn with_browser_replay(mut self, enable: bool) -> Self {
        self.enable_browser_replay = Some(enable);
        self
    }

    pub fn with_extra_configs(mut self, extra_configs: ExtraConfigs) -> Self {
        self.extra_configs = Some(extra_configs);
        self
    }

    pub fn with_framework(mut self, framework: impl Into<String>) -> Self {
        self.framework = framework.into();
        self
    }
}

/// Parameters for [`crate::AgentBay::list`].
#[derive(Debug, Clone)]
pub struct ListSessionParams {
    /// Number of results per page.
    pub max_results: u32,
    /// Server-issued continuation token.
    pub next_token: String,
    /// Label filter.
    pub labels: HashMap<String, String>,
}

impl Default for ListSessionParams {
    fn default() -> Self {
        Self {
            max_results: 10,
            next_token: String::new(),
            labels: HashMap::new(),
        }
    }
}

#[cfg(test)]
#[path = "session_params.test.rs"]
mod tests;
