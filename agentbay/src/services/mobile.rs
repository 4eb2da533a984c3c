//! Mobile UI automation and device configuration.

use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use serde_json::Value;

use crate::api::types::GetAdbLinkRequest;
use crate::response::BoolResult;
use crate::response::OperationResult;
use crate::session::Session;

/// Advanced per-environment configuration attached at session creation.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExtraConfigs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<MobileExtraConfig>,
}

/// Mobile device configuration.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MobileExtraConfig {
    /// Lock the display resolution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_resolution: Option<bool>,
    /// App launch permission rules.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_manager_rule: Option<AppManagerRule>,
    /// Hide the navigation bar.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_navigation_bar: Option<bool>,
    /// Packages protected from uninstallation.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub uninstall_blacklist: Vec<String>,
    /// Device simulation settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulate_config: Option<MobileSimulateConfig>,
}

/// App whitelist/blacklist rule.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AppManagerRule {
    /// `White` or `Black`.
    pub rule_type: String,
    pub app_package_name_list: Vec<String>,
}

/// Device simulation settings.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MobileSimulateConfig {
    /// Run device simulation after session creation.
    pub simulate: bool,
    /// In-session directory holding the simulation data.
    pub simulate_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulate_mode: Option<SimulateMode>,
    /// Context carrying the device-info payload; mounted automatically.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulated_context_id: Option<String>,
}

/// What the post-create simulation command applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SimulateMode {
    PropertiesOnly,
    SensorsOnly,
    PackagesOnly,
    ServicesOnly,
    All,
}

impl SimulateMode {
    /// The literal flag passed to `wya apply`.
    pub(crate) fn apply_flag(self) -> &'static str {
        match self {
            SimulateMode::PropertiesOnly => "",
            SimulateMode::SensorsOnly => "-sensors",
            SimulateMode::PackagesOnly => "-packages",
            SimulateMode::ServicesOnly => "-services",
            SimulateMode::All => "-all",
        }
    }
}

/// A node of the UI element tree.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UiElement {
    pub bounds: String,
    #[serde(rename = "className")]
    pub class_name: String,
    pub text: String,
    #[serde(rename = "type")]
    pub element_type: String,
    #[serde(rename = "resourceId")]
    pub resource_id: String,
    pub index: Option<i64>,
    #[serde(rename = "isParent")]
    pub is_parent: Option<bool>,
    pub children: Vec<UiElement>,
}

/// Result of UI element queries.
#[derive(Debug, Clone, Default)]
pub struct UiElementListResult {
    pub request_id: String,
    pub success: bool,
    pub elements: Vec<UiElement>,
    pub error_message: String,
}

/// Result of an ADB connection-string query.
#[derive(Debug, Clone, Default)]
pub struct AdbUrlResult {
    pub request_id: String,
    pub success: bool,
    /// For example `adb connect <ip>:<port>`.
    pub url: String,
    pub error_message: String,
}

/// Mobile automation bound to one session.
#[derive(Debug, Clone, Copy)]
pub struct Mobile<'a> {
    session: &'a Session,
}

impl<'a> Mobile<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Tap the screen.
    pub async fn tap(&self, x: i32, y: i32) -> BoolResult {
        self.bool_call("tap", json!({ "x": x, "y": y })).await
    }

    /// Swipe between two points.
    pub async fn swipe(
        &self,
        start_x: i32,
        start_y: i32,
        end_x: i32,
        end_y: i32,
        duration_ms: u64,
    ) -> BoolResult {
        let args = json!({
            "start_x": start_x,
            "start_y": start_y,
            "end_x": end_x,
            "end_y": end_y,
            "duration_ms": duration_ms,
        });
        self.bool_call("swipe", args).await
    }

    /// Type text into the focused element.
    pub async fn input_text(&self, text: &str) -> BoolResult {
        self.bool_call("input_text", json!({ "text": text })).await
    }

    /// Send an Android key code.
    pub async fn send_key(&self, key: i32) -> BoolResult {
        self.bool_call("send_key", json!({ "key": key })).await
    }

    /// Clickable elements of the current screen.
    pub async fn get_clickable_ui_elements(&self, timeout_ms: u64) -> UiElementListResult {
        let result = self
            .session
            .call_mcp_tool("get_clickable_ui_elements", json!({ "timeout_ms": timeout_ms }))
            .await;
        parse_ui_elements(result)
    }

    /// The full UI element tree of the current screen.
    pub async fn get_all_ui_elements(&self, timeout_ms: u64) -> UiElementListResult {
        let result = self
            .session
            .call_mcp_tool("get_all_ui_elements", json!({ "timeout_ms": timeout_ms }))
            .await;
        parse_ui_elements(result)
    }

    /// Take a screenshot; the data is a URL to the captured image.
    pub async fn screenshot(&self) -> OperationResult {
        let result = self.session.call_mcp_tool("system_screenshot", json!({})).await;
        if !result.success {
            return OperationResult::failure(result.request_id, result.error_message);
        }
        OperationResult::success(result.request_id, Some(Value::String(result.data)))
    }

    /// List installed applications.
    pub async fn get_installed_apps(
        &self,
        start_menu: bool,
        desktop: bool,
        ignore_system_apps: bool,
    ) -> OperationResult {
        let args = json!({
            "start_menu": start_menu,
            "desktop": desktop,
            "ignore_system_apps": ignore_system_apps,
        });
        let result = self.session.call_mcp_tool("get_installed_apps", args).await;
        if !result.success {
            return OperationResult::failure(result.request_id, result.error_message);
        }
        match serde_json::from_str::<Value>(&result.data) {
            Ok(value) => OperationResult::success(result.request_id, Some(value)),
            Err(e) => OperationResult::failure(
                result.request_id,
                format!("Failed to parse apps data: {e}"),
            ),
        }
    }

    /// Start an application.
    pub async fn start_app(&self, start_cmd: &str, activity: Option<&str>) -> BoolResult {
        let mut args = json!({ "start_cmd": start_cmd });
        if let Some(activity) = activity {
            args["activity"] = json!(activity);
        }
        self.bool_call("start_app", args).await
    }

    /// Stop an application with a stop command.
    pub async fn stop_app_by_cmd(&self, stop_cmd: &str) -> BoolResult {
        self.bool_call("stop_app_by_cmd", json!({ "stop_cmd": stop_cmd }))
            .await
    }

    /// The ADB connection string for this session.
    pub async fn adb_url(&self) -> AdbUrlResult {
        let request = GetAdbLinkRequest {
            authorization: self.session.core().authorization(),
            session_id: self.session.session_id().to_string(),
        };

        match self.session.core().api.call(&request).await {
            Ok(body) => {
                if let Some(error) = body.api_error() {
                    return AdbUrlResult {
                        request_id: body.request_id,
                        error_message: error,
                        ..Default::default()
                    };
                }
                let url = body
                    .data()
                    .get("Url")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                AdbUrlResult {
                    request_id: body.request_id,
                    success: true,
                    url,
                    error_message: String::new(),
                }
            }
            Err(e) => AdbUrlResult {
                error_message: format!("Failed to get ADB URL: {e}"),
                ..Default::default()
            },
        }
    }

    /// Apply a [`MobileExtraConfig`] through in-session commands.
    ///
    /// Called automatically during session creation when extra configs are
    /// present; safe to call again to reconfigure. Individual command
    /// failures are logged and do not abort the rest.
    pub async fn configure(&self, config: &MobileExtraConfig) {
        if let Some(lock) = config.lock_resolution {
            self.set_resolution_lock(lock).await;
        }
        if let Some(rule) = &config.app_manager_rule {
            if !rule.app_package_name_list.is_empty() {
                match rule.rule_type.as_str() {
                    "White" => self.set_app_whitelist(&rule.app_package_name_list).await,
                    "Black" => self.set_app_blacklist(&rule.app_package_name_list).await,
                    other => {
                        tracing::warn!(rule_type = other, "unknown app manager rule type");
                    }
                }
            } else if !rule.rule_type.is_empty() {
                tracing::warn!(rule_type = %rule.rule_type, "no package names provided");
            }
        }
        if let Some(hide) = config.hide_navigation_bar {
            self.set_navigation_bar_visibility(hide).await;
        }
        if !config.uninstall_blacklist.is_empty() {
            self.set_uninstall_blacklist(&config.uninstall_blacklist).await;
        }
    }

    /// Lock or unlock the display resolution.
    pub async fn set_resolution_lock(&self, enable: bool) {
        let flag = if enable { 1 } else { 0 };
        self.run_config_command(
            &format!("setprop persist.wya.lock_resolution {flag}"),
            "resolution lock",
        )
        .await;
    }

    /// Restrict app launching to a whitelist.
    pub async fn set_app_whitelist(&self, package_names: &[String]) {
        let list = package_names.join("\n");
        self.run_config_command(
            &format!("echo '{list}' > /data/local/tmp/app_whitelist; wya app_rule -white /data/local/tmp/app_whitelist"),
            "app whitelist",
        )
        .await;
    }

    /// Block app launching by a blacklist.
    pub async fn set_app_blacklist(&self, package_names: &[String]) {
        let list = package_names.join("\n");
        self.run_config_command(
            &format!("echo '{list}' > /data/local/tmp/app_blacklist; wya app_rule -black /data/local/tmp/app_blacklist"),
            "app blacklist",
        )
        .await;
    }

    /// Hide or show the navigation bar.
    pub async fn set_navigation_bar_visibility(&self, hide: bool) {
        let command = if hide {
            "settings put global policy_control immersive.navigation=*"
        } else {
            "settings put global policy_control null"
        };
        self.run_config_command(command, "navigation bar visibility")
            .await;
    }

    /// Protect packages from uninstallation.
    pub async fn set_uninstall_blacklist(&self, package_names: &[String]) {
        let list = package_names.join(";");
        self.run_config_command(
            &format!("setprop persist.wya.uninstall_blacklist '{list}'"),
            "uninstall blacklist",
        )
        .await;
    }

    /// Run the post-create device simulation command.
    pub(crate) async fn run_simulation(&self, simulate_path: &str, mode: Option<SimulateMode>) {
        let flag = mode.unwrap_or(SimulateMode::PropertiesOnly).apply_flag();
        let dev_info = format!("{simulate_path}/dev_info.json");
        let command = format!("chmod -R a+rwx {simulate_path}; wya apply {flag} {dev_info}")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        tracing::info!(command = %command, "running mobile simulation");
        let result = self.session.command().execute_command(&command).await;
        if result.success {
            tracing::info!(output = %result.output.trim(), "mobile simulation completed");
        } else {
            tracing::warn!(error = %result.error_message, "mobile simulation command failed");
        }
    }

    async fn run_config_command(&self, command: &str, operation: &str) {
        tracing::info!(operation, "applying mobile configuration");
        let result = self.session.command().execute_command(command).await;
        if result.success {
            tracing::info!(operation, "mobile configuration applied");
        } else {
            tracing::error!(operation, error = %result.error_message, "mobile configuration failed");
        }
    }

    async fn bool_call(&self, tool: &str, args: Value) -> BoolResult {
        let result = self.session.call_mcp_tool(tool, args).await;
        if result.success {
            BoolResult::success(result.request_id)
        } else {
            BoolResult::failure(result.request_id, result.error_message)
        }
    }
}

fn parse_ui_elements(result: crate::response::McpToolResult) -> UiElementListResult {
    if !result.success {
        return UiElementListResult {
            request_id: result.request_id,
            success: false,
            elements: Vec::new(),
            error_message: result.error_message,
        };
    }
    match serde_json::from_str::<Vec<UiElement>>(&result.data) {
        Ok(elements) => UiElementListResult {
            request_id: result.request_id,
            success: true,
            elements,
            error_message: String::new(),
        },
        Err(e) => UiElementListResult {
            request_id: result.request_id,
            success: false,
            elements: Vec::new(),
            error_message: format!("Failed to parse UI elements: {e}"),
        },
    }
}

#[cfg(test)]
#[path = "mobile.test.rs"]
mod tests;
