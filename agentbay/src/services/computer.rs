//! Desktop UI automation.

use serde::Deserialize;
use serde_json::json;
use serde_json::Value;

use crate::error::AgentBayError;
use crate::error::Result;
use crate::response::BoolResult;
use crate::response::OperationResult;
use crate::session::Session;

/// Mouse button for click and drag operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    DoubleLeft,
}

impl MouseButton {
    pub fn as_str(self) -> &'static str {
        match self {
            MouseButton::Left => "left",
            MouseButton::Right => "right",
            MouseButton::Middle => "middle",
            MouseButton::DoubleLeft => "double_left",
        }
    }

    /// Parse a button name; anything outside the accepted set is a
    /// validation error.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "left" => Ok(MouseButton::Left),
            "right" => Ok(MouseButton::Right),
            "middle" => Ok(MouseButton::Middle),
            "double_left" => Ok(MouseButton::DoubleLeft),
            other => Err(AgentBayError::Validation(format!(
                "Invalid mouse button: {other}. Valid values are: left, right, middle, double_left"
            ))),
        }
    }
}

/// Scroll direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

impl ScrollDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            ScrollDirection::Up => "up",
            ScrollDirection::Down => "down",
            ScrollDirection::Left => "left",
            ScrollDirection::Right => "right",
        }
    }
}

/// Screen dimensions.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct ScreenSize {
    pub width: i32,
    pub height: i32,
    #[serde(rename = "dpiScalingFactor")]
    pub dpi_scaling_factor: f64,
}

/// Cursor position.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct CursorPosition {
    pub x: i32,
    pub y: i32,
}

/// An installed application.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InstalledApp {
    pub name: String,
    pub start_cmd: String,
    pub stop_cmd: Option<String>,
    pub work_directory: Option<String>,
}

/// A running process.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Process {
    pub pname: String,
    pub pid: i64,
    pub cmdline: Option<String>,
}

/// A window in the remote desktop.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Window {
    pub window_id: i64,
    pub title: String,
    pub absolute_upper_left_x: Option<i32>,
    pub absolute_upper_left_y: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub pid: Option<i64>,
    pub pname: Option<String>,
    pub child_windows: Vec<Window>,
}

/// Result of listing installed applications.
#[derive(Debug, Clone, Default)]
pub struct InstalledAppListResult {
    pub request_id: String,
    pub success: bool,
    pub apps: Vec<InstalledApp>,
    pub error_message: String,
}

/// Result of listing processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessListResult {
    pub request_id: String,
    pub success: bool,
    pub processes: Vec<Process>,
    pub error_message: String,
}

/// Result of listing windows.
#[derive(Debug, Clone, Default)]
pub struct WindowListResult {
    pub request_id: String,
    pub success: bool,
    pub windows: Vec<Window>,
    pub error_message: String,
}

/// Result of a single-window query.
#[derive(Debug, Clone, Default)]
pub struct WindowInfoResult {
    pub request_id: String,
    pub success: bool,
    pub window: Option<Window>,
    pub error_message: String,
}

/// Desktop UI automation bound to one session.
#[derive(Debug, Clone, Copy)]
pub struct Computer<'a> {
    session: &'a Session,
}

impl<'a> Computer<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Click at screen coordinates.
    pub async fn click_mouse(&self, x: i32, y: i32, button: MouseButton) -> BoolResult {
        let args = json!({ "x": x, "y": y, "button": button.as_str() });
        self.bool_call("click_mouse", args).await
    }

    /// Move the cursor to screen coordinates.
    pub async fn move_mouse(&self, x: i32, y: i32) -> BoolResult {
        self.bool_call("move_mouse", json!({ "x": x, "y": y })).await
    }

    /// Drag from one point to another with a held button.
    pub async fn drag_mouse(
        &self,
        from_x: i32,
        from_y: i32,
        to_x: i32,
        to_y: i32,
        button: MouseButton,
    ) -> BoolResult {
        let args = json!({
            "from_x": from_x,
            "from_y": from_y,
            "to_x": to_x,
            "to_y": to_y,
            "button": button.as_str(),
        });
        self.bool_call("drag_mouse", args).await
    }

    /// Scroll at a point.
    pub async fn scroll(
        &self,
        x: i32,
        y: i32,
        direction: ScrollDirection,
        amount: i32,
    ) -> BoolResult {
        let args = json!({
            "x": x,
            "y": y,
            "direction": direction.as_str(),
            "amount": amount,
        });
        self.bool_call("scroll", args).await
    }

    /// Current cursor position.
    pub async fn get_cursor_position(&self) -> OperationResult {
        let result = self.session.call_mcp_tool("get_cursor_position", json!({})).await;
        json_operation_result(result)
    }

    /// Type text into the focused element.
    pub async fn input_text(&self, text: &str) -> BoolResult {
        self.bool_call("input_text", json!({ "text": text })).await
    }

    /// Press (and release) a key combination.
    ///
    /// Key names are case-insensitive; the dispatcher normalizes them.
    pub async fn press_keys(&self, keys: &[&str], hold: bool) -> BoolResult {
        self.bool_call("press_keys", json!({ "keys": keys, "hold": hold }))
            .await
    }

    /// Release previously held keys.
    pub async fn release_keys(&self, keys: &[&str]) -> BoolResult {
        self.bool_call("release_keys", json!({ "keys": keys })).await
    }

    /// Screen dimensions and DPI scaling.
    pub async fn get_screen_size(&self) -> OperationResult {
        let result = self.session.call_mcp_tool("get_screen_size", json!({})).await;
        json_operation_result(result)
    }

    /// Take a screenshot; the data is a URL to the captured image.
    pub async fn screenshot(&self) -> OperationResult {
        let result = self.session.call_mcp_tool("system_screenshot", json!({})).await;
        if !result.success {
            return OperationResult::failure(result.request_id, result.error_message);
        }
        OperationResult::success(result.request_id, Some(Value::String(result.data)))
    }

    /// List root windows.
    pub async fn list_root_windows(&self) -> WindowListResult {
        let result = self.session.call_mcp_tool("list_root_windows", json!({})).await;
        parse_window_list(result)
    }

    /// The currently focused window.
    pub async fn get_active_window(&self) -> WindowInfoResult {
        let result = self.session.call_mcp_tool("get_active_window", json!({})).await;
        if !result.success {
            return WindowInfoResult {
                request_id: result.request_id,
                success: false,
                window: None,
                error_message: result.error_message,
            };
        }
        match serde_json::from_str::<Window>(&result.data) {
            Ok(window) => WindowInfoResult {
                request_id: result.request_id,
                success: true,
                window: Some(window),
                error_message: String::new(),
            },
            Err(e) => WindowInfoResult {
                request_id: result.request_id,
                success: false,
                window: None,
                error_message: format!("Failed to parse window data: {e}"),
            },
        }
    }

    /// Bring a window to the foreground.
    pub async fn activate_window(&self, window_id: i64) -> BoolResult {
        self.window_call("activate_window", window_id).await
    }

    /// Maximize a window.
    pub async fn maximize_window(&self, window_id: i64) -> BoolResult {
        self.window_call("maximize_window", window_id).await
    }

    /// Minimize a window.
    pub async fn minimize_window(&self, window_id: i64) -> BoolResult {
        self.window_call("minimize_window", window_id).await
    }

    /// Restore a window.
    pub async fn restore_window(&self, window_id: i64) -> BoolResult {
        self.window_call("restore_window", window_id).await
    }

    /// Close a window.
    pub async fn close_window(&self, window_id: i64) -> BoolResult {
        self.window_call("close_window", window_id).await
    }

    /// Make a window fullscreen.
    pub async fn fullscreen_window(&self, window_id: i64) -> BoolResult {
        self.window_call("fullscreen_window", window_id).await
    }

    /// List applications installed in the session.
    pub async fn get_installed_apps(
        &self,
        start_menu: bool,
        desktop: bool,
        ignore_system_apps: bool,
    ) -> InstalledAppListResult {
        let args = json!({
            "start_menu": start_menu,
            "desktop": desktop,
            "ignore_system_apps": ignore_system_apps,
        });
        let result = self.session.call_mcp_tool("get_installed_apps", args).await;
        if !result.success {
            return InstalledAppListResult {
                request_id: result.request_id,
                success: false,
                apps: Vec::new(),
                error_message: result.error_message,
            };
        }
        match serde_json::from_str::<Vec<InstalledApp>>(&result.data) {
            Ok(apps) => InstalledAppListResult {
                request_id: result.request_id,
                success: true,
                apps,
                error_message: String::new(),
            },
            Err(e) => InstalledAppListResult {
                request_id: result.request_id,
                success: false,
                apps: Vec::new(),
                error_message: format!("Failed to parse apps data: {e}"),
            },
        }
    }

    /// Start an application by its start command.
    pub async fn start_app(
        &self,
        start_cmd: &str,
        work_directory: Option<&str>,
    ) -> ProcessListResult {
        let mut args = json!({ "start_cmd": start_cmd });
        if let Some(work_directory) = work_directory {
            args["work_directory"] = json!(work_directory);
        }
        let result = self.session.call_mcp_tool("start_app", args).await;
        parse_process_list(result)
    }

    /// List applications with visible windows.
    pub async fn list_visible_apps(&self) -> ProcessListResult {
        let result = self.session.call_mcp_tool("list_visible_apps", json!({})).await;
        parse_process_list(result)
    }

    /// Stop an application by process name.
    pub async fn stop_app_by_pname(&self, pname: &str) -> BoolResult {
        self.bool_call("stop_app_by_pname", json!({ "pname": pname }))
            .await
    }

    /// Stop an application by pid.
    pub async fn stop_app_by_pid(&self, pid: i64) -> BoolResult {
        self.bool_call("stop_app_by_pid", json!({ "pid": pid })).await
    }

    /// Stop an application with a stop command.
    pub async fn stop_app_by_cmd(&self, stop_cmd: &str) -> BoolResult {
        self.bool_call("stop_app_by_cmd", json!({ "stop_cmd": stop_cmd }))
            .await
    }

    async fn bool_call(&self, tool: &str, args: Value) -> BoolResult {
        let result = self.session.call_mcp_tool(tool, args).await;
        if result.success {
            BoolResult::success(result.request_id)
        } else {
            BoolResult::failure(result.request_id, result.error_message)
        }
    }

    async fn window_call(&self, tool: &str, window_id: i64) -> BoolResult {
        self.bool_call(tool, json!({ "window_id": window_id })).await
    }
}

fn json_operation_result(result: crate::response::McpToolResult) -> OperationResult {
    if !result.success {
        return OperationResult::failure(result.request_id, result.error_message);
    }
    match serde_json::from_str::<Value>(&result.data) {
        Ok(value) => OperationResult::success(result.request_id, Some(value)),
        Err(e) => OperationResult::failure(
            result.request_id,
            format!("Failed to parse response data: {e}"),
        ),
    }
}

fn parse_window_list(result: crate::response::McpToolResult) -> WindowListResult {
    if !result.success {
        return WindowListResult {
            request_id: result.request_id,
            success: false,
            windows: Vec::new(),
            error_message: result.error_message,
        };
    }
    match serde_json::from_str::<Vec<Window>>(&result.data) {
        Ok(windows) => WindowListResult {
            request_id: result.request_id,
            success: true,
            windows,
            error_message: String::new(),
        },
        Err(e) => WindowListResult {
            request_id: result.request_id,
            success: false,
            windows: Vec::new(),
            error_message: format!("Failed to parse window data: {e}"),
        },
    }
}

fn parse_process_list(result: crate::response::McpToolResult) -> ProcessListResult {
    if !result.success {
        return ProcessListResult {
            request_id: result.request_id,
            success: false,
            processes: Vec::new(),
            error_message: result.error_message,
        };
    }
    match serde_json::from_str::<Vec<Process>>(&result.data) {
        Ok(processes) => ProcessListResult {
            request_id: result.request_id,
            success: true,
            processes,
            error_message: String::new(),
        },
        Err(e) => ProcessListResult {
            request_id: result.request_id,
            success: false,
            processes: Vec::new(),
            error_message: format!("Failed to parse process data: {e}"),
        },
    }
}

#[cfg(test)]
#[path = "computer.test.rs"]
mod tests;
