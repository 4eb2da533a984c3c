//! Tool-call dispatch.
//!
//! Every per-session operation funnels through [`Session::call_mcp_tool`],
//! which routes either through the control-plane `CallMcpTool` action or,
//! for VPC sessions, directly to the in-session HTTP endpoint. Both paths
//! answer with `{content: [{type, text}, …], isError}`; the first text
//! element is the tool output.

use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use rand::Rng;
use serde::Deserialize;
use serde_json::Value;

use crate::api::types::CallMcpToolRequest;
use crate::api::types::ListMcpToolsRequest;
use crate::response::McpToolResult;
use crate::session::Session;

/// Default image when a session does not carry one.
pub(crate) const DEFAULT_IMAGE_ID: &str = "linux_latest";

const VPC_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// A server-resident tool as reported by `ListMcpTools`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct McpTool {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "inputSchema")]
    pub input_schema: Value,
    #[serde(default)]
    pub server: String,
    #[serde(default)]
    pub tool: String,
}

/// Result of `ListMcpTools`.
#[derive(Debug, Clone, Default)]
pub struct McpToolsResult {
    pub request_id: String,
    pub tools: Vec<McpTool>,
}

/// Per-call overrides for [`Session::call_mcp_tool`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CallToolOptions {
    /// Read-timeout override for this call.
    pub read_timeout: Option<Duration>,
    /// Connect-timeout override for this call.
    pub connect_timeout: Option<Duration>,
    /// Ask the control plane to lazily create the session if absent.
    pub auto_gen_session: bool,
}

/// Wire shape of a tool response, shared by both transports.
#[derive(Debug, Default, Deserialize)]
struct ToolOutput {
    #[serde(default)]
    content: Vec<ToolContent>,
    #[serde(default, rename = "isError")]
    is_error: bool,
}

#[derive(Debug, Default, Deserialize)]
struct ToolContent {
    #[serde(default)]
    text: String,
}

impl ToolOutput {
    /// The single text element the service guarantees for tool outputs.
    fn text(&self) -> String {
        self.content
            .first()
            .map(|c| c.text.clone())
            .unwrap_or_default()
    }
}

impl Session {
    /// Invoke a named tool with JSON arguments.
    ///
    /// Tool-level errors (`isError == true`) come back as a failure envelope
    /// with the tool's text as `error_message`, never as `Err`.
    pub async fn call_mcp_tool(&self, tool_name: &str, args: Value) -> McpToolResult {
        self.call_mcp_tool_with_options(tool_name, args, CallToolOptions::default())
            .await
    }

    /// Invoke a named tool with per-call options.
    pub async fn call_mcp_tool_with_options(
        &self,
        tool_name: &str,
        args: Value,
        options: CallToolOptions,
    ) -> McpToolResult {
        let args = normalize_args(tool_name, args);
        let args_json = match serde_json::to_string(&args) {
            Ok(json) => json,
            Err(e) => {
                return McpToolResult::failure("", format!("Failed to serialize args: {e}"));
            }
        };

        if self.is_vpc() {
            self.call_tool_vpc(tool_name, &args_json).await
        } else {
            self.call_tool_api(tool_name, &args_json, options).await
        }
    }

    async fn call_tool_api(
        &self,
        tool_name: &str,
        args_json: &str,
        options: CallToolOptions,
    ) -> McpToolResult {
        tracing::debug!(
            tool = tool_name,
            session_id = self.session_id(),
            args_len = args_json.len(),
            "CallMcpTool"
        );

        let request = CallMcpToolRequest {
            authorization: self.core().authorization(),
            session_id: self.session_id().to_string(),
            name: tool_name.to_string(),
            args: args_json.to_string(),
            auto_gen_session: options.auto_gen_session.then_some(true),
            ..Default::default()
        };

        let body = match self
            .core()
            .api
            .call_with_timeouts(&request, options.read_timeout, options.connect_timeout)
            .await
        {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(tool = tool_name, error = %e, "CallMcpTool request failed");
                return McpToolResult::failure("", format!("API request failed: {e}"));
            }
        };

        let request_id = body.request_id.clone();
        if let Some(error) = body.api_error() {
            return McpToolResult::failure(request_id, error);
        }

        // Data arrives either as a JSON object or as a JSON-encoded string.
        let data = match body.data {
            Some(Value::String(text)) if !text.is_empty() => {
                match serde_json::from_str::<Value>(&text) {
                    Ok(value) => value,
                    Err(e) => {
                        return McpToolResult::failure(
                            request_id,
                            format!("Failed to parse response data: {e}"),
                        );
                    }
                }
            }
            Some(value @ Value::Object(_)) => value,
            _ => {
                return McpToolResult::failure(request_id, "Empty response data");
            }
        };

        finish_tool_call(tool_name, request_id, &data)
    }

    async fn call_tool_vpc(&self, tool_name: &str, args_json: &str) -> McpToolResult {
        let server = self.find_server_for_tool(tool_name);
        let Some(server) = server else {
            let message = format!("server not found for tool: {tool_name}");
            tracing::error!(tool = tool_name, "{message}");
            return McpToolResult::failure("", message);
        };

        let ip = self.network_interface_ip();
        let port = self.http_port();
        if ip.is_empty() || port.is_empty() {
            return McpToolResult::failure(
                "",
                format!(
                    "VPC network configuration incomplete: networkInterfaceIp={ip}, httpPort={port}"
                ),
            );
        }

        let request_id = generate_vpc_request_id();
        let url = format!(
            "http://{ip}:{port}/callTool?server={}&tool={}&args={}&token={}&requestId={}",
            urlencoding::encode(&server),
            urlencoding::encode(tool_name),
            urlencoding::encode(args_json),
            urlencoding::encode(self.token()),
            urlencoding::encode(&request_id),
        );

        tracing::debug!(tool = tool_name, server = %server, "CallMcpTool (VPC)");

        let response = self
            .core()
            .http
            .get(&url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .timeout(VPC_CALL_TIMEOUT)
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                return McpToolResult::failure(request_id, format!("HTTP request failed: {e}"));
            }
        };

        if !response.status().is_success() {
            return McpToolResult::failure(
                request_id,
                format!("HTTP request failed: status {}", response.status()),
            );
        }

        let data = match response.json::<Value>().await {
            Ok(value) => value,
            Err(e) => {
                return McpToolResult::failure(request_id, format!("HTTP request failed: {e}"));
            }
        };

        finish_tool_call(tool_name, request_id, &data)
    }

    /// Fetch the tool catalog for this session's image and cache it.
    ///
    /// The catalog is what VPC routing resolves servers against; without it
    /// every VPC tool call fails closed.
    pub async fn list_mcp_tools(&self, image_id: Option<&str>) -> McpToolsResult {
        let image_id = image_id
            .map(str::to_string)
            .or_else(|| {
                let own = self.image_id();
                (!own.is_empty()).then(|| own.to_string())
            })
            .unwrap_or_else(|| DEFAULT_IMAGE_ID.to_string());

        let request = ListMcpToolsRequest {
            authorization: self.core().authorization(),
            image_id: image_id.clone(),
        };

        let body = match self.core().api.call(&request).await {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, "ListMcpTools request failed");
                return McpToolsResult::default();
            }
        };

        // The Data field is a JSON-encoded array of descriptors.
        let mut tools = Vec::new();
        if let Some(Value::String(text)) = &body.data {
            match serde_json::from_str::<Vec<McpTool>>(text) {
                Ok(parsed) => tools = parsed,
                Err(e) => tracing::error!(error = %e, "failed to parse tools data"),
            }
        }

        tracing::info!(
            image_id = %image_id,
            tools_count = tools.len(),
            request_id = %body.request_id,
            "ListMcpTools"
        );

        self.set_mcp_tools(tools.clone());

        McpToolsResult {
            request_id: body.request_id,
            tools,
        }
    }
}

fn finish_tool_call(tool_name: &str, request_id: String, data: &Value) -> McpToolResult {
    let output: ToolOutput = match serde_json::from_value(data.clone()) {
        Ok(output) => output,
        Err(e) => {
            return McpToolResult::failure(request_id, format!("Failed to parse response data: {e}"));
        }
    };

    let text = output.text();
    if output.is_error {
        tracing::error!(tool = tool_name, "tool returned error: {text}");
        return McpToolResult::failure(request_id, text);
    }

    McpToolResult {
        request_id,
        success: true,
        data: text,
        error_message: String::new(),
    }
}

/// Apply tool-specific argument rewrites before serialization.
fn normalize_args(tool_name: &str, mut args: Value) -> Value {
    if tool_name == "press_keys" {
        if let Some(keys) = args.get_mut("keys").and_then(Value::as_array_mut) {
            for key in keys.iter_mut() {
                if let Value::String(name) = key {
                    *name = normalize_key(name);
                }
            }
        }
    }
    args
}

/// Map a key name to the canonical lowercase form the service expects.
fn normalize_key(key: &str) -> String {
    let lower = key.trim().to_lowercase();
    match lower.as_str() {
        "control" => "ctrl".to_string(),
        "escape" => "esc".to_string(),
        "return" => "enter".to_string(),
        "windows" | "super" | "meta" | "command" | "cmd" => "win".to_string(),
        "del" => "delete".to_string(),
        _ => lower,
    }
}

/// Client-side correlation id for VPC calls: `vpc-<epoch_ms>-<random9>`.
fn generate_vpc_request_id() -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let epoch_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let mut rng = rand::rng();
    let suffix: String = (0..9)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect();
    format!("vpc-{epoch_ms}-{suffix}")
}

#[cfg(test)]
#[path = "tool.test.rs"]
mod tests;
