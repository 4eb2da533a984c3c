//! Code execution inside a session.

use serde::Deserialize;
use serde_json::json;

use crate::session::Session;

/// Default code-execution timeout in seconds.
pub const DEFAULT_CODE_TIMEOUT_S: u64 = 300;

/// Languages accepted by the `run_code` tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeLanguage {
    Python,
    JavaScript,
}

impl CodeLanguage {
    fn as_str(self) -> &'static str {
        match self {
            CodeLanguage::Python => "python",
            CodeLanguage::JavaScript => "javascript",
        }
    }
}

/// One execution result in a specific format.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExecutionResult {
    pub text: Option<String>,
    pub html: Option<String>,
    pub markdown: Option<String>,
    /// Base64-encoded image payloads.
    pub png: Option<String>,
    pub jpeg: Option<String>,
    pub svg: Option<String>,
    pub json: Option<serde_json::Value>,
    pub latex: Option<String>,
    pub chart: Option<serde_json::Value>,
    #[serde(rename = "is_main_result")]
    pub is_main_result: bool,
}

/// Captured output streams.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExecutionLogs {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

/// Detailed execution error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExecutionError {
    pub name: String,
    pub value: String,
    pub traceback: String,
}

/// Result of `run_code` with multi-format outputs.
#[derive(Debug, Clone, Default)]
pub struct CodeExecutionResult {
    pub request_id: String,
    pub success: bool,
    pub execution_count: Option<u64>,
    pub execution_time: f64,
    pub logs: ExecutionLogs,
    pub results: Vec<ExecutionResult>,
    pub error: Option<ExecutionError>,
    pub error_message: String,
}

impl CodeExecutionResult {
    /// Scalar result: main-result text, else first-result text, else joined
    /// stdout.
    pub fn result(&self) -> String {
        for result in &self.results {
            if result.is_main_result {
                if let Some(text) = &result.text {
                    return text.clone();
                }
            }
        }
        if let Some(text) = self.results.first().and_then(|r| r.text.clone()) {
            return text;
        }
        if !self.logs.stdout.is_empty() {
            return self.logs.stdout.concat();
        }
        String::new()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RunCodePayload {
    logs: ExecutionLogs,
    results: Vec<ExecutionResult>,
    error: Option<ExecutionError>,
    execution_count: Option<u64>,
    execution_time: f64,
}

/// Code execution bound to one session.
#[derive(Debug, Clone, Copy)]
pub struct Code<'a> {
    session: &'a Session,
}

impl<'a> Code<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Run code with the default timeout.
    pub async fn run_code(&self, code: &str, language: CodeLanguage) -> CodeExecutionResult {
        self.run_code_with_timeout(code, language, DEFAULT_CODE_TIMEOUT_S)
            .await
    }

    /// Run code with an explicit timeout in seconds.
    pub async fn run_code_with_timeout(
        &self,
        code: &str,
        language: CodeLanguage,
        timeout_s: u64,
    ) -> CodeExecutionResult {
        let result = self
            .session
            .call_mcp_tool(
                "run_code",
                json!({
                    "code": code,
                    "language": language.as_str(),
                    "timeout_s": timeout_s,
                }),
            )
            .await;

        if !result.success {
            return CodeExecutionResult {
                request_id: result.request_id,
                success: false,
                error_message: result.error_message,
                ..Default::default()
            };
        }

        // Rich payloads are JSON; plain text falls back to a single result.
        match serde_json::from_str::<RunCodePayload>(&result.data) {
            Ok(payload) => {
                let failed = payload.error.is_some();
                CodeExecutionResult {
                    request_id: result.request_id,
                    success: !failed,
                    execution_count: payload.execution_count,
                    execution_time: payload.execution_time,
                    logs: payload.logs,
                    error_message: payload
                        .error
                        .as_ref()
                        .map(|e| format!("{}: {}", e.name, e.value))
                        .unwrap_or_default(),
                    error: payload.error,
                    results: payload.results,
                }
            }
            Err(_) => CodeExecutionResult {
                request_id: result.request_id,
                success: true,
                results: vec![ExecutionResult {
                    text: Some(result.data),
                    is_main_result: true,
                    ..Default::default()
                }],
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
#[path = "code.test.rs"]
mod tests;
