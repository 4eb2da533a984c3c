//! Shell command execution inside a session.

use serde_json::json;

use crate::session::Session;

/// Default command timeout in milliseconds.
pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 60_000;

/// Result of a command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandResult {
    pub request_id: String,
    pub success: bool,
    /// Captured stdout.
    pub output: String,
    pub error_message: String,
}

/// Command execution bound to one session.
#[derive(Debug, Clone, Copy)]
pub struct Command<'a> {
    session: &'a Session,
}

impl<'a> Command<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Run a shell command with the default timeout.
    pub async fn execute_command(&self, command: &str) -> CommandResult {
        self.execute_command_with_timeout(command, DEFAULT_COMMAND_TIMEOUT_MS)
            .await
    }

    /// Run a shell command with an explicit timeout in milliseconds.
    pub async fn execute_command_with_timeout(
        &self,
        command: &str,
        timeout_ms: u64,
    ) -> CommandResult {
        let result = self
            .session
            .call_mcp_tool(
                "shell",
                json!({
                    "command": command,
                    "timeout_ms": timeout_ms,
                }),
            )
            .await;

        CommandResult {
            request_id: result.request_id,
            success: result.success,
            output: result.data,
            error_message: result.error_message,
        }
    }
}

#[cfg(test)]
#[path = "command.test.rs"]
mod tests;
