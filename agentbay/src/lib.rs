//! Rust SDK for the AgentBay cloud runtime.
//!
//! AgentBay leases sandboxed compute sessions (Linux desktops, browsers,
//! mobile emulators) and exposes filesystem, command, code-execution, and
//! UI-automation operations on them through a uniform tool-call interface.
//!
//! # Example
//!
//! ```ignore
//! use agentbay::{AgentBay, CreateSessionParams};
//!
//! let client = AgentBay::from_env()?;
//! let created = client.create(CreateSessionParams::new()).await;
//! let session = created.session.expect("session");
//!
//! let result = session.command().execute_command("echo hi").await;
//! println!("{}", result.output);
//!
//! client.delete(&session, false).await;
//! # Ok::<(), agentbay::AgentBayError>(())
//! ```

mod agent_bay;
pub mod api;
#[cfg(test)]
pub(crate) mod test_support;
pub mod config;
pub mod context;
pub mod context_manager;
pub mod context_sync;
pub mod error;
pub mod logger;
pub mod response;
pub mod services;
pub mod session;
pub mod session_params;
pub mod telemetry;
pub mod tool;

pub use agent_bay::AgentBay;
pub use config::Config;
pub use context::Context;
pub use context::ContextService;
pub use context_manager::ContextManager;
pub use context_sync::ContextSync;
pub use context_sync::SyncPolicy;
pub use error::AgentBayError;
pub use error::Result;
pub use response::DeleteResult;
pub use response::GetSessionResult;
pub use response::McpToolResult;
pub use response::OperationResult;
pub use response::SessionListResult;
pub use response::SessionResult;
pub use session::Session;
pub use session_params::BrowserContext;
pub use session_params::CreateSessionParams;
pub use session_params::ListSessionParams;
pub use telemetry::TraceManager;
pub use tool::CallToolOptions;
pub use tool::McpTool;
