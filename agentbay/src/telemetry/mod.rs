//! Telemetry pipeline: bounded queue of trace/track events forwarded to a
//! remote log store with short-lived STS credentials.

pub mod log_client;
pub mod token_manager;
pub mod trace_manager;

pub use trace_manager::TraceManager;

use rand::Rng;

/// Maximum number of events held while the log store is unreachable.
pub(crate) const MAX_CACHED_LOGS: usize = 100;
/// Per-field size cap in bytes.
pub(crate) const MAX_LOG_LENGTH: usize = 8_192;
/// Consecutive send errors tolerated before forcing a token refresh.
pub(crate) const MAX_ERROR_COUNT: u32 = 5;

/// Generate a 32-character hexadecimal trace id.
pub(crate) fn generate_trace_id() -> String {
    let value: u128 = rand::rng().random();
    format!("{value:032x}")
}

/// Generate a 16-character hexadecimal span id.
pub(crate) fn generate_span_id() -> String {
    let value: u64 = rand::rng().random();
    format!("{value:016x}")
}

#[cfg(test)]
#[path = "mod.test.rs"]
mod tests;
