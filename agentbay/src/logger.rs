//! Opt-in logging setup and credential masking.

use tracing_subscriber::EnvFilter;

/// Environment variable controlling the SDK log level.
pub const LOG_LEVEL_ENV: &str = "AGENTBAY_LOG_LEVEL";

/// Install a global `tracing` subscriber honoring `AGENTBAY_LOG_LEVEL`.
///
/// ANSI colors follow `FORCE_COLOR` / `DISABLE_COLORS`. Host applications
/// that already configure `tracing` should skip this; the SDK itself never
/// installs a subscriber implicitly. Calling it twice is a no-op.
pub fn init() {
    let filter = std::env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|level| EnvFilter::try_new(level).ok())
        .unwrap_or_else(|| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(colors_enabled())
        .try_init();
}

fn colors_enabled() -> bool {
    if std::env::var("DISABLE_COLORS").is_ok_and(|v| !v.is_empty() && v != "0") {
        return false;
    }
    if let Ok(force) = std::env::var("FORCE_COLOR") {
        return force != "0";
    }
    true
}

/// Mask an authorization value for logging.
///
/// Values of 12 characters or more keep the first 6 and last 4; shorter
/// values keep the first 2 and last 2.
pub(crate) fn mask_authorization(auth: &str) -> String {
    let chars: Vec<char> = auth.chars().collect();
    if chars.len() >= 12 {
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}***{tail}")
    } else if chars.len() >= 4 {
        let head: String = chars[..2].iter().collect();
        let tail: String = chars[chars.len() - 2..].iter().collect();
        format!("{head}****{tail}")
    } else {
        "****".to_string()
    }
}

#[cfg(test)]
#[path = "logger.test.rs"]
mod tests;
