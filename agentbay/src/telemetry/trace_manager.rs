//! Process-wide telemetry manager.
//!
//! Lifecycle is explicit: [`TraceManager::global`] hands out the singleton,
//! [`TraceManager::init`] fetches the first token, [`TraceManager::shutdown`]
//! stops sends. Events that cannot be delivered queue in a bounded FIFO
//! (oldest dropped); every lock is released before any I/O happens.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::OnceLock;
use std::sync::RwLock;
use std::time::Duration;

use serde_json::Value;

use crate::telemetry::generate_span_id;
use crate::telemetry::generate_trace_id;
use crate::telemetry::log_client::LogItem;
use crate::telemetry::log_client::LogStoreClient;
use crate::telemetry::token_manager::TokenManager;
use crate::telemetry::token_manager::TokenResponse;
use crate::telemetry::MAX_CACHED_LOGS;
use crate::telemetry::MAX_ERROR_COUNT;
use crate::telemetry::MAX_LOG_LENGTH;

/// How long an enqueue waits for the pending-queue lock before dropping the
/// event.
const QUEUE_LOCK_TIMEOUT: Duration = Duration::from_secs(2);

static INSTANCE: OnceLock<TraceManager> = OnceLock::new();

/// Telemetry singleton.
#[derive(Debug)]
pub struct TraceManager {
    token_manager: TokenManager,
    response: RwLock<Option<TokenResponse>>,
    client: RwLock<Option<Arc<LogStoreClient>>>,
    destroyed: AtomicBool,
    error_count: AtomicU32,
    pending: tokio::sync::Mutex<VecDeque<LogItem>>,
    trace_ids: Mutex<HashMap<String, String>>,
    parent_span_ids: Mutex<HashMap<String, String>>,
}

impl TraceManager {
    fn new() -> Self {
        Self {
            token_manager: TokenManager::new(),
            response: RwLock::new(None),
            client: RwLock::new(None),
            destroyed: AtomicBool::new(false),
            error_count: AtomicU32::new(0),
            pending: tokio::sync::Mutex::new(VecDeque::new()),
            trace_ids: Mutex::new(HashMap::new()),
            parent_span_ids: Mutex::new(HashMap::new()),
        }
    }

    /// The process-wide instance.
    pub fn global() -> &'static TraceManager {
        INSTANCE.get_or_init(TraceManager::new)
    }

    /// Fetch the initial token and open the log store.
    ///
    /// Safe to call repeatedly; a token request already in flight makes it
    /// a no-op.
    pub async fn init(&self) {
        self.refresh_token().await;
    }

    /// Stop all sends and drop the log store.
    pub fn shutdown(&self) {
        self.destroyed.store(true, Ordering::Release);
        if let Ok(mut client) = self.client.write() {
            *client = None;
        }
        if let Ok(mut response) = self.response.write() {
            *response = None;
        }
        tracing::info!("trace manager destroyed");
    }

    fn is_ready(&self) -> bool {
        if self.destroyed.load(Ordering::Acquire) {
            return false;
        }
        let has_client = self
            .client
            .read()
            .map(|client| client.is_some())
            .unwrap_or(false);
        let has_response = self
            .response
            .read()
            .map(|response| {
                response
                    .as_ref()
                    .map(|r| r.success)
                    .unwrap_or(false)
            })
            .unwrap_or(false);
        has_client && has_response
    }

    /// Enqueue a tracking event.
    pub async fn send_track(&self, owner: &str, fields: Value) -> bool {
        if owner.trim().is_empty() {
            tracing::warn!("send_track: invalid owner");
            return false;
        }
        let item = self.create_log_item(owner, fields);
        self.add_log(item).await;
        true
    }

    /// Enqueue a trace event, managing trace/span continuity per
    /// `(biz_index, extra)` key.
    ///
    /// `is_start` resets the stored trace for the key; each event gets a
    /// fresh span id, parented on the previous span (or itself when the
    /// trace is new).
    pub async fn send_trace(
        &self,
        owner: &str,
        mut fields: Value,
        span_name: &str,
        biz_index: i64,
        extra: &str,
        is_start: bool,
    ) -> bool {
        if owner.trim().is_empty() {
            tracing::warn!("send_trace: invalid owner");
            return false;
        }

        let trace_key = format!("{biz_index}{extra}");
        let (trace_id, span_id, parent_span_id) = self.next_span(&trace_key, is_start);

        if let Some(map) = fields.as_object_mut() {
            map.insert("traceId".to_string(), Value::String(trace_id));
            map.insert("parentSpanId".to_string(), Value::String(parent_span_id));
            map.insert("spanId".to_string(), Value::String(span_id));
            map.insert("spanName".to_string(), Value::String(span_name.to_string()));
            map.insert("is_start".to_string(), Value::Bool(is_start));
        }

        let item = self.create_log_item(owner, fields);
        self.add_log(item).await;
        true
    }

    /// The current trace id for a key, if one is active.
    pub fn trace_id(&self, biz_index: i64, extra: &str) -> Option<String> {
        let trace_key = format!("{biz_index}{extra}");
        self.trace_ids
            .lock()
            .ok()
            .and_then(|ids| ids.get(&trace_key).cloned())
    }

    /// Span bookkeeping; the lock covers only map manipulation.
    fn next_span(&self, trace_key: &str, is_start: bool) -> (String, String, String) {
        let span_id = generate_span_id();

        let (Ok(mut trace_ids), Ok(mut parents)) =
            (self.trace_ids.lock(), self.parent_span_ids.lock())
        else {
            return (generate_trace_id(), span_id.clone(), span_id);
        };

        if is_start {
            trace_ids.remove(trace_key);
            parents.remove(trace_key);
        }

        let trace_id = trace_ids
            .entry(trace_key.to_string())
            .or_insert_with(generate_trace_id)
            .clone();
        let parent_span_id = parents
            .get(trace_key)
            .cloned()
            .unwrap_or_else(|| span_id.clone());
        parents.insert(trace_key.to_string(), span_id.clone());

        (trace_id, span_id, parent_span_id)
    }

    fn create_log_item(&self, owner: &str, ext: Value) -> LogItem {
        let mut item = LogItem::new();
        item.insert("uuid".to_string(), self.token_manager.uuid().to_string());
        item.insert("os".to_string(), "rust".to_string());
        item.insert("appName".to_string(), "agentbay".to_string());
        item.insert(
            "ts".to_string(),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        );
        item.insert(
            "sw".to_string(),
            format!("{} {}", std::env::consts::OS, std::env::consts::ARCH),
        );
        item.insert("owner".to_string(), truncate(owner.to_string()));
        item.insert("ext".to_string(), truncate(flatten(ext)));
        item
    }

    /// Try an immediate send; queue on failure.
    async fn add_log(&self, item: LogItem) {
        if self.send_log(&item).await {
            return;
        }

        let Ok(mut pending) =
            tokio::time::timeout(QUEUE_LOCK_TIMEOUT, self.pending.lock()).await
        else {
            tracing::warn!("pending-log queue busy, dropping event");
            return;
        };
        if pending.len() >= MAX_CACHED_LOGS {
            pending.pop_front();
            tracing::warn!("pending-log cache full, dropped oldest");
        }
        pending.push_back(item);
    }

    async fn send_log(&self, item: &LogItem) -> bool {
        if !self.is_ready() {
            return false;
        }
        let client = match self.client.read() {
            Ok(slot) => slot.clone(),
            Err(_) => None,
        };
        let Some(client) = client else {
            return false;
        };

        match client.put_logs(std::slice::from_ref(item)).await {
            Ok(()) => {
                self.error_count.store(0, Ordering::Relaxed);
                true
            }
            Err(e) => {
                let errors = self.error_count.fetch_add(1, Ordering::Relaxed) + 1;
                let text = e.to_string().to_lowercase();
                let auth_failure = text.contains("401")
                    || text.contains("403")
                    || text.contains("unauthorized")
                    || text.contains("forbidden");

                if auth_failure || errors > MAX_ERROR_COUNT {
                    Box::pin(self.recover_credentials()).await;
                }
                false
            }
        }
    }

    /// Refresh or reapply credentials after send failures.
    ///
    /// A new token is requested only when the cached one has aged out or no
    /// response is cached; otherwise the cached credentials are pushed back
    /// into the client.
    async fn recover_credentials(&self) {
        let cached = self
            .response
            .read()
            .ok()
            .and_then(|response| response.clone());

        let needs_new_token = self.token_manager.is_token_invalid() || cached.is_none();
        if needs_new_token {
            self.error_count.store(0, Ordering::Relaxed);
            self.refresh_token().await;
            return;
        }

        if let (Some(response), Ok(client_slot)) = (cached, self.client.read()) {
            if let (Some(client), Some(token)) = (client_slot.clone(), response.sts_token) {
                client.update_credentials(token);
            }
        }
    }

    async fn refresh_token(&self) {
        let response = match self.token_manager.request_token().await {
            Ok(Some(response)) if response.success => response,
            Ok(Some(response)) => {
                tracing::warn!(code = %response.code, "token request rejected");
                if let Ok(mut slot) = self.response.write() {
                    *slot = None;
                }
                return;
            }
            Ok(None) => return,
            Err(e) => {
                tracing::error!(error = %e, "token request failed");
                if let Ok(mut slot) = self.response.write() {
                    *slot = None;
                }
                return;
            }
        };

        if self.destroyed.load(Ordering::Acquire) {
            return;
        }

        let has_client = self
            .client
            .read()
            .map(|client| client.is_some())
            .unwrap_or(false);

        if has_client {
            if let (Some(token), Ok(client_slot)) =
                (response.sts_token.clone(), self.client.read())
            {
                if let Some(client) = client_slot.clone() {
                    client.update_credentials(token);
                }
            }
        } else {
            let (Some(token), Some(sls)) =
                (response.sts_token.clone(), response.trace_sls_info.clone())
            else {
                tracing::error!("no trace SLS info available");
                return;
            };
            let endpoint = format!("https://{}", sls.server_url);
            let client = LogStoreClient::new(endpoint, sls.project, sls.log_store, token);
            if let Ok(mut slot) = self.client.write() {
                *slot = Some(Arc::new(client));
            }
        }

        if let Ok(mut slot) = self.response.write() {
            *slot = Some(response);
        }

        self.flush_pending().await;
    }

    /// Drain the queue: snapshot under the lock, send outside it.
    async fn flush_pending(&self) {
        let drained: Vec<LogItem> = {
            let Ok(mut pending) =
                tokio::time::timeout(QUEUE_LOCK_TIMEOUT, self.pending.lock()).await
            else {
                tracing::warn!("pending-log queue busy, skipping flush");
                return;
            };
            pending.drain(..).collect()
        };

        for item in drained {
            if !self.send_log(&item).await {
                tracing::error!("failed to send cached log");
            }
        }
    }

    #[cfg(test)]
    pub(crate) async fn pending_len(&self) -> usize {
        self.pending.lock().await.len()
    }

    #[cfg(test)]
    pub(crate) fn fresh_for_tests() -> Self {
        Self::new()
    }
}

fn flatten(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => serde_json::to_string(&other).unwrap_or_default(),
    }
}

fn truncate(mut text: String) -> String {
    if text.len() > MAX_LOG_LENGTH {
        let mut cut = MAX_LOG_LENGTH;
        while cut > 0 && !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }
    text
}

#[cfg(test)]
#[path = "trace_manager.test.rs"]
mod tests;
