use super::*;
use pretty_assertions::assert_eq;
use serde_json::json;

#[tokio::test]
async fn test_events_queue_while_unready() {
    let manager = TraceManager::fresh_for_tests();
    assert!(manager.send_track("session", json!({"op": "create"})).await);
    assert_eq!(manager.pending_len().await, 1);
}

#[tokio::test]
async fn test_queue_caps_at_limit_dropping_oldest() {
    let manager = TraceManager::fresh_for_tests();
    for i in 0..(MAX_CACHED_LOGS + 5) {
        manager.send_track("session", json!({"seq": i})).await;
    }
    assert_eq!(manager.pending_len().await, MAX_CACHED_LOGS);

    // The oldest entries are the ones that went missing.
    let pending = manager.pending.lock().await;
    let first = pending.front().expect("queue should not be empty");
    assert!(first["ext"].contains("\"seq\":5"));
}

#[tokio::test]
async fn test_invalid_owner_rejected() {
    let manager = TraceManager::fresh_for_tests();
    assert!(!manager.send_track("", json!({})).await);
    assert!(!manager.send_track("   ", json!({})).await);
    assert!(!manager.send_trace("", json!({}), "span", 1, "", false).await);
    assert_eq!(manager.pending_len().await, 0);
}

#[tokio::test]
async fn test_trace_continuity_per_key() {
    let manager = TraceManager::fresh_for_tests();

    manager
        .send_trace("session", json!({}), "create", 1, "a", true)
        .await;
    let first_trace = manager.trace_id(1, "a").expect("trace id should exist");

    manager
        .send_trace("session", json!({}), "call", 1, "a", false)
        .await;
    // Same key keeps the same trace id.
    assert_eq!(manager.trace_id(1, "a").unwrap(), first_trace);

    // A new start resets it.
    manager
        .send_trace("session", json!({}), "create", 1, "a", true)
        .await;
    assert_ne!(manager.trace_id(1, "a").unwrap(), first_trace);

    // Distinct keys get distinct traces.
    manager
        .send_trace("session", json!({}), "create", 2, "a", true)
        .await;
    assert_ne!(manager.trace_id(2, "a").unwrap(), manager.trace_id(1, "a").unwrap());
}

#[test]
fn test_next_span_parents_on_previous_span() {
    let manager = TraceManager::fresh_for_tests();

    let (trace_a, span_a, parent_a) = manager.next_span("k", true);
    // The first span of a trace is its own parent.
    assert_eq!(span_a, parent_a);

    let (trace_b, span_b, parent_b) = manager.next_span("k", false);
    assert_eq!(trace_a, trace_b);
    assert_eq!(parent_b, span_a);
    assert_ne!(span_b, span_a);
}

#[tokio::test]
async fn test_trace_fields_injected() {
    let manager = TraceManager::fresh_for_tests();
    manager
        .send_trace("session", json!({"op": "create"}), "create-span", 7, "x", true)
        .await;

    let pending = manager.pending.lock().await;
    let item = pending.front().expect("event should be queued");
    let ext: serde_json::Value = serde_json::from_str(&item["ext"]).unwrap();
    assert_eq!(ext["spanName"], "create-span");
    assert_eq!(ext["is_start"], true);
    assert_eq!(ext["traceId"].as_str().unwrap().len(), 32);
    assert_eq!(ext["spanId"].as_str().unwrap().len(), 16);
    assert_eq!(ext["spanId"], ext["parentSpanId"]);
    assert_eq!(item["os"], "rust");
    assert_eq!(item["appName"], "agentbay");
}

#[test]
fn test_truncate_respects_char_boundaries() {
    let long = "é".repeat(MAX_LOG_LENGTH);
    let cut = truncate(long);
    assert!(cut.len() <= MAX_LOG_LENGTH);
    assert!(cut.chars().all(|c| c == 'é'));
}

#[tokio::test]
async fn test_shutdown_stops_readiness() {
    let manager = TraceManager::fresh_for_tests();
    manager.shutdown();
    assert!(!manager.is_ready());
    // Events still queue rather than panic after shutdown.
    manager.send_track("session", json!({})).await;
    assert_eq!(manager.pending_len().await, 1);
}
