use super::*;
use crate::context_sync::SyncPolicy;
use pretty_assertions::assert_eq;

#[test]
fn test_defaults() {
    let params = CreateSessionParams::new();
    assert!(params.labels.is_empty());
    assert!(params.image_id.is_none());
    assert!(params.context_syncs.is_empty());
    assert!(!params.is_vpc);
    assert!(params.enable_browser_replay.is_none());
    assert_eq!(params.framework, "");
}

#[test]
fn test_builder_chain() {
    let mut labels = HashMap::new();
    labels.insert("env".to_string(), "prod".to_string());

    let params = CreateSessionParams::new()
        .with_labels(labels)
        .with_image_id("linux_latest")
        .with_context_sync(ContextSync::new("ctx-1", "/mnt/data").with_policy(SyncPolicy::default()))
        .with_browser_context(BrowserContext::new("ctx-browser", false))
        .with_is_vpc(true)
        .with_policy_id("policy-1")
        .with_browser_replay(false)
        .with_framework("langchain");

    assert_eq!(params.labels["env"], "prod");
    assert_eq!(params.image_id.as_deref(), Some("linux_latest"));
    assert_eq!(params.context_syncs.len(), 1);
    assert_eq!(params.context_syncs[0].context_id, "ctx-1");
    let browser = params.browser_context.as_ref().unwrap();
    assert_eq!(browser.context_id, "ctx-browser");
    assert!(!browser.auto_upload);
    assert!(params.is_vpc);
    assert_eq!(params.policy_id.as_deref(), Some("policy-1"));
    assert_eq!(params.enable_browser_replay, Some(false));
    assert_eq!(params.framework, "langchain");
}

#[test]
fn test_list_params_defaults() {
    let params = ListSessionParams::default();
    assert_eq!(params.max_results, 10);
    assert_eq!(params.next_token, "");
    assert!(params.labels.is_empty());
}
