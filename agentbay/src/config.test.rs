use super::*;
use pretty_assertions::assert_eq;
use std::io::Write;

#[test]
fn test_explicit_config_wins() {
    let explicit = Config::new("us-west-1", "example.test", 1234);
    let resolved = load_config(Some(explicit.clone()), None);
    assert_eq!(resolved, explicit);
}

#[test]
fn test_defaults_apply() {
    let config = Config::default();
    assert_eq!(config.region_id, Config::DEFAULT_REGION_ID);
    assert_eq!(config.endpoint, Config::DEFAULT_ENDPOINT);
    assert_eq!(config.timeout_ms, Config::DEFAULT_TIMEOUT_MS);
}

#[test]
fn test_builder_overrides() {
    let config = Config::default()
        .region_id("ap-southeast-1")
        .endpoint("other.test")
        .timeout_ms(500);
    assert_eq!(config.region_id, "ap-southeast-1");
    assert_eq!(config.endpoint, "other.test");
    assert_eq!(config.timeout_ms, 500);
}

#[test]
fn test_dotfile_fills_missing_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".env");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "AGENTBAY_ENDPOINT=dotfile.test").unwrap();
    writeln!(file, "AGENTBAY_TIMEOUT_MS=2500").unwrap();

    let config = load_config(None, Some(&path));
    assert_eq!(config.endpoint, "dotfile.test");
    assert_eq!(config.timeout_ms, 2500);
    // Not present in the dotfile, falls through to the default.
    assert_eq!(config.region_id, Config::DEFAULT_REGION_ID);
}

#[test]
fn test_unparseable_timeout_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".env");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "AGENTBAY_TIMEOUT_MS=not-a-number").unwrap();

    let config = load_config(None, Some(&path));
    assert_eq!(config.timeout_ms, Config::DEFAULT_TIMEOUT_MS);
}
