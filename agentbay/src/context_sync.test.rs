use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_default_policy_round_trips() {
    let policy = SyncPolicy::default();
    let json = policy.to_json_string().unwrap();
    let back: SyncPolicy = serde_json::from_str(&json).unwrap();
    assert_eq!(back, policy);
}

#[test]
fn test_policy_serializes_camel_case_keys() {
    let json = SyncPolicy::default().to_json_string().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["uploadPolicy"]["autoUpload"], true);
    assert_eq!(
        value["uploadPolicy"]["uploadStrategy"],
        "UploadBeforeResourceRelease"
    );
    assert_eq!(value["uploadPolicy"]["uploadMode"], "File");
    assert_eq!(value["downloadPolicy"]["downloadStrategy"], "DownloadAsync");
    assert_eq!(value["deletePolicy"]["syncLocalFile"], true);
    assert_eq!(value["extractPolicy"]["deleteSrcFile"], true);
    assert_eq!(value["extractPolicy"]["extractToCurrentFolder"], false);
    assert_eq!(value["recyclePolicy"]["lifecycle"], "Lifecycle_Forever");
    assert_eq!(value["recyclePolicy"]["paths"][0], "");
    assert_eq!(value["bwList"]["whiteLists"][0]["path"], "");
    assert_eq!(
        value["bwList"]["whiteLists"][0]["excludePaths"],
        serde_json::json!([])
    );
    // Absent by default.
    assert!(value.get("mappingPolicy").is_none());
}

#[test]
fn test_mapping_policy_serialized_when_set() {
    let policy = SyncPolicy {
        mapping_policy: Some(MappingPolicy {
            path: "C:\\Users\\data".into(),
        }),
        ..Default::default()
    };
    let value: serde_json::Value =
        serde_json::from_str(&policy.to_json_string().unwrap()).unwrap();
    assert_eq!(value["mappingPolicy"]["path"], "C:\\Users\\data");
}

#[test]
fn test_wildcards_rejected_in_recycle_paths() {
    for bad in ["/data/*", "/logs/?", "/a[0]", "/b]c"] {
        let result = RecyclePolicy::new(Lifecycle::ThirtyDays, vec![bad.to_string()]);
        assert!(matches!(result, Err(AgentBayError::Validation(_))), "{bad}");
    }
}

#[test]
fn test_empty_recycle_path_means_all() {
    let policy = RecyclePolicy::new(Lifecycle::OneDay, vec![String::new()]).unwrap();
    assert_eq!(policy.paths, vec![""]);
}

#[test]
fn test_wildcards_rejected_in_white_list() {
    assert!(WhiteList::new("/data/*", vec![]).is_err());
    assert!(WhiteList::new("/data", vec!["/data/tmp/?".into()]).is_err());
    assert!(WhiteList::new("/data", vec!["/data/tmp".into()]).is_ok());
}

#[test]
fn test_lifecycle_wire_names() {
    let names = [
        (Lifecycle::OneDay, "Lifecycle_1Day"),
        (Lifecycle::ThreeDays, "Lifecycle_3Days"),
        (Lifecycle::FiveDays, "Lifecycle_5Days"),
        (Lifecycle::TenDays, "Lifecycle_10Days"),
        (Lifecycle::FifteenDays, "Lifecycle_15Days"),
        (Lifecycle::ThirtyDays, "Lifecycle_30Days"),
        (Lifecycle::NinetyDays, "Lifecycle_90Days"),
        (Lifecycle::OneHundredEightyDays, "Lifecycle_180Days"),
        (Lifecycle::ThreeHundredSixtyDays, "Lifecycle_360Days"),
        (Lifecycle::Forever, "Lifecycle_Forever"),
    ];
    for (lifecycle, expected) in names {
        let json = serde_json::to_string(&lifecycle).unwrap();
        assert_eq!(json, format!("\"{expected}\""));
    }
}

#[test]
fn test_context_sync_builder() {
    let sync = ContextSync::new("ctx-1", "/mnt/data").with_policy(SyncPolicy::default());
    assert_eq!(sync.context_id, "ctx-1");
    assert_eq!(sync.path, "/mnt/data");
    assert!(sync.policy.is_some());
}
