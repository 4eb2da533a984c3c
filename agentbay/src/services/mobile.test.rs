use super::*;
use crate::test_support::client_for;
use crate::test_support::make_session;
use crate::test_support::mount_action;
use crate::test_support::tool_response;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::body_string_contains;
use wiremock::matchers::method;
use wiremock::matchers::query_param;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

#[test]
fn test_simulate_mode_flags() {
    assert_eq!(SimulateMode::PropertiesOnly.apply_flag(), "");
    assert_eq!(SimulateMode::SensorsOnly.apply_flag(), "-sensors");
    assert_eq!(SimulateMode::PackagesOnly.apply_flag(), "-packages");
    assert_eq!(SimulateMode::ServicesOnly.apply_flag(), "-services");
    assert_eq!(SimulateMode::All.apply_flag(), "-all");
}

#[test]
fn test_extra_configs_serialize_pascal_case() {
    let configs = ExtraConfigs {
        mobile: Some(MobileExtraConfig {
            lock_resolution: Some(true),
            app_manager_rule: Some(AppManagerRule {
                rule_type: "White".into(),
                app_package_name_list: vec!["com.android.settings".into()],
            }),
            hide_navigation_bar: Some(true),
            uninstall_blacklist: vec!["com.example.keep".into()],
            simulate_config: Some(MobileSimulateConfig {
                simulate: true,
                simulate_path: "/data/local/tmp/sim".into(),
                simulate_mode: Some(SimulateMode::All),
                simulated_context_id: Some("ctx-sim".into()),
            }),
        }),
    };
    let value = serde_json::to_value(&configs).unwrap();
    assert_eq!(value["Mobile"]["LockResolution"], true);
    assert_eq!(value["Mobile"]["AppManagerRule"]["RuleType"], "White");
    assert_eq!(
        value["Mobile"]["AppManagerRule"]["AppPackageNameList"][0],
        "com.android.settings"
    );
    assert_eq!(value["Mobile"]["SimulateConfig"]["Simulate"], true);
    assert_eq!(value["Mobile"]["SimulateConfig"]["SimulateMode"], "All");
    assert_eq!(value["Mobile"]["UninstallBlacklist"][0], "com.example.keep");
}

#[tokio::test]
async fn test_tap_and_swipe() {
    let server = MockServer::start().await;
    mount_action(&server, "CallMcpTool", tool_response("req-1", "", false)).await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    assert!(session.mobile().tap(100, 200).await.success);
    assert!(
        session
            .mobile()
            .swipe(0, 0, 100, 400, 300)
            .await
            .success
    );
}

#[tokio::test]
async fn test_get_clickable_ui_elements_parses_tree() {
    let payload = json!([{
        "bounds": "48,90,1032,130",
        "className": "android.widget.TextView",
        "text": "Settings",
        "type": "clickable",
        "resourceId": "com.android.settings:id/title",
        "children": [],
    }]);
    let server = MockServer::start().await;
    mount_action(
        &server,
        "CallMcpTool",
        tool_response("req-2", &payload.to_string(), false),
    )
    .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session.mobile().get_clickable_ui_elements(2_000).await;
    assert!(result.success);
    assert_eq!(result.elements.len(), 1);
    assert_eq!(result.elements[0].text, "Settings");
    assert_eq!(result.elements[0].class_name, "android.widget.TextView");
}

#[tokio::test]
async fn test_adb_url() {
    let server = MockServer::start().await;
    mount_action(
        &server,
        "GetAdbLink",
        json!({
            "RequestId": "req-adb",
            "Success": true,
            "Data": {"Url": "adb connect 10.0.0.5:5555"},
        }),
    )
    .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let result = session.mobile().adb_url().await;
    assert!(result.success);
    assert_eq!(result.url, "adb connect 10.0.0.5:5555");
}

#[tokio::test]
async fn test_run_simulation_builds_command() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(query_param("Action", "CallMcpTool"))
        .and(body_string_contains("wya+apply+-sensors"))
        .and(body_string_contains("dev_info.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tool_response("req-3", "applied", false)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    session
        .mobile()
        .run_simulation("/data/local/tmp/sim", Some(SimulateMode::SensorsOnly))
        .await;
}

#[tokio::test]
async fn test_configure_applies_each_setting() {
    let server = MockServer::start().await;
    mount_action(&server, "CallMcpTool", tool_response("req-4", "", false)).await;

    let client = client_for(&server);
    let session = make_session(&client, "s-1");

    let config = MobileExtraConfig {
        lock_resolution: Some(true),
        app_manager_rule: Some(AppManagerRule {
            rule_type: "Black".into(),
            app_package_name_list: vec!["com.bad.app".into()],
        }),
        hide_navigation_bar: Some(false),
        uninstall_blacklist: vec!["com.keep.me".into()],
        simulate_config: None,
    };
    session.mobile().configure(&config).await;

    // Four configuration commands went out.
    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 4);
}
