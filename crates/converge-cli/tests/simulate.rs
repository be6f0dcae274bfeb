//! Scenario files replayed end to end

use converge_cli::{Scenario, run};
use converge_core::WaitPhase;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn scenario_file(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file
}

const DELETE_WITH_CODE: &str = r#"{
    "resource": "route aggregation ra-1",
    "pending": ["DEPROVISIONING"],
    "target": ["tf-marker-for-deleted-route-aggregation"],
    "interval_secs": 10,
    "min_interval_secs": 5,
    "deadline_secs": 600,
    "steps": [
        {"state": "DEPROVISIONING"},
        {"state": "DEPROVISIONING"},
        {"code": "EQ-3044301"}
    ],
    "deleted": {
        "marker": "tf-marker-for-deleted-route-aggregation",
        "codes": ["EQ-3044301"]
    }
}"#;

#[tokio::test(start_paused = true)]
async fn test_delete_scenario_converges_on_domain_code() {
    let file = scenario_file(DELETE_WITH_CODE);
    let scenario = Scenario::load(file.path()).unwrap();

    let outcome = run(&scenario).await;

    assert!(outcome.converged(), "{outcome:?}");
    assert_eq!(
        outcome.state.as_deref(),
        Some("tf-marker-for-deleted-route-aggregation")
    );
    assert_eq!(outcome.step, None);
    assert_eq!(outcome.attempts, 3);
    assert!((30_000..31_000).contains(&outcome.elapsed_ms), "{outcome:?}");
}

#[tokio::test(start_paused = true)]
async fn test_create_scenario_reports_step_of_target() {
    let scenario = Scenario::from_json(
        r#"{
            "pending": ["PROVISIONING"],
            "target": ["PROVISIONED"],
            "interval_secs": 30,
            "min_interval_secs": 30,
            "steps": [{"state": "PROVISIONING"}, {"state": "PROVISIONED"}]
        }"#,
    )
    .unwrap();

    let outcome = run(&scenario).await;

    assert_eq!(outcome.phase, WaitPhase::Converged);
    assert_eq!(outcome.step, Some(2));
    assert!((60_000..61_000).contains(&outcome.elapsed_ms), "{outcome:?}");
}

#[tokio::test(start_paused = true)]
async fn test_always_pending_scenario_times_out() {
    let scenario = Scenario::from_json(
        r#"{
            "pending": ["PROVISIONING"],
            "target": ["PROVISIONED"],
            "interval_secs": 10,
            "min_interval_secs": 5,
            "deadline_secs": 45,
            "steps": [{"state": "PROVISIONING"}]
        }"#,
    )
    .unwrap();

    let outcome = run(&scenario).await;

    assert_eq!(outcome.phase, WaitPhase::DeadlineExceeded);
    assert_eq!(outcome.state.as_deref(), Some("PROVISIONING"));
    assert_eq!(outcome.step, Some(1));
    assert_eq!(outcome.attempts, 4);
    assert!(outcome.remediation.unwrap().contains("timeout"));
}

#[tokio::test(start_paused = true)]
async fn test_unexpected_state_is_reported() {
    let scenario = Scenario::from_json(
        r#"{
            "pending": ["PROVISIONING"],
            "target": ["PROVISIONED"],
            "steps": [{"state": "FAILED"}]
        }"#,
    )
    .unwrap();

    let outcome = run(&scenario).await;

    assert_eq!(outcome.phase, WaitPhase::UnexpectedState);
    assert_eq!(outcome.state.as_deref(), Some("FAILED"));
    assert_eq!(outcome.attempts, 1);
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_states_never_poll() {
    let scenario = Scenario::from_json(
        r#"{
            "pending": ["ACTIVE"],
            "target": ["ACTIVE"],
            "steps": [{"state": "ACTIVE"}]
        }"#,
    )
    .unwrap();

    let outcome = run(&scenario).await;

    assert_eq!(outcome.phase, WaitPhase::NotStarted);
    assert_eq!(outcome.attempts, 0);
    assert!(outcome.error.unwrap().contains("both pending and target"));
}

#[test]
fn test_missing_scenario_file_names_path() {
    let err = Scenario::load(std::path::Path::new("/nonexistent/scenario.json")).unwrap_err();
    assert!(format!("{err:#}").contains("/nonexistent/scenario.json"));
}

#[test]
fn test_binary_exit_code_follows_outcome() {
    let converging = scenario_file(DELETE_WITH_CODE);
    let output = Command::new(env!("CARGO_BIN_EXE_converge"))
        .arg("simulate")
        .arg(converging.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let outcome: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(outcome["phase"], "converged");

    let failing = scenario_file(
        r#"{"pending": ["PROVISIONING"], "target": ["PROVISIONED"], "steps": [{"status": 500}]}"#,
    );
    let output = Command::new(env!("CARGO_BIN_EXE_converge"))
        .arg("simulate")
        .arg(failing.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let outcome: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(outcome["phase"], "poll_error");
}

#[test]
fn test_binary_prints_defaults() {
    let output = Command::new(env!("CARGO_BIN_EXE_converge"))
        .arg("defaults")
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["timeouts"]["default"]["create"], 600);
    assert_eq!(report["timeouts"]["fabric_connection"]["create"], 900);
    assert_eq!(report["timeouts"]["metal_gateway"]["delete"], 1200);
    assert_eq!(report["cadences"]["slow"]["interval_secs"], 30);
    assert_eq!(report["cadences"]["network_edge_bgp"]["initial_delay_secs"], 0);
}
