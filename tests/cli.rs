use serde_json::{json, Value};
use std::path::Path;
use std::process::{Command, Output};

fn write_fixture(dir: &Path, runs: Value) -> std::path::PathBuf {
    let fixture = json!({
        "GET /api/compliance/policies": [
            {"id": "p1", "name": "Tables have owners", "severity": "high"}
        ],
        "GET /api/compliance/policies/p1": {
            "id": "p1",
            "name": "Tables have owners",
            "rule": "ASSERT obj.owner != ''",
            "severity": "high"
        },
        "GET /api/compliance/policies/p1/runs": runs,
        "GET /api/compliance/runs/r2/results?only_failed=false": {"results": [
            {
                "id": "x1", "run_id": "r2", "object_type": "table",
                "object_id": "orders", "passed": true
            },
            {
                "id": "x2", "run_id": "r2", "object_type": "table",
                "object_id": "refunds", "passed": false
            }
        ]},
        "GET /api/compliance/runs/r2/results?only_failed=true": {"results": [
            {
                "id": "x2", "run_id": "r2", "object_type": "table",
                "object_id": "refunds", "passed": false
            }
        ]},
        "GET /api/compliance/runs/r1/results?only_failed=false": {},
        "GET /api/compliance/stats": {
            "overall_compliance": 87.26,
            "active_policies": 3,
            "critical_issues": 1
        }
    });
    let path = dir.join("fixture.json");
    std::fs::write(&path, serde_json::to_vec_pretty(&fixture).expect("serialize fixture"))
        .expect("write fixture");
    path
}

fn two_runs() -> Value {
    json!([
        {"id": "r2", "policy_id": "p1", "status": "succeeded", "started_at": "2024-02-01"},
        {"id": "r1", "policy_id": "p1", "status": "succeeded", "started_at": "2024-01-01"}
    ])
}

fn policyview(fixture: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_policyview"))
        .arg("--fixture")
        .arg(fixture)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("run policyview")
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn show_prints_newest_run_results_as_json() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let fixture = write_fixture(temp_dir.path(), two_runs());

    let output = policyview(&fixture, &["show", "--policy", "p1", "--json"]);
    assert!(output.status.success());
    let value = stdout_json(&output);
    assert_eq!(value["view"]["phase"], "ready");
    assert_eq!(value["view"]["active_run"]["id"], "r2");
    assert_eq!(value["view"]["results"].as_array().map(Vec::len), Some(2));
}

#[test]
fn show_only_failed_uses_server_filter() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let fixture = write_fixture(temp_dir.path(), two_runs());

    let output = policyview(
        &fixture,
        &["show", "--policy", "p1", "--only-failed", "--json"],
    );
    assert!(output.status.success());
    let value = stdout_json(&output);
    assert_eq!(value["view"]["only_failed"], true);
    assert_eq!(value["view"]["results"][0]["object_id"], "refunds");
    assert_eq!(value["view"]["results"].as_array().map(Vec::len), Some(1));
}

#[test]
fn show_selected_run_with_malformed_results_is_empty() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let fixture = write_fixture(temp_dir.path(), two_runs());

    let output = policyview(
        &fixture,
        &["show", "--policy", "p1", "--run", "r1", "--json"],
    );
    assert!(output.status.success());
    let value = stdout_json(&output);
    assert_eq!(value["view"]["active_run"]["id"], "r1");
    assert_eq!(value["view"]["results"], json!([]));
}

#[test]
fn show_unknown_policy_exits_non_zero() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let fixture = write_fixture(temp_dir.path(), two_runs());

    let output = policyview(&fixture, &["show", "--policy", "nope"]);
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("error: Not Found"));
}

#[test]
fn show_policy_without_runs_is_not_an_error() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let fixture = write_fixture(temp_dir.path(), json!([]));

    let output = policyview(&fixture, &["show", "--policy", "p1"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("No runs yet."));
}

#[test]
fn trigger_without_route_reports_transient_failure() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let fixture = write_fixture(temp_dir.path(), two_runs());

    let output = policyview(&fixture, &["trigger", "--policy", "p1", "--json"]);
    assert!(!output.status.success());
    let value = stdout_json(&output);
    assert_eq!(value["view"]["phase"], "ready");
    assert_eq!(value["view"]["active_run"]["id"], "r2");
    assert_eq!(value["notices"][0]["message"], "Not Found");
}

#[test]
fn policies_lists_index() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let fixture = write_fixture(temp_dir.path(), two_runs());

    let output = policyview(&fixture, &["policies"]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "p1  Tables have owners  [high]\n"
    );
}

#[test]
fn trigger_accepted_by_backend_succeeds() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let fixture = write_fixture(temp_dir.path(), two_runs());
    let mut value: Value =
        serde_json::from_slice(&std::fs::read(&fixture).expect("read fixture"))
            .expect("parse fixture");
    value["POST /api/compliance/policies/p1/runs"] =
        json!({"id": "r3", "policy_id": "p1", "status": "running"});
    std::fs::write(&fixture, serde_json::to_vec(&value).expect("serialize fixture"))
        .expect("rewrite fixture");

    let output = policyview(&fixture, &["trigger", "--policy", "p1", "--json"]);
    assert!(output.status.success());
    let value = stdout_json(&output);
    assert_eq!(value["view"]["phase"], "ready");
    assert_eq!(value["notices"], json!([]));
}

#[test]
fn stats_prints_aggregate_figures() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let fixture = write_fixture(temp_dir.path(), two_runs());

    let output = policyview(&fixture, &["stats"]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "Overall compliance: 87.3%\nActive policies: 3\nCritical issues: 1\n"
    );

    let output = policyview(&fixture, &["stats", "--json"]);
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["active_policies"], 3);
}

#[test]
fn fixture_rejects_network_options() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let fixture = write_fixture(temp_dir.path(), two_runs());

    for extra in [["--timeout-ms", "500"], ["--config", "policyview.json"]] {
        let output = policyview(&fixture, &[extra[0], extra[1], "policies"]);
        assert!(!output.status.success());
        assert!(String::from_utf8_lossy(&output.stderr).contains("cannot be used with"));
    }
}
