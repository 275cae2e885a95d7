use std::{io::Write, process::Command};

use serde_json::Value;

fn run(args: &[&str]) -> Value {
    let output = Command::new(env!("CARGO_BIN_EXE_stagehop"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to launch stagehop");
    assert!(
        output.status.success(),
        "stagehop exited with {}: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("headless report is JSON")
}

#[test]
fn headless_demo_reports_the_run() {
    let report = run(&["--headless", "60"]);

    assert_eq!(report["ticks"], 60);
    assert_eq!(report["active_layer"], "Overworld");
    assert_eq!(report["player"]["alive"], true);
    assert_eq!(report["goal_reached"], false);
    assert!(report["enemies_remaining"].as_u64().unwrap_or(0) > 0);
}

#[test]
fn stage_file_and_settings_are_honoured() {
    let mut stage = tempfile::NamedTempFile::new().expect("create stage");
    writeln!(stage, "0S0M0000\n11111111").expect("write stage");
    let mut config = tempfile::NamedTempFile::new().expect("create settings");
    writeln!(config, "[simulation]\ntick_rate_hz = 50").expect("write settings");

    let stage_path = stage.path().to_string_lossy().into_owned();
    let config_path = config.path().to_string_lossy().into_owned();
    let report = run(&[
        &stage_path,
        "--config",
        &config_path,
        "--headless",
        "100",
    ]);

    assert_eq!(report["elapsed_ms"], 2_000);
    assert_eq!(report["player"]["alive"], false);
    assert_eq!(report["events"]["deaths"], 1);
}

#[test]
fn missing_stage_file_runs_an_empty_world() {
    let report = run(&["no/such/stage.map", "--headless", "5"]);
    assert_eq!(report["ticks"], 5);
    assert_eq!(report["enemies_remaining"], 0);
}

#[test]
fn malformed_settings_abort_the_run() {
    let mut config = tempfile::NamedTempFile::new().expect("create settings");
    writeln!(config, "[window").expect("write settings");

    let output = Command::new(env!("CARGO_BIN_EXE_stagehop"))
        .args(["--config", &config.path().to_string_lossy(), "--headless", "1"])
        .output()
        .expect("failed to launch stagehop");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to load settings"), "stderr: {stderr}");
}
