use std::{path::PathBuf, process::Command};

fn scenario(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("scenarios")
        .join(name)
}

#[test]
fn bundled_skirmish_plays_to_completion() {
    let output = Command::new(env!("CARGO_BIN_EXE_rampart"))
        .arg("--scenario")
        .arg(scenario("skirmish.toml"))
        .args(["--tick-ms", "50", "--log", "warn"])
        .output()
        .expect("failed to launch rampart");

    assert!(output.status.success(), "rampart exited with {}", output.status);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("session Complete"), "unexpected summary: {stdout}");
    assert!(stdout.contains("waves cleared: 3"), "unexpected summary: {stdout}");
}

#[test]
fn missing_scenario_reports_an_error() {
    let output = Command::new(env!("CARGO_BIN_EXE_rampart"))
        .arg("--scenario")
        .arg(scenario("does-not-exist.toml"))
        .output()
        .expect("failed to launch rampart");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read scenario"), "stderr: {stderr}");
}
