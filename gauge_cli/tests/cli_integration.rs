use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Minimal valid TOML for the simulation backend. The 100 Ω series resistor
// keeps the simulated divider well above the dropout epsilon.
fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[sensor]
max_resistance_ohms = 240.0
min_resistance_ohms = 30.0
known_resistor_ohms = 100.0
adc_samples = 4
sample_delay_us = 100

[gauge]
min_duty = 140
max_duty = 225
ema_alpha = 0.05
tick_ms = 10

[safety]
blink_threshold = 150
low_level_threshold = 145
blink_interval_ms = 100

[ramp]
max_value = 30
step_size = 5
step_delay_ms = 5
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

#[rstest]
fn self_check_reports_ok_in_sim_mode() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    Command::cargo_bin("gauge_cli")
        .unwrap()
        .args(["--config", cfg.to_str().unwrap(), "self-check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("self-check: ok"));
}

#[rstest]
fn show_config_emits_the_boundary_document() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    Command::cargo_bin("gauge_cli")
        .unwrap()
        .args(["--config", cfg.to_str().unwrap(), "show-config"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("maxResistance")
                .and(predicate::str::contains("lowLevelThreshold"))
                .and(predicate::str::contains("pemMaxValue")),
        );
}

#[rstest]
fn run_with_tick_budget_prints_final_snapshot() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    Command::cargo_bin("gauge_cli")
        .unwrap()
        .args([
            "--config",
            cfg.to_str().unwrap(),
            "--json",
            "run",
            "--ticks",
            "5",
            "--telemetry-ms",
            "0",
        ])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("smoothedDuty").and(predicate::str::contains("resistance")),
        );
}

#[rstest]
fn run_in_ramp_mode_reports_pem_state() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    Command::cargo_bin("gauge_cli")
        .unwrap()
        .args([
            "--config",
            cfg.to_str().unwrap(),
            "--json",
            "run",
            "--ticks",
            "3",
            "--ramp",
            "--sim-enable",
            "--telemetry-ms",
            "0",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("pemStatus"));
}

#[rstest]
fn invalid_config_is_rejected_with_a_hint() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(
        &path,
        "[safety]\nblink_threshold = 100\nlow_level_threshold = 200\n",
    )
    .unwrap();
    Command::cargo_bin("gauge_cli")
        .unwrap()
        .args(["--config", path.to_str().unwrap(), "self-check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("low_level_threshold"));
}

#[rstest]
fn missing_config_falls_back_to_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nope.toml");
    Command::cargo_bin("gauge_cli")
        .unwrap()
        .args(["--config", path.to_str().unwrap(), "self-check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("self-check: ok"));
}
