use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::tempdir;

// Simulated counter climbing 10 counts per poll; fast loop so tests stay quick.
fn write_config(dir: &Path) -> PathBuf {
    let nvm = dir.join("nvm.bin");
    let toml = format!(
        r#"
[counter]
kind = "simulated"
sim_step = 10

[store]
path = "{}"
size = 64

[runner]
sample_rate_hz = 1000
"#,
        nvm.display()
    );
    let path = dir.join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn dro(cfg: &Path) -> Command {
    let mut cmd = Command::cargo_bin("dro").unwrap();
    cmd.arg("--config").arg(cfg).arg("--log-level").arg("warn");
    cmd
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["run", "--iterations", "5"], 0, "position=50 numerator=1 denominator=1", "stdout")]
#[case(&["write", "--attribute", "numerator", "--value", "0"], 3, "numerator must be > 0", "stderr")]
#[case(&["write", "--attribute", "position", "--value", "1"], 3, "cannot be written", "stderr")]
#[case(&["write", "--attribute", "speed", "--value", "1"], 1, "unknown attribute", "stderr")]
#[case(&["write", "--attribute", "numerator", "--value", "70000"], 3, "expected 0..=65535", "stderr")]
#[case(&["write", "--attribute", "set_position", "--value", "1.5"], 3, "set_position value was not understood", "stderr")]
#[case(&["attributes"], 0, "d757fcb0-686d-4216-ba8e-a3703f1590fc", "stdout")]
#[case(&["self-check"], 0, "ok: count=10 nvm_bytes=64", "stdout")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path());
    let out = dro(&cfg).args(args).output().unwrap();
    assert_eq!(
        out.status.code(),
        Some(exit_code),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    let text = if stream == "stdout" {
        String::from_utf8_lossy(&out.stdout)
    } else {
        String::from_utf8_lossy(&out.stderr)
    };
    assert!(text.contains(needle), "{stream} was: {text}");
}

#[test]
fn written_numerator_persists_across_runs() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path());

    dro(&cfg)
        .args(["write", "--attribute", "numerator", "--value", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("numerator=7"));

    dro(&cfg)
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("stored: numerator=7 denominator=1"))
        .stdout(predicate::str::contains("active: position=0 numerator=7"));

    dro(&cfg)
        .args(["run", "--iterations", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("position=140 numerator=7"));
}

#[test]
fn show_does_not_initialise_a_fresh_image() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path());
    dro(&cfg)
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("stored: numerator=0 denominator=0"))
        .stdout(predicate::str::contains("active: position=0 numerator=1 denominator=1"));
    assert!(!dir.path().join("nvm.bin").exists());
}

#[test]
fn scripted_writes_apply_at_their_tick() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path());
    let script = dir.path().join("writes.csv");
    fs::write(
        &script,
        "tick,attribute,value\n2,numerator,2\n3,denominator,0\n3,reverse,1\n",
    )
    .unwrap();

    dro(&cfg)
        .args(["run", "--iterations", "5", "--stats", "--script"])
        .arg(&script)
        .assert()
        .success()
        // tick 2: 30 counts, then numerator 2 -> 60; tick 3 reversed -> -80; tick 4 -> -100
        .stdout(predicate::str::contains(
            "position=-100 numerator=2 denominator=1 reversed=true",
        ))
        .stdout(predicate::str::contains(
            "events=3 applied=2 rejected=1 invalid=0",
        ));
}

#[test]
fn clear_counter_restarts_from_zero() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("cfg.toml");
    fs::write(
        &cfg,
        format!(
            "[counter]\nsim_start = 1000\nsim_step = 1\n\n[store]\npath = \"{}\"\n\n[runner]\nsample_rate_hz = 1000\n",
            dir.path().join("nvm.bin").display()
        ),
    )
    .unwrap();
    dro(&cfg)
        .args(["run", "--iterations", "3", "--clear-counter"])
        .assert()
        .success()
        .stdout(predicate::str::contains("position=3 "));
}

#[test]
fn json_mode_emits_state_object() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path());
    let out = dro(&cfg)
        .args(["--json", "run", "--iterations", "3", "--stats"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let line = String::from_utf8_lossy(&out.stdout);
    let v: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
    assert_eq!(v["position"], 30);
    assert_eq!(v["stats"]["iterations"], 3);
    assert_eq!(v["stats"]["updates"], 3);
}

#[test]
fn json_mode_reports_config_errors() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("cfg.toml");
    fs::write(&cfg, "[store]\npath = \"nvm.bin\"\n\n[calibration]\nnumerator = 0\n").unwrap();
    let out = dro(&cfg).args(["--json", "show"]).output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    let v: serde_json::Value = serde_json::from_str(String::from_utf8_lossy(&out.stderr).trim()).unwrap();
    assert_eq!(v["reason"], "Error");
    assert!(v["message"].as_str().unwrap().contains("calibration.numerator must be > 0"));
}

#[test]
fn missing_config_is_reported() {
    dro(Path::new("/nonexistent/dro.toml"))
        .arg("show")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration is invalid or incomplete"));
}
