use assert_cmd::Command;
use predicates::prelude::*;

/// `loom` with account and region set and the rest of the `LOOM_*`
/// environment cleared, so host configuration never leaks in.
fn loom() -> Command {
    let mut cmd = Command::cargo_bin("loom").unwrap();
    for var in [
        "LOOM_ACCOUNT",
        "LOOM_REGION",
        "LOOM_STACK_PREFIX",
        "LOOM_DOMAIN",
        "LOOM_DESCRIPTION",
    ] {
        cmd.env_remove(var);
    }
    cmd.env("LOOM_ACCOUNT", "123456789012");
    cmd.env("LOOM_REGION", "us-west-2");
    cmd
}

#[test]
fn help_lists_the_commands() {
    loom()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("synth"))
        .stdout(predicate::str::contains("validate"));
}

#[test]
fn synth_emits_a_json_template() {
    loom()
        .arg("synth")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"format_version\": \"cloudloom/1\""))
        .stdout(predicate::str::contains("Atlas-API-Prod-Container"))
        .stdout(predicate::str::contains("\"account\": \"123456789012\""));
}

#[test]
fn synth_emits_yaml_on_request() {
    loom()
        .arg("synth")
        .arg("--format")
        .arg("yaml")
        .assert()
        .success()
        .stdout(predicate::str::contains("format_version: cloudloom/1"));
}

#[test]
fn synth_output_is_identical_across_runs() {
    let first = loom().arg("synth").assert().success();
    let second = loom().arg("synth").assert().success();
    assert_eq!(
        first.get_output().stdout,
        second.get_output().stdout
    );
}

#[test]
fn synth_respects_the_environment_filter() {
    loom()
        .arg("synth")
        .arg("--env")
        .arg("prod")
        .assert()
        .success()
        .stdout(predicate::str::contains("Atlas-Prod-Cluster"))
        .stdout(predicate::str::contains("Atlas-Dev-Cluster").not());
}

#[test]
fn synth_writes_to_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("template.json");
    loom()
        .arg("synth")
        .arg("--out")
        .arg(&path)
        .assert()
        .success();

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("\"stages\""));
    assert!(written.contains("Atlas-Web-Dev-Service"));
}

#[test]
fn unknown_environment_label_is_rejected() {
    loom()
        .arg("synth")
        .arg("--env")
        .arg("qa")
        .assert()
        .failure()
        .stderr(predicate::str::contains("qa"));
}

#[test]
fn missing_account_is_an_error() {
    let mut cmd = Command::cargo_bin("loom").unwrap();
    for var in ["LOOM_ACCOUNT", "LOOM_REGION"] {
        cmd.env_remove(var);
    }
    cmd.arg("synth").assert().failure();
}

#[test]
fn validate_prints_a_summary() {
    loom()
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Assembly is valid"))
        .stdout(predicate::str::contains("Resources:"))
        .stdout(predicate::str::contains("pipelines"));
}
