use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn top_level_help_lists_the_commands() {
    let mut cmd = cargo_bin_cmd!("radxctl");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("detect"))
        .stdout(predicate::str::contains("rename"))
        .stdout(predicate::str::contains("delete"))
        .stdout(predicate::str::contains("--server"));
}

#[test]
fn detect_help_documents_the_session_knobs() {
    let mut cmd = cargo_bin_cmd!("radxctl");
    let output = cmd
        .arg("detect")
        .arg("--help")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8_lossy(&output);
    assert!(text.contains("--save"), "detect help missing --save");
    assert!(text.contains("--output"), "detect help missing --output");
    assert!(
        text.contains("--timeout-secs"),
        "detect help missing --timeout-secs"
    );
    assert!(text.contains("--poll-ms"), "detect help missing --poll-ms");
}

#[test]
fn save_help_documents_anomaly_pairs() {
    let mut cmd = cargo_bin_cmd!("radxctl");
    cmd.arg("save")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--anomaly"));
}
