use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_both_commands() {
    Command::cargo_bin("mintchat")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("chat"));
}

#[test]
fn unknown_subcommand_fails() {
    Command::cargo_bin("mintchat")
        .unwrap()
        .arg("definitely-not-a-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn serve_help_shows_the_port_flag() {
    Command::cargo_bin("mintchat")
        .unwrap()
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--port"));
}
