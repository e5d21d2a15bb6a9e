use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_shows_all_commands() {
    cargo_bin_cmd!("wac")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("register"))
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("logout"))
        .stdout(predicate::str::contains("reminders"))
        .stdout(predicate::str::contains("--api-url"));
}

#[test]
fn test_reminders_help_shows_subcommands() {
    cargo_bin_cmd!("wac")
        .args(["reminders", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("delete"));
}

#[test]
fn test_missing_subcommand_fails() {
    cargo_bin_cmd!("wac").assert().failure();
}
