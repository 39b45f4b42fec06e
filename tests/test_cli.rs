//! Integration tests for the kwdebug binary

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn kwdebug() -> Command {
    let mut cmd = Command::cargo_bin("kwdebug").unwrap();
    cmd.env_remove("KWDEBUG_LOG").env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_help_command() {
    kwdebug()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Step debugger and interactive shell"))
        .stdout(predicate::str::contains("KWDEBUG_HISTORY"));
}

#[test]
fn test_version_command() {
    kwdebug()
        .arg("--version")
        .assert()
        .success()
        .stdout(format!("kwdebug {}\n", env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_unknown_option() {
    kwdebug()
        .arg("--bogus")
        .assert()
        .code(252)
        .stderr(predicate::str::contains("unknown option: --bogus"));
}

#[test]
fn test_invalid_engine_version() {
    kwdebug()
        .args(["--engine-version", "three"])
        .assert()
        .code(252)
        .stderr(predicate::str::contains("invalid engine version"));
}

#[test]
fn test_standalone_shell_from_stdin() {
    let dir = tempfile::tempdir().unwrap();
    kwdebug()
        .env("KWDEBUG_HISTORY", dir.path().join("history"))
        .write_stdin("log to console  hello\n${x} =  catenate  a  b\nexit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(">>>>> Enter interactive shell"))
        .stdout(predicate::str::contains("\nhello\n"))
        .stdout(predicate::str::contains("# ${x} = \"a b\""))
        .stdout(predicate::str::contains(">>>>> Exit shell."));
}

#[test]
fn test_stdin_end_closes_shell() {
    kwdebug()
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("Debug Shell"))
        .stdout(predicate::str::contains("| PASS |"));
}

#[test]
fn test_suite_failure_sets_return_code() {
    let dir = tempfile::tempdir().unwrap();
    let suite = dir.path().join("broken.robot");
    fs::write(
        &suite,
        "*** Test Cases ***\nWorks\n    No Operation\nBroken\n    Fail    nope\n",
    )
    .unwrap();

    kwdebug()
        .arg(&suite)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Broken"))
        .stdout(predicate::str::contains("| FAIL |"))
        .stdout(predicate::str::contains("2 tests, 1 passed, 1 failed"));
}

#[test]
fn test_step_through_suite_file() {
    let dir = tempfile::tempdir().unwrap();
    let suite = dir.path().join("steps.robot");
    fs::write(
        &suite,
        "*** Settings ***\nLibrary    DebugLibrary\n\n*** Test Cases ***\nSteps\n    Debug\n    Log To Console    one\n",
    )
    .unwrap();

    kwdebug()
        .arg(&suite)
        .write_stdin("step\nlist\ncontinue\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("> {}(7)", suite.display())))
        .stdout(predicate::str::contains("  7 ->\t    Log To Console    one"))
        .stdout(predicate::str::contains("\none\n"));
}

#[test]
fn test_missing_suite_file() {
    kwdebug()
        .arg("no/such/suite.robot")
        .assert()
        .code(252)
        .stderr(predicate::str::contains("[ ERROR ]"));
}
