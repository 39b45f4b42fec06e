//! Integration tests for stepping through a suite

#[path = "common/mod.rs"]
mod common;
use common::{debug_suite, harness, harness_with_version, Version, STEPPING_SUITE};

use std::rc::Rc;

use kwdebug::probe::RunStepsProbe;
use kwdebug::{Host, StepListener};

#[test]
fn test_step_prints_each_keyword() {
    let mut h = harness(&["step", "", "", "exit"]);
    let (result, path) = h.run(STEPPING_SUITE);
    assert_eq!(result.failed(), 0);

    let expected = [
        format!("> {}(7)", path.display()),
        "-> Log To Console    first".to_string(),
        "=> BuiltIn.Log To Console  first".to_string(),
        "first".to_string(),
        format!("> {}(8)", path.display()),
        "-> ${x} =    Set Variable    2".to_string(),
        "=> ${x} = BuiltIn.Set Variable  2".to_string(),
        format!("> {}(9)", path.display()),
        "-> Log To Console    x is ${x}".to_string(),
        "=> BuiltIn.Log To Console  x is ${x}".to_string(),
        String::new(),
        ">>>>> Exit shell.".to_string(),
        "x is 2".to_string(),
    ];
    let lines = h.lines();
    let start = lines.iter().position(|l| *l == expected[0]).unwrap();
    assert_eq!(&lines[start..start + expected.len()], &expected[..]);

    // stepping between keywords stays quiet
    assert_eq!(h.count(">>>>> Enter interactive shell"), 1);
    assert_eq!(h.count(">>>>> Exit shell."), 1);
    assert!(!h.context.is_step_mode());
    assert_eq!(h.script.remaining(), 0);
}

#[test]
fn test_next_is_step() {
    let mut h = harness(&["n", "n", "c"]);
    let (result, path) = h.run(STEPPING_SUITE);
    assert_eq!(result.failed(), 0);
    assert_eq!(h.count(&format!("> {}(7)", path.display())), 1);
    assert_eq!(h.count(&format!("> {}(8)", path.display())), 1);
    assert_eq!(h.count(&format!("> {}(9)", path.display())), 0);
    assert_eq!(h.count("x is 2"), 1);
}

#[test]
fn test_continue_stops_stepping() {
    let mut h = harness(&["step", "continue"]);
    let (_, path) = h.run(STEPPING_SUITE);
    assert_eq!(h.count(&format!("> {}(7)", path.display())), 1);
    assert_eq!(h.count(&format!("> {}(8)", path.display())), 0);
    assert_eq!(h.count("first"), 1);
    assert_eq!(h.count("x is 2"), 1);
}

#[test]
fn test_keyword_typed_while_stepping_breaks_again() {
    // The nested break opens its own shell; leaving it returns to the
    // keyword that triggered it, which still runs, and the outer shell
    // keeps reading.
    let mut h = harness(&["step", "log to console  inner", "exit", "", "continue"]);
    let (result, path) = h.run(&debug_suite(&["Log To Console    outer"]));
    assert_eq!(result.failed(), 0);

    let lines = h.lines();
    let nested = lines
        .iter()
        .position(|l| l == "=> BuiltIn.Log To Console  inner")
        .unwrap();
    assert_eq!(lines[nested - 2], format!("> {}(7)", path.display()));
    assert_eq!(lines[nested + 1], "");
    assert_eq!(lines[nested + 2], ">>>>> Exit shell.");
    assert_eq!(lines[nested + 3], "inner");

    // `exit` turned stepping off, so the empty line repeated nothing
    assert_eq!(h.count("inner"), 1);
    assert!(h.position_of("inner").unwrap() < h.position_of("outer").unwrap());
    assert_eq!(h.script.remaining(), 0);
}

#[test]
fn test_nested_shell_restores_last_command() {
    let mut h = harness(&["step", "log to console  inner", "step", "", "continue", "exit"]);
    let (result, _) = h.run(&debug_suite(&["Log To Console    outer"]));
    assert_eq!(result.failed(), 0);

    // The empty line repeated the outer shell's own last command, not the
    // `step` typed in the nested shell.
    assert_eq!(h.count("inner"), 2);
    assert_eq!(h.count("outer"), 1);
    assert_eq!(h.script.remaining(), 0);
}

#[test]
fn test_list_shows_window() {
    let mut h = harness(&["step", "list", "continue"]);
    let (result, _) = h.run(STEPPING_SUITE);
    assert_eq!(result.failed(), 0);

    let lines = h.lines();
    let first = h.position_of("  2   \tLibrary    DebugLibrary").unwrap();
    let expected = [
        "  2   \tLibrary    DebugLibrary",
        "  3   \t",
        "  4   \t*** Test Cases ***",
        "  5   \tStepping",
        "  6   \t    Debug",
        "  7 ->\t    Log To Console    first",
        "  8   \t    ${x} =    Set Variable    2",
        "  9   \t    Log To Console    x is ${x}",
    ];
    assert_eq!(&lines[first..first + expected.len()], &expected[..]);
    assert_eq!(h.count("  1   \t*** Settings ***"), 0);
}

#[test]
fn test_longlist_shows_test_case() {
    let mut h = harness(&["step", "s", "ll", "continue"]);
    h.run(STEPPING_SUITE);

    let lines = h.lines();
    let first = h.position_of("  5   \tStepping").unwrap();
    let expected = [
        "  5   \tStepping",
        "  6   \t    Debug",
        "  7   \t    Log To Console    first",
        "  8 ->\t    ${x} =    Set Variable    2",
        "  9   \t    Log To Console    x is ${x}",
    ];
    assert_eq!(&lines[first..first + expected.len()], &expected[..]);
    assert_eq!(h.count("  4   \t*** Test Cases ***"), 0);
}

#[test]
fn test_legacy_engine_cannot_list() {
    let mut h = harness_with_version(Version::new(3, 1, 0), &["step", "list", "ll", "continue"]);
    let (result, _) = h.run(STEPPING_SUITE);
    assert_eq!(result.failed(), 0);

    // no location without source lines, but the call is still shown
    assert_eq!(h.count("=> BuiltIn.Log To Console  first"), 1);
    assert!(!h.lines().iter().any(|line| line.starts_with("-> ")));
    assert_eq!(
        h.count("Please upgrade the test engine to support list source code:"),
        2
    );
    assert_eq!(h.count("    engine 3.2.0 or newer is required, running 3.1.0"), 2);
}

#[test]
fn test_engine_between_3_2_and_4_steps_with_source() {
    let mut h = harness_with_version(Version::new(3, 2, 2), &["step", "continue"]);
    let (_, path) = h.run(STEPPING_SUITE);
    assert_eq!(h.count(&format!("> {}(7)", path.display())), 1);
    assert_eq!(h.count("-> Log To Console    first"), 1);
}

#[test]
fn test_unmatched_probe_does_not_break() {
    // A probe for the wrong engine finds no step frame; execution goes on
    // without breaking.
    let mut h = harness(&["log to console  never read"]);
    let listener = StepListener::with_probe(h.session.clone(), Box::new(RunStepsProbe));
    h.engine.add_listener(Rc::new(listener));
    h.context.set_step_mode(true);

    let (result, _) = h.run("*** Test Cases ***\nPlain\n    Log To Console    no break\n");
    assert_eq!(result.failed(), 0);
    assert_eq!(h.count("no break"), 1);
    assert!(!h.lines().iter().any(|line| line.starts_with("=> ")));
    assert!(h.context.position().is_none());
    assert_eq!(h.script.remaining(), 1);
}

#[test]
fn test_position_cleared_when_not_stepping() {
    let mut h = harness(&["step", "exit"]);
    let (_, path) = h.run(&debug_suite(&["Log To Console    last"]));
    // `exit` at the last keyword left its position in place
    assert_eq!(h.context.position(), Some((path, 7)));

    h.engine.run_keyword("No Operation", &[]).unwrap();
    assert!(h.context.position().is_none());
}

#[test]
fn test_current_step_is_recorded() {
    let mut h = harness(&["step", "exit"]);
    h.run(STEPPING_SUITE);
    let step = h.context.current_step().unwrap();
    assert_eq!(step.keyword, "Log To Console");
    assert_eq!(step.args, vec!["first".to_string()]);
    assert_eq!(h.context.current_runner().as_deref(), Some("Stepping"));
}
