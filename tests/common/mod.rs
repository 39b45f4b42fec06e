//! Common test utilities for kwdebug integration tests

use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

pub use kwdebug::engine::{Engine, SuiteResult, DEFAULT_VERSION};
pub use kwdebug::input::{scripted_factory, ScriptedInput};
pub use kwdebug::library::DebugLibrary;
pub use kwdebug::{CapturedOutput, Console, DebugContext, DebugSession, ShellConfig};
#[allow(unused_imports)]
pub use semver::Version;
use tempfile::TempDir;

/// Suite whose only test opens the shell, then runs three more steps.
///
/// ```text
///  5 Stepping
///  6     Debug
///  7     Log To Console    first
///  8     ${x} =    Set Variable    2
///  9     Log To Console    x is ${x}
/// ```
#[allow(dead_code)]
pub const STEPPING_SUITE: &str = "\
*** Settings ***
Library    DebugLibrary

*** Test Cases ***
Stepping
    Debug
    Log To Console    first
    ${x} =    Set Variable    2
    Log To Console    x is ${x}
";

/// An engine with the debug library registered, reading shell input from
/// a script and writing into memory.
pub struct Harness {
    pub engine: Engine,
    pub output: CapturedOutput,
    pub script: ScriptedInput,
    pub context: DebugContext,
    #[allow(dead_code)]
    pub session: DebugSession,
    dir: TempDir,
}

pub fn harness(lines: &[&str]) -> Harness {
    harness_with_version(DEFAULT_VERSION, lines)
}

pub fn harness_with_version(version: Version, lines: &[&str]) -> Harness {
    let (console, output) = Console::buffer();
    let script = ScriptedInput::from_lines(lines.iter().copied());
    let context = DebugContext::new();
    let session = DebugSession::new(
        context.clone(),
        ShellConfig::ephemeral(),
        scripted_factory(script.clone()),
    );

    let mut engine = Engine::new(version, console);
    engine.register_library(Rc::new(DebugLibrary::new(session.clone())));

    Harness {
        engine,
        output,
        script,
        context,
        session,
        dir: tempfile::tempdir().unwrap(),
    }
}

impl Harness {
    /// Write `text` as a suite file in the harness's temp dir.
    pub fn write_suite(&self, name: &str, text: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, text).unwrap();
        path
    }

    /// Write and run a suite. Returns the result and the suite's path.
    pub fn run(&mut self, text: &str) -> (SuiteResult, PathBuf) {
        let path = self.write_suite("suite.robot", text);
        let result = self.engine.run_suite_file(&path).unwrap();
        (result, path)
    }

    pub fn lines(&self) -> Vec<String> {
        self.output.lines()
    }

    /// Index of the first output line equal to `wanted`.
    pub fn position_of(&self, wanted: &str) -> Option<usize> {
        self.lines().iter().position(|line| line == wanted)
    }

    pub fn count(&self, wanted: &str) -> usize {
        self.lines().iter().filter(|line| *line == wanted).count()
    }
}

/// Suite with one test: `Debug` followed by `steps`.
#[allow(dead_code)]
pub fn debug_suite(steps: &[&str]) -> String {
    let mut text = String::from("*** Settings ***\nLibrary    DebugLibrary\n\n*** Test Cases ***\nShell\n    Debug\n");
    for step in steps {
        text.push_str("    ");
        text.push_str(step);
        text.push('\n');
    }
    text
}
