//! A small keyword-driven test engine.
//!
//! The engine runs plain text suites (see [`suite`]), resolves keywords
//! against imported [`Library`] implementations and notifies listeners
//! around every keyword call. It implements [`Host`], which is all the
//! debugger needs from it.

pub mod builtin;
pub mod suite;
pub mod variables;

use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use semver::Version;

use crate::console::Console;
use crate::host::{ExecutionFrame, Host, HostError, KeywordDoc, KeywordEvent, LibraryInfo, Listener, Step, Value};
use crate::probe::{RUN_FRAME, RUN_FRAME_SINCE, RUN_STEPS_FRAME};
use crate::signals::take_interrupt;
use crate::sourcelines::supports_source_lines;

pub use suite::{load_suite, parse_suite, Suite, SuiteError, TestCase};
pub use variables::Variables;

/// Engine generation emulated unless told otherwise.
pub const DEFAULT_VERSION: Version = Version::new(4, 1, 0);

/// Frame pushed for the duration of a suite.
pub const SUITE_FRAME: &str = "start_suite";

/// Highest return code; more failures are reported as this.
pub const MAX_RETURN_CODE: i32 = 250;

/// A keyword library.
pub trait Library {
    fn name(&self) -> &str;

    fn version(&self) -> &str {
        ""
    }

    fn doc(&self) -> &str {
        ""
    }

    fn source(&self) -> Option<PathBuf> {
        None
    }

    fn keywords(&self) -> Vec<KeywordDoc>;

    /// Run `keyword`, named exactly as in [`keywords`](Self::keywords).
    fn run(&self, engine: &mut Engine, keyword: &str, args: Vec<Value>) -> Result<Value, HostError>;

    /// Listener registered when the library is imported.
    fn listener(&self) -> Option<Rc<dyn Listener>> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Pass,
    Fail,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Pass => write!(f, "PASS"),
            Status::Fail => write!(f, "FAIL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TestResult {
    pub name: String,
    pub status: Status,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SuiteResult {
    pub name: String,
    pub tests: Vec<TestResult>,
}

impl SuiteResult {
    pub fn failed(&self) -> usize {
        self.tests.iter().filter(|t| t.status == Status::Fail).count()
    }

    pub fn passed(&self) -> usize {
        self.tests.len() - self.failed()
    }
}

/// Exit status for a run: the number of failed tests, capped.
pub fn return_code(results: &[SuiteResult]) -> i32 {
    let failed: usize = results.iter().map(SuiteResult::failed).sum();
    failed.min(MAX_RETURN_CODE as usize) as i32
}

/// Keyword names compare ignoring case, spaces and underscores.
pub fn normalize_keyword(name: &str) -> String {
    variables::normalize(name)
}

pub struct Engine {
    version: Version,
    console: Console,
    available: Vec<Rc<dyn Library>>,
    imported: Vec<Rc<dyn Library>>,
    listeners: Vec<Rc<dyn Listener>>,
    variables: Variables,
    frames: Vec<ExecutionFrame>,
    interrupt: Arc<AtomicBool>,
}

impl Engine {
    pub fn new(version: Version, console: Console) -> Self {
        let builtin: Rc<dyn Library> = Rc::new(builtin::BuiltIn);
        Engine {
            version,
            console,
            available: vec![Rc::clone(&builtin)],
            imported: vec![builtin],
            listeners: Vec::new(),
            variables: Variables::new(),
            frames: Vec::new(),
            interrupt: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share `flag` as the stop request raised by an operator interrupt.
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = flag;
        self
    }

    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }

    /// Make a library importable by name.
    pub fn register_library(&mut self, library: Rc<dyn Library>) {
        self.available.retain(|lib| lib.name() != library.name());
        self.available.push(library);
    }

    /// Import a registered library, adding its listener if it has one.
    /// Importing twice is a no-op.
    pub fn import_library(&mut self, name: &str) -> Result<(), HostError> {
        let wanted = normalize_keyword(name);
        if self
            .imported
            .iter()
            .any(|lib| normalize_keyword(lib.name()) == wanted)
        {
            return Ok(());
        }
        let library = self
            .available
            .iter()
            .find(|lib| normalize_keyword(lib.name()) == wanted)
            .cloned()
            .ok_or_else(|| {
                HostError::ExecutionFailed(format!("Importing library '{}' failed: not found.", name))
            })?;
        if let Some(listener) = library.listener() {
            self.add_listener(listener);
        }
        tracing::debug!(library = library.name(), "imported library");
        self.imported.push(library);
        Ok(())
    }

    pub fn add_listener(&mut self, listener: Rc<dyn Listener>) {
        self.listeners.push(listener);
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn variables_mut(&mut self) -> &mut Variables {
        &mut self.variables
    }

    /// Function name of the per-test frame for this engine generation.
    fn test_frame(&self) -> &'static str {
        if self.version >= RUN_FRAME_SINCE {
            RUN_FRAME
        } else {
            RUN_STEPS_FRAME
        }
    }

    pub fn run_suite_file(&mut self, path: &Path) -> Result<SuiteResult, suite::SuiteError> {
        let suite = load_suite(path)?;
        Ok(self.run_suite(&suite))
    }

    pub fn run_suite(&mut self, suite: &Suite) -> SuiteResult {
        self.console.line(&"=".repeat(78));
        self.console.line(&suite.name);
        self.console.line(&"=".repeat(78));

        self.frames.push(ExecutionFrame {
            function: SUITE_FRAME,
            runner: Some(suite.name.clone()),
            step: None,
        });

        let mut result = SuiteResult {
            name: suite.name.clone(),
            tests: Vec::new(),
        };
        match self.setup_suite(suite) {
            Ok(()) => {
                for test in &suite.tests {
                    let outcome = self.run_test(test);
                    result.tests.push(outcome);
                }
            }
            Err(err) => {
                for test in &suite.tests {
                    let outcome = TestResult {
                        name: test.name.clone(),
                        status: Status::Fail,
                        message: format!("Suite setup failed:\n{}", err),
                    };
                    self.report(&outcome);
                    result.tests.push(outcome);
                }
            }
        }

        self.frames.pop();
        self.console.line(&"=".repeat(78));
        self.console.line(&format!(
            "{} tests, {} passed, {} failed",
            result.tests.len(),
            result.passed(),
            result.failed()
        ));
        self.console.line(&"=".repeat(78));
        result
    }

    fn setup_suite(&mut self, suite: &Suite) -> Result<(), HostError> {
        for library in &suite.libraries {
            self.import_library(library)?;
        }
        for (name, cells) in &suite.variables {
            let mut values = Vec::with_capacity(cells.len());
            for cell in cells {
                values.push(self.variables.resolve(cell)?);
            }
            let value = if name.starts_with('$') {
                match values.len() {
                    0 => Value::from(""),
                    1 => values.remove(0),
                    _ => Value::Array(values),
                }
            } else {
                Value::Array(values)
            };
            self.variables.set(name, value)?;
        }
        Ok(())
    }

    fn run_test(&mut self, test: &TestCase) -> TestResult {
        let function = self.test_frame();
        self.frames.push(ExecutionFrame {
            function,
            runner: Some(test.name.clone()),
            step: None,
        });

        let mut outcome = TestResult {
            name: test.name.clone(),
            status: Status::Pass,
            message: String::new(),
        };
        for step in &test.steps {
            if let Err(err) = self.run_step(step) {
                outcome.status = Status::Fail;
                outcome.message = err.to_string();
                break;
            }
        }

        self.frames.pop();
        self.report(&outcome);
        outcome
    }

    fn report(&self, outcome: &TestResult) {
        self.console
            .line(&format!("{:<70}| {} |", outcome.name, outcome.status));
        if !outcome.message.is_empty() {
            self.console.line(&outcome.message);
        }
    }

    fn run_step(&mut self, step: &Step) -> Result<(), HostError> {
        if self.interrupt.load(Ordering::SeqCst) {
            return Err(HostError::Interrupted);
        }

        let step = if supports_source_lines(&self.version) {
            step.clone()
        } else {
            Step {
                source: None,
                lineno: None,
                ..step.clone()
            }
        };
        if let Some(frame) = self.frames.last_mut() {
            frame.step = Some(step.clone());
        }

        let value = self.dispatch(&step.keyword, &step.args, &step.assign, step.source.clone(), step.lineno)?;
        self.assign(&step.assign, value)
    }

    fn assign(&mut self, targets: &[String], value: Value) -> Result<(), HostError> {
        match targets {
            [] => Ok(()),
            [single] => self.variables.set(single, value),
            many => {
                let items = match value {
                    Value::Array(items) if items.len() == many.len() => items,
                    other => {
                        return Err(HostError::ExecutionFailed(format!(
                            "Cannot set variables: Expected {} return values, got {}.",
                            many.len(),
                            variables::stringify(&other)
                        )))
                    }
                };
                for (target, item) in many.iter().zip(items) {
                    self.variables.set(target, item)?;
                }
                Ok(())
            }
        }
    }

    /// Run a keyword given as raw cells, outside any suite step.
    pub fn run_keyword_cells(&mut self, name: &str, args: &[String]) -> Result<Value, HostError> {
        self.dispatch(name, args, &[], None, None)
    }

    fn dispatch(
        &mut self,
        name: &str,
        args: &[String],
        assign: &[String],
        source: Option<PathBuf>,
        lineno: Option<usize>,
    ) -> Result<Value, HostError> {
        let (library, keyword) = self.find_keyword(name)?;
        let event = KeywordEvent {
            libname: library.name().to_string(),
            kwname: keyword.name.clone(),
            args: args.to_vec(),
            assign: assign.to_vec(),
            source,
            lineno,
        };

        let listeners = self.listeners.clone();
        for listener in &listeners {
            listener.start_keyword(self, &event);
        }

        let result = self.resolve_args(args).and_then(|values| {
            tracing::debug!(keyword = %event.full_name(), "running keyword");
            library.run(self, &keyword.name, values)
        });

        for listener in &listeners {
            listener.end_keyword(self, &event);
        }
        result
    }

    fn resolve_args(&self, args: &[String]) -> Result<Vec<Value>, HostError> {
        args.iter().map(|arg| self.variables.resolve(arg)).collect()
    }

    /// Resolve `name` or `Library.name` among imported libraries.
    fn find_keyword(&self, name: &str) -> Result<(Rc<dyn Library>, KeywordDoc), HostError> {
        let mut found: Vec<(Rc<dyn Library>, KeywordDoc)> = Vec::new();

        if let Some((lib_name, kw_name)) = name.split_once('.') {
            let lib_key = normalize_keyword(lib_name);
            let kw_key = normalize_keyword(kw_name);
            for library in &self.imported {
                if normalize_keyword(library.name()) != lib_key {
                    continue;
                }
                for keyword in library.keywords() {
                    if normalize_keyword(&keyword.name) == kw_key {
                        found.push((Rc::clone(library), keyword));
                    }
                }
            }
        }

        if found.is_empty() {
            let key = normalize_keyword(name);
            for library in &self.imported {
                for keyword in library.keywords() {
                    if normalize_keyword(&keyword.name) == key {
                        found.push((Rc::clone(library), keyword));
                    }
                }
            }
        }

        match found.len() {
            0 => Err(HostError::ExecutionFailed(format!(
                "No keyword with name '{}' found.",
                name
            ))),
            1 => Ok(found.remove(0)),
            _ => {
                let names: Vec<String> = found
                    .iter()
                    .map(|(lib, kw)| format!("    {}.{}", lib.name(), kw.name))
                    .collect();
                Err(HostError::ExecutionFailed(format!(
                    "Multiple keywords with name '{}' found. Give the full name of the keyword you want to use:\n{}",
                    name,
                    names.join("\n")
                )))
            }
        }
    }

    fn library_info(library: &dyn Library) -> LibraryInfo {
        LibraryInfo {
            name: library.name().to_string(),
            version: library.version().to_string(),
            doc: library.doc().to_string(),
            source: library.source(),
        }
    }
}

impl Host for Engine {
    fn version(&self) -> &Version {
        &self.version
    }

    fn console(&self) -> Console {
        self.console.clone()
    }

    fn run_keyword(&mut self, name: &str, args: &[String]) -> Result<Value, HostError> {
        self.run_keyword_cells(name, args)
    }

    fn is_variable(&self, text: &str) -> bool {
        variables::is_variable(text)
    }

    fn set_variable(&mut self, name: &str, value: Value) -> Result<(), HostError> {
        self.variables.set(name, value)
    }

    fn libraries(&self) -> Vec<LibraryInfo> {
        let mut libraries: Vec<LibraryInfo> = self
            .imported
            .iter()
            .map(|lib| Engine::library_info(lib.as_ref()))
            .collect();
        libraries.sort_by(|a, b| a.name.cmp(&b.name));
        libraries
    }

    fn builtin_libraries(&self) -> Vec<String> {
        self.available.iter().map(|lib| lib.name().to_string()).collect()
    }

    fn library_keywords(&self, library: &str) -> Vec<KeywordDoc> {
        self.imported
            .iter()
            .find(|lib| lib.name() == library)
            .map(|lib| lib.keywords())
            .unwrap_or_default()
    }

    fn reset_interrupt(&mut self) {
        if take_interrupt(&self.interrupt) {
            tracing::debug!("cleared pending interrupt");
        }
    }

    fn frames(&self) -> &[ExecutionFrame] {
        &self.frames
    }
}
