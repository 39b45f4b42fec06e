//! Collaboration points with the host test engine.
//!
//! The debugger core never reaches into an engine directly. It runs
//! keywords, assigns variables, lists libraries and reads the execution
//! frame stack through [`Host`], and receives "about to run a keyword"
//! notifications through [`Listener`].

use std::path::PathBuf;

use semver::Version;
use thiserror::Error;

use crate::console::Console;

/// Values produced by keywords.
pub type Value = serde_json::Value;

/// Failures reported by [`Host::run_keyword`].
#[derive(Error, Debug)]
pub enum HostError {
    /// The keyword ran and failed.
    #[error("{0}")]
    HandlerFailed(String),
    /// The keyword could not be run: unknown name, bad arguments, missing
    /// variable.
    #[error("{0}")]
    ExecutionFailed(String),
    #[error("Execution terminated by signal")]
    Interrupted,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One executable step of a test as the engine sees it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Step {
    pub keyword: String,
    pub args: Vec<String>,
    /// Variables the step assigns, e.g. `${x}`.
    pub assign: Vec<String>,
    pub source: Option<PathBuf>,
    /// 1-based line of the step in `source`.
    pub lineno: Option<usize>,
}

/// A named activation record on the engine's execution stack.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionFrame {
    /// Name of the engine entry point that owns the frame.
    pub function: &'static str,
    /// Name of the runner (test) executing in this frame.
    pub runner: Option<String>,
    /// The step currently executing in this frame, if any.
    pub step: Option<Step>,
}

/// Payload of a start/end keyword notification.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KeywordEvent {
    pub libname: String,
    pub kwname: String,
    pub args: Vec<String>,
    pub assign: Vec<String>,
    pub source: Option<PathBuf>,
    pub lineno: Option<usize>,
}

impl KeywordEvent {
    /// `Library.Keyword`
    pub fn full_name(&self) -> String {
        if self.libname.is_empty() {
            self.kwname.clone()
        } else {
            format!("{}.{}", self.libname, self.kwname)
        }
    }
}

/// An imported library.
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryInfo {
    pub name: String,
    pub version: String,
    pub doc: String,
    pub source: Option<PathBuf>,
}

/// Documentation of one library keyword.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordDoc {
    pub name: String,
    pub lib: String,
    pub doc: String,
}

impl KeywordDoc {
    /// First line of the documentation.
    pub fn summary(&self) -> &str {
        self.doc.lines().next().unwrap_or("")
    }
}

/// The host engine as seen from the debugger.
pub trait Host {
    fn version(&self) -> &Version;

    /// Sink for operator-facing output.
    fn console(&self) -> Console;

    /// Run one keyword with already split arguments.
    fn run_keyword(&mut self, name: &str, args: &[String]) -> Result<Value, HostError>;

    /// Whether `text` is variable syntax such as `${name}`.
    fn is_variable(&self, text: &str) -> bool;

    fn set_variable(&mut self, name: &str, value: Value) -> Result<(), HostError>;

    /// Imported libraries, sorted by name.
    fn libraries(&self) -> Vec<LibraryInfo>;

    /// Names of libraries the engine can import.
    fn builtin_libraries(&self) -> Vec<String>;

    fn library_keywords(&self, library: &str) -> Vec<KeywordDoc>;

    /// Clear a pending operator interrupt so keywords can run again.
    fn reset_interrupt(&mut self);

    /// Execution stack, outermost frame first.
    fn frames(&self) -> &[ExecutionFrame];
}

/// Receiver of keyword boundary notifications.
pub trait Listener {
    fn start_keyword(&self, host: &mut dyn Host, event: &KeywordEvent);

    fn end_keyword(&self, _host: &mut dyn Host, _event: &KeywordEvent) {}
}
