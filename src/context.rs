//! Debugger state shared by every shell activation.
//!
//! One [`DebugContext`] is created per debugging session and cloned into the
//! library, the step listener and each shell. Clones observe the same state.
//! Access is single-threaded and never held across calls, so a `RefCell`
//! is enough.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::host::Step;

#[derive(Debug, Default, Clone)]
pub struct DebugState {
    pub step_mode: bool,
    pub current_runner: Option<String>,
    pub current_step: Option<Step>,
    pub current_source_path: Option<PathBuf>,
    /// 1-based, 0 when unset.
    pub current_source_lineno: usize,
    pub last_command: String,
}

#[derive(Debug, Clone, Default)]
pub struct DebugContext {
    state: Rc<RefCell<DebugState>>,
}

impl DebugContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_step_mode(&self) -> bool {
        self.state.borrow().step_mode
    }

    pub fn set_step_mode(&self, on: bool) {
        self.state.borrow_mut().step_mode = on;
    }

    pub fn last_command(&self) -> String {
        self.state.borrow().last_command.clone()
    }

    pub fn set_last_command(&self, command: &str) {
        self.state.borrow_mut().last_command = command.to_string();
    }

    /// Forget the current source position.
    pub fn clear_position(&self) {
        let mut state = self.state.borrow_mut();
        state.current_source_path = None;
        state.current_source_lineno = 0;
    }

    pub fn set_position(&self, path: &Path, lineno: usize) {
        let mut state = self.state.borrow_mut();
        state.current_source_path = Some(path.to_path_buf());
        state.current_source_lineno = lineno;
    }

    /// Current `(path, line)` if both are known.
    pub fn position(&self) -> Option<(PathBuf, usize)> {
        let state = self.state.borrow();
        match (&state.current_source_path, state.current_source_lineno) {
            (Some(path), lineno) if lineno > 0 => Some((path.clone(), lineno)),
            _ => None,
        }
    }

    pub fn set_runner_step(&self, runner: Option<String>, step: Option<Step>) {
        let mut state = self.state.borrow_mut();
        state.current_runner = runner;
        state.current_step = step;
    }

    pub fn current_step(&self) -> Option<Step> {
        self.state.borrow().current_step.clone()
    }

    pub fn current_runner(&self) -> Option<String> {
        self.state.borrow().current_runner.clone()
    }

    /// Copy of the whole state.
    pub fn snapshot(&self) -> DebugState {
        self.state.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let ctx = DebugContext::new();
        let other = ctx.clone();
        ctx.set_step_mode(true);
        other.set_last_command("next");
        assert!(other.is_step_mode());
        assert_eq!(ctx.last_command(), "next");
    }

    #[test]
    fn test_position_requires_line() {
        let ctx = DebugContext::new();
        assert!(ctx.position().is_none());
        ctx.set_position(Path::new("suite.robot"), 7);
        assert_eq!(ctx.position(), Some((PathBuf::from("suite.robot"), 7)));
        ctx.clear_position();
        assert!(ctx.position().is_none());
        assert_eq!(ctx.snapshot().current_source_lineno, 0);
    }

    #[test]
    fn test_independent_contexts() {
        let a = DebugContext::new();
        let b = DebugContext::new();
        a.set_step_mode(true);
        assert!(!b.is_step_mode());
    }
}
