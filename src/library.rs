//! `DebugLibrary`: the `Debug` keyword plus the step listener.

use std::rc::Rc;

use crate::cmdloop::ShellError;
use crate::debugcmd::{run_shell, DebugSession};
use crate::engine::{Engine, Library};
use crate::host::{Host, HostError, KeywordDoc, Listener, Value};
use crate::listener::StepListener;

pub const LIBRARY_NAME: &str = "DebugLibrary";

pub const DEBUG_KEYWORD: &str = "Debug";

const DEBUG_DOC: &str = "Open an interactive shell, run any keywords.\n\n\
Keywords are separated by two spaces or one tab, and Ctrl-D exits.";

/// Library that opens the debug shell. Importing it registers its
/// [`StepListener`], which breaks into the shell while stepping.
pub struct DebugLibrary {
    session: DebugSession,
    listener: Rc<StepListener>,
}

impl DebugLibrary {
    pub fn new(session: DebugSession) -> Self {
        let listener = Rc::new(StepListener::new(session.clone()));
        DebugLibrary { session, listener }
    }
}

/// Open the shell on `host` and return once the operator leaves it.
///
/// The enter/exit banners are only shown outside step mode, so stepping
/// from keyword to keyword stays quiet.
pub fn debug(host: &mut dyn Host, session: &DebugSession) -> Result<(), ShellError> {
    let console = host.console();

    let show_intro = !session.context.is_step_mode();
    if show_intro {
        console.line("");
        console.output(">>>>>", "Enter interactive shell");
        run_shell(host, session, None)?;
    } else {
        run_shell(host, session, Some(""))?;
    }

    if !session.context.is_step_mode() {
        console.line("");
        console.output(">>>>>", "Exit shell.");
    }
    Ok(())
}

impl Library for DebugLibrary {
    fn name(&self) -> &str {
        LIBRARY_NAME
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn doc(&self) -> &str {
        "Debug library: an interactive shell and step debugger for test suites."
    }

    fn keywords(&self) -> Vec<KeywordDoc> {
        vec![KeywordDoc {
            name: DEBUG_KEYWORD.to_string(),
            lib: LIBRARY_NAME.to_string(),
            doc: DEBUG_DOC.to_string(),
        }]
    }

    fn run(&self, engine: &mut Engine, keyword: &str, _args: Vec<Value>) -> Result<Value, HostError> {
        if keyword != DEBUG_KEYWORD {
            return Err(HostError::ExecutionFailed(format!(
                "No keyword with name '{}' found.",
                keyword
            )));
        }
        debug(engine, &self.session).map_err(|err| HostError::HandlerFailed(err.to_string()))?;
        Ok(Value::Null)
    }

    fn listener(&self) -> Option<Rc<dyn Listener>> {
        let listener: Rc<dyn Listener> = self.listener.clone();
        Some(listener)
    }
}
