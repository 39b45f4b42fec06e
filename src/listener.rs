//! Breaking into the shell before each keyword while stepping.

use std::cell::OnceCell;
use std::path::PathBuf;

use crate::debugcmd::DebugSession;
use crate::host::{Host, KeywordEvent, Listener, Step};
use crate::library::debug;
use crate::probe::{probe_for, ExecutionProbe};
use crate::sourcelines::read_lines;

pub struct StepListener {
    session: DebugSession,
    probe: OnceCell<Box<dyn ExecutionProbe>>,
}

impl StepListener {
    pub fn new(session: DebugSession) -> Self {
        StepListener {
            session,
            probe: OnceCell::new(),
        }
    }

    /// Use `probe` instead of the one matching the host version.
    pub fn with_probe(session: DebugSession, probe: Box<dyn ExecutionProbe>) -> Self {
        let listener = Self::new(session);
        let _ = listener.probe.set(probe);
        listener
    }
}

impl Listener for StepListener {
    fn start_keyword(&self, host: &mut dyn Host, event: &KeywordEvent) {
        let context = &self.session.context;
        context.clear_position();

        if !context.is_step_mode() {
            return;
        }

        let probe = self.probe.get_or_init(|| probe_for(host.version()));
        let Some(hit) = probe.locate(host.frames()) else {
            tracing::debug!(keyword = %event.full_name(), probe = probe.entry_point(), "no step frame on the stack");
            return;
        };
        let position = source_position(&hit.step, event);
        context.set_runner_step(hit.runner, Some(hit.step));

        let console = host.console();
        if let Some((path, lineno)) = position {
            context.set_position(&path, lineno);
            console.line(&format!("> {}({})", path.display(), lineno));
            match read_lines(&path) {
                Ok(lines) => {
                    if let Some(text) = lines.get(lineno - 1) {
                        console.line(&format!("-> {}", text.trim()));
                    }
                }
                Err(err) => tracing::warn!(error = %err, "cannot show current line"),
            }
        }

        console.line(&format!("=> {}", translate(event)));

        if let Err(err) = debug(host, &self.session) {
            console.error("! FAILED:", &err.to_string());
        }
    }
}

/// Source and line of the step, falling back to the event's.
fn source_position(step: &Step, event: &KeywordEvent) -> Option<(PathBuf, usize)> {
    let from_step = step.source.clone().zip(step.lineno);
    let from_event = || event.source.clone().zip(event.lineno);
    from_step.or_else(from_event).filter(|(_, lineno)| *lineno > 0)
}

/// `${a}, ${b} = Lib.Keyword  arg1  arg2`
pub fn translate(event: &KeywordEvent) -> String {
    let assign = if event.assign.is_empty() {
        String::new()
    } else {
        format!("{} = ", event.assign.join(", "))
    };
    format!("{}{}  {}", assign, event.full_name(), event.args.join("  "))
}
