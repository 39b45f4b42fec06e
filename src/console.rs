//! Operator-facing output.
//!
//! Everything the shell shows the operator goes through a [`Console`]:
//! results are prefixed with a head marker (`#`, `<`, `>>>>>`), failures
//! with `!`. Heads are colored when the sink is a terminal.

use std::cell::RefCell;
use std::io::{self, IsTerminal, Write};
use std::rc::Rc;

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Cloneable handle to the output sink shared by the engine and every shell.
#[derive(Clone)]
pub struct Console {
    sink: Rc<RefCell<Box<dyn Write>>>,
    color: bool,
}

impl Console {
    /// Console writing to stdout, colored if stdout is a terminal and
    /// `NO_COLOR` is unset.
    pub fn stdout() -> Self {
        let color = io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
        Self::new(Box::new(io::stdout()), color)
    }

    pub fn new(sink: Box<dyn Write>, color: bool) -> Self {
        Console {
            sink: Rc::new(RefCell::new(sink)),
            color,
        }
    }

    /// Console capturing into memory, for tests and embedding.
    pub fn buffer() -> (Self, CapturedOutput) {
        let captured = CapturedOutput::default();
        let console = Self::new(Box::new(captured.clone()), false);
        (console, captured)
    }

    pub fn is_color(&self) -> bool {
        self.color
    }

    /// Print a plain line.
    pub fn line(&self, text: &str) {
        let mut sink = self.sink.borrow_mut();
        let _ = writeln!(sink, "{}", text);
        let _ = sink.flush();
    }

    /// Print `head message` with the head in the normal style.
    pub fn output(&self, head: &str, message: &str) {
        self.styled(GREEN, head, message);
    }

    /// Print `head message` with the head in the error style.
    pub fn error(&self, head: &str, message: &str) {
        self.styled(RED, head, message);
    }

    fn styled(&self, color: &str, head: &str, message: &str) {
        let rendered = if self.color {
            format!("{}{} {}{}", color, head, RESET, message)
        } else {
            format!("{} {}", head, message)
        };
        self.line(&rendered);
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::stdout()
    }
}

/// In-memory sink handed out by [`Console::buffer`].
#[derive(Clone, Default)]
pub struct CapturedOutput(Rc<RefCell<Vec<u8>>>);

impl CapturedOutput {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(String::from).collect()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
