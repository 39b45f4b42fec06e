//! Input sources for the command loop.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::rc::Rc;

use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;

use crate::cmdloop::ShellError;
use crate::completer::CmdCompleter;

/// Result of soliciting one line.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    Line(String),
    /// The operator cancelled the prompt (Ctrl-C).
    Interrupted,
    Eof,
}

pub trait LineReader {
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome, ShellError>;
}

/// Builds the input source of each new shell activation from its completer.
pub type InputFactory = Rc<dyn Fn(CmdCompleter) -> Result<Box<dyn LineReader>, ShellError>>;

/// Line editor with completion and a file-backed history.
pub struct EditorInput {
    editor: Editor<CmdCompleter, DefaultHistory>,
    history_path: Option<PathBuf>,
}

impl EditorInput {
    pub fn new(completer: CmdCompleter, history_path: Option<PathBuf>) -> Result<Self, ShellError> {
        let mut editor = Editor::new()?;
        editor.set_helper(Some(completer));

        if let Some(path) = &history_path {
            if let Err(err) = editor.load_history(path) {
                tracing::debug!(path = %path.display(), error = %err, "no history loaded");
            }
        }

        Ok(EditorInput {
            editor,
            history_path,
        })
    }

    fn remember(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        let _ = self.editor.add_history_entry(line);
        if let Some(path) = &self.history_path {
            if let Err(err) = self.editor.append_history(path) {
                tracing::warn!(path = %path.display(), error = %err, "failed to append history");
            }
        }
    }
}

impl LineReader for EditorInput {
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome, ShellError> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                self.remember(&line);
                Ok(ReadOutcome::Line(line))
            }
            Err(ReadlineError::Interrupted) => Ok(ReadOutcome::Interrupted),
            Err(ReadlineError::Eof) => Ok(ReadOutcome::Eof),
            Err(err) => Err(err.into()),
        }
    }
}

/// Plain reads from the process's stdin, for piped input. No prompt is
/// echoed. The stdin lock is only held for one line, so nested shells can
/// read too.
#[derive(Debug, Default)]
pub struct StdinInput;

impl LineReader for StdinInput {
    fn read_line(&mut self, _prompt: &str) -> Result<ReadOutcome, ShellError> {
        read_plain(|buf| std::io::stdin().read_line(buf))
    }
}

fn read_plain(
    read: impl FnOnce(&mut String) -> std::io::Result<usize>,
) -> Result<ReadOutcome, ShellError> {
    let mut line = String::new();
    if read(&mut line)? == 0 {
        return Ok(ReadOutcome::Eof);
    }
    let trimmed = line.trim_end_matches(['\n', '\r']).len();
    line.truncate(trimmed);
    Ok(ReadOutcome::Line(line))
}

/// Pre-recorded input shared by every activation that clones it.
#[derive(Clone, Default)]
pub struct ScriptedInput {
    script: Rc<RefCell<VecDeque<ReadOutcome>>>,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let input = Self::new();
        for line in lines {
            input.push_line(line);
        }
        input
    }

    pub fn push_line(&self, line: &str) {
        self.script
            .borrow_mut()
            .push_back(ReadOutcome::Line(line.to_string()));
    }

    pub fn push_interrupt(&self) {
        self.script.borrow_mut().push_back(ReadOutcome::Interrupted);
    }

    pub fn remaining(&self) -> usize {
        self.script.borrow().len()
    }
}

impl LineReader for ScriptedInput {
    fn read_line(&mut self, _prompt: &str) -> Result<ReadOutcome, ShellError> {
        Ok(self
            .script
            .borrow_mut()
            .pop_front()
            .unwrap_or(ReadOutcome::Eof))
    }
}

/// Interactive editor input with the given history file.
pub fn editor_factory(history_path: Option<PathBuf>) -> InputFactory {
    Rc::new(
        move |completer: CmdCompleter| -> Result<Box<dyn LineReader>, ShellError> {
            let input = EditorInput::new(completer, history_path.clone())?;
            Ok(Box::new(input))
        },
    )
}

/// Plain reads from the process's stdin.
pub fn stdin_factory() -> InputFactory {
    Rc::new(|_: CmdCompleter| -> Result<Box<dyn LineReader>, ShellError> {
        Ok(Box::new(StdinInput))
    })
}

/// Every activation reads from the same script.
pub fn scripted_factory(script: ScriptedInput) -> InputFactory {
    Rc::new(move |_: CmdCompleter| -> Result<Box<dyn LineReader>, ShellError> {
        Ok(Box::new(script.clone()))
    })
}
