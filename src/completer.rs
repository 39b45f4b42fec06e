//! Tab completion for the debug shell.
//!
//! Completion has two modes. While the text is a single cell it completes
//! command and keyword names from a fixed vocabulary. Once a separator
//! follows the first cell, the first cell names a command and the command's
//! own argument completer proposes values for the word under the cursor.

use std::borrow::Cow;
use std::collections::HashMap;
use std::rc::Rc;

use rustyline::completion::{Candidate, Completer};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::Helper;

use crate::cmdloop::ArgCompleter;
use crate::keyword::parse_keyword;

const PROMPT_COLOR: &str = "\x1b[34m";
const RESET: &str = "\x1b[0m";

/// One proposal.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    /// Offset from the cursor where the replaced text starts. Never positive.
    pub start_position: isize,
    pub display: String,
    pub display_meta: String,
    listing: String,
}

impl Completion {
    pub fn new(text: &str, start_position: isize, display: &str, display_meta: &str) -> Self {
        let listing = if display_meta.is_empty() {
            display.to_string()
        } else {
            format!("{}  {}", display, display_meta)
        };
        Completion {
            text: text.to_string(),
            start_position,
            display: display.to_string(),
            display_meta: display_meta.to_string(),
            listing,
        }
    }
}

impl Candidate for Completion {
    fn display(&self) -> &str {
        &self.listing
    }

    fn replacement(&self) -> &str {
        &self.text
    }
}

/// What an argument completer is asked to complete.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgRequest<'a> {
    /// The word under the cursor.
    pub text: &'a str,
    /// The whole current line.
    pub line: &'a str,
    /// Byte range of `text` within `line`.
    pub begin: usize,
    pub end: usize,
}

/// Completion vocabulary entry: `(name, display, meta)`.
pub type VocabularyEntry = (String, String, String);

#[derive(Clone, Default)]
pub struct CmdCompleter {
    names: Vec<String>,
    displays: HashMap<String, String>,
    display_metas: HashMap<String, String>,
    arg_completers: HashMap<String, ArgCompleter>,
    color: bool,
}

impl CmdCompleter {
    pub fn new(
        vocabulary: impl IntoIterator<Item = VocabularyEntry>,
        arg_completers: HashMap<String, ArgCompleter>,
    ) -> Self {
        let mut completer = CmdCompleter {
            arg_completers,
            ..Self::default()
        };
        for (name, display, meta) in vocabulary {
            if !completer.displays.contains_key(&name) {
                completer.names.push(name.clone());
            }
            completer.displays.insert(name.clone(), display);
            completer.display_metas.insert(name, meta);
        }
        completer
    }

    /// Render the prompt in color.
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Proposals for `text_before_cursor`, in vocabulary order.
    pub fn get_completions<'a>(
        &'a self,
        text_before_cursor: &str,
    ) -> Box<dyn Iterator<Item = Completion> + 'a> {
        let text = text_before_cursor.to_lowercase();
        let parts = parse_keyword(&text);
        if parts.len() >= 2 {
            let command = parts[0].trim().to_string();
            return Box::new(
                self.argument_completions(&command, text_before_cursor)
                    .into_iter(),
            );
        }
        let start_position = -(text_before_cursor.chars().count() as isize);
        Box::new(self.name_completions(text, start_position))
    }

    fn name_completions(
        &self,
        text: String,
        start_position: isize,
    ) -> impl Iterator<Item = Completion> + '_ {
        let wanted = text.trim().to_string();
        let dotted = wanted.contains('.');
        self.names
            .iter()
            .filter(move |name| {
                name.to_lowercase().trim().starts_with(wanted.as_str())
                    && name.contains('.') == dotted
            })
            .map(move |name| {
                Completion::new(
                    name,
                    start_position,
                    self.displays.get(name).map(String::as_str).unwrap_or(name.as_str()),
                    self.display_metas.get(name).map(String::as_str).unwrap_or(""),
                )
            })
    }

    fn argument_completions(&self, command: &str, text_before_cursor: &str) -> Vec<Completion> {
        let Some(complete) = self.arg_completers.get(command) else {
            return Vec::new();
        };

        let line = text_before_cursor.rsplit('\n').next().unwrap_or("");
        let end = line.len();
        let begin = line.rfind(' ').map(|i| i + 1).unwrap_or(0);
        let request = ArgRequest {
            text: &line[begin..end],
            line,
            begin,
            end,
        };
        let start_position = -(line[begin..end].chars().count() as isize);

        complete(&request)
            .into_iter()
            .map(|text| Completion::new(&text, start_position, &text, ""))
            .collect()
    }
}

/// Keep the names matching `prefix` case-insensitively.
pub fn filter_prefix<'a>(names: impl IntoIterator<Item = &'a str>, prefix: &str) -> Vec<String> {
    let prefix = prefix.to_lowercase();
    names
        .into_iter()
        .filter(|name| name.to_lowercase().starts_with(&prefix))
        .map(String::from)
        .collect()
}

impl Helper for CmdCompleter {}

impl Completer for CmdCompleter {
    type Candidate = Completion;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Completion>)> {
        let before = &line[..pos];
        let candidates: Vec<Completion> = self.get_completions(before).collect();
        let back = candidates
            .first()
            .map(|c| c.start_position.unsigned_abs())
            .unwrap_or(0);
        let start = before
            .char_indices()
            .rev()
            .take(back)
            .last()
            .map(|(i, _)| i)
            .unwrap_or(pos);
        Ok((start, candidates))
    }
}

impl Hinter for CmdCompleter {
    type Hint = String;
}

impl Highlighter for CmdCompleter {
    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        _default: bool,
    ) -> Cow<'b, str> {
        if self.color {
            Cow::Owned(format!("{}{}{}", PROMPT_COLOR, prompt, RESET))
        } else {
            Cow::Borrowed(prompt)
        }
    }
}

impl Validator for CmdCompleter {}

/// Completer of a fixed set of words.
pub fn words(choices: &'static [&'static str]) -> ArgCompleter {
    Rc::new(move |request: &ArgRequest<'_>| filter_prefix(choices.iter().copied(), request.text))
}
