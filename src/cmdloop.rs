//! Line-oriented command loop.
//!
//! A [`CommandLoop`] owns one shell activation: its pending command queue,
//! its last command and its input source. Each iteration takes the next
//! queued line (or reads one), resolves the first word against the shell's
//! [`Registry`] and falls back to [`Shell::default`] for anything else.
//!
//! Activations nest by plain recursion: a handler may end up constructing
//! and running another `CommandLoop`, and stopping the inner one only ever
//! returns to the frame that started it.

use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use thiserror::Error;

use crate::completer::ArgRequest;
use crate::console::Console;
use crate::host::HostError;
use crate::input::{LineReader, ReadOutcome};
use crate::sourcelines::SourceError;

/// Control token that ends the current activation.
pub const EXIT: &str = "exit";

/// End-of-input sentinel. Never dispatched to a handler.
pub const END_OF_INPUT: &str = "EOF";

#[derive(Error, Debug)]
pub enum ShellError {
    #[error("{0}")]
    Source(#[from] SourceError),
    #[error("{0}")]
    Host(#[from] HostError),
    #[error("readline: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Handler of a named command. Returns `true` to stop the loop.
pub type Handler<S> = fn(&mut S, &mut LoopControl, &str) -> Result<bool, ShellError>;

/// Argument completion hook of a command.
pub type ArgCompleter = Rc<dyn Fn(&ArgRequest<'_>) -> Vec<String>>;

pub struct Command<S> {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub help: &'static str,
    pub handler: Handler<S>,
    pub completer: Option<ArgCompleter>,
}

/// Commands of a shell, in declaration order.
pub struct Registry<S> {
    commands: Vec<Command<S>>,
}

impl<S> Registry<S> {
    pub fn new() -> Self {
        Registry {
            commands: Vec::new(),
        }
    }

    pub fn command(
        mut self,
        name: &'static str,
        aliases: &'static [&'static str],
        help: &'static str,
        handler: Handler<S>,
    ) -> Self {
        self.commands.push(Command {
            name,
            aliases,
            help,
            handler,
            completer: None,
        });
        self
    }

    /// Attach an argument completer to the command declared last.
    pub fn completed_by(mut self, completer: ArgCompleter) -> Self {
        if let Some(last) = self.commands.last_mut() {
            last.completer = Some(completer);
        }
        self
    }

    /// Exact, case-sensitive match on a name or alias.
    pub fn lookup(&self, name: &str) -> Option<&Command<S>> {
        self.commands
            .iter()
            .find(|c| c.name == name || c.aliases.contains(&name))
    }

    pub fn commands(&self) -> &[Command<S>] {
        &self.commands
    }

    /// Every name and alias with the help of its command, in declaration
    /// order.
    pub fn help_entries(&self) -> Vec<(String, String)> {
        self.commands
            .iter()
            .flat_map(|c| {
                std::iter::once(c.name)
                    .chain(c.aliases.iter().copied())
                    .map(move |name| (name.to_string(), first_line(c.help).to_string()))
            })
            .collect()
    }

    /// Argument completers keyed by every name and alias.
    pub fn arg_completers(&self) -> HashMap<String, ArgCompleter> {
        let mut map = HashMap::new();
        for command in &self.commands {
            if let Some(completer) = &command.completer {
                for name in std::iter::once(command.name).chain(command.aliases.iter().copied()) {
                    map.insert(name.to_string(), Rc::clone(completer));
                }
            }
        }
        map
    }
}

impl<S> Default for Registry<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-activation loop data handed to handlers.
#[derive(Debug, Default)]
pub struct LoopControl {
    queue: VecDeque<String>,
    pub last_command: String,
}

impl LoopControl {
    /// Queue a command to run before any new input is read.
    pub fn push_command(&mut self, command: &str) {
        self.queue.push_back(command.to_string());
    }

    /// Queue the control token that ends this activation.
    pub fn push_exit(&mut self) {
        self.push_command(EXIT);
    }

    pub fn pop_command(&mut self) -> Option<String> {
        self.queue.pop_front()
    }
}

/// Hooks a shell plugs into [`CommandLoop`].
pub trait Shell: Sized {
    fn registry(&self) -> Rc<Registry<Self>>;

    fn console(&self) -> &Console;

    /// Called for lines whose first word is not a command.
    fn default(&mut self, control: &mut LoopControl, line: &str) -> Result<bool, ShellError>;

    fn preloop(&mut self) {}

    fn postloop(&mut self) {}

    /// Runs before every input is taken.
    fn pre_loop_iter(&mut self) {}

    fn precmd(&mut self, line: String) -> String {
        line
    }

    fn postcmd(&mut self, stop: bool, _line: &str) -> bool {
        stop
    }

    /// Whether an empty line re-runs the last non-empty command.
    fn repeat_last_on_empty(&self) -> bool {
        false
    }

    /// The operator typed `exit` or closed the input.
    fn on_exit_requested(&mut self, _control: &mut LoopControl) {}

    /// Last command to restore before dispatching a line.
    fn load_last_command(&self) -> Option<String> {
        None
    }

    /// Called with the last command after dispatching a line.
    fn store_last_command(&mut self, _command: &str) {}
}

enum Origin {
    Queued,
    Interactive,
}

/// One activation of a shell.
pub struct CommandLoop<S: Shell> {
    shell: S,
    input: Box<dyn LineReader>,
    control: LoopControl,
    prompt: String,
    intro: Option<String>,
}

impl<S: Shell> CommandLoop<S> {
    pub fn new(shell: S, input: Box<dyn LineReader>, prompt: &str) -> Self {
        CommandLoop {
            shell,
            input,
            control: LoopControl::default(),
            prompt: prompt.to_string(),
            intro: None,
        }
    }

    /// Intro printed by [`cmdloop`](Self::cmdloop) when none is passed.
    pub fn with_intro(mut self, intro: &str) -> Self {
        self.intro = Some(intro.to_string());
        self
    }

    pub fn shell(&self) -> &S {
        &self.shell
    }

    pub fn into_shell(self) -> S {
        self.shell
    }

    /// Run until a handler asks to stop or input ends. `Some("")`
    /// suppresses the intro.
    pub fn cmdloop(&mut self, intro: Option<&str>) {
        if let Some(intro) = intro {
            self.intro = Some(intro.to_string());
        }
        if let Some(intro) = self.intro.as_deref().filter(|i| !i.is_empty()) {
            self.shell.console().line(intro);
        }

        self.shell.preloop();
        while !self.loop_once() {}
        self.shell.postloop();
    }

    /// One iteration. Returns the stop signal.
    pub fn loop_once(&mut self) -> bool {
        self.shell.pre_loop_iter();

        let Some((line, origin)) = self.next_line() else {
            return false;
        };
        let line = if line == EXIT {
            END_OF_INPUT.to_string()
        } else {
            line
        };

        let line = self.shell.precmd(line);
        let stop = if line == END_OF_INPUT {
            if let Origin::Interactive = origin {
                self.shell.on_exit_requested(&mut self.control);
            }
            true
        } else {
            self.onecmd(&line)
        };
        self.shell.postcmd(stop, &line)
    }

    /// Dispatch a single line, restoring and saving the shell's last
    /// command around it.
    pub fn onecmd(&mut self, line: &str) -> bool {
        if let Some(last) = self.shell.load_last_command() {
            self.control.last_command = last;
        }
        let stop = self.dispatch(line);
        let last = self.control.last_command.clone();
        self.shell.store_last_command(&last);
        stop
    }

    fn next_line(&mut self) -> Option<(String, Origin)> {
        if let Some(line) = self.control.pop_command() {
            return Some((line, Origin::Queued));
        }
        match self.input.read_line(&self.prompt) {
            Ok(ReadOutcome::Line(line)) => Some((line, Origin::Interactive)),
            Ok(ReadOutcome::Eof) => Some((END_OF_INPUT.to_string(), Origin::Interactive)),
            Ok(ReadOutcome::Interrupted) => None,
            Err(err) => {
                tracing::warn!(error = %err, "input source failed, closing shell");
                Some((END_OF_INPUT.to_string(), Origin::Interactive))
            }
        }
    }

    fn dispatch(&mut self, line: &str) -> bool {
        let line = line.trim();
        if line.is_empty() {
            return self.emptyline();
        }
        self.control.last_command = line.to_string();

        let (name, arg) = split_command(line);
        let registry = self.shell.registry();
        let result = match registry.lookup(name) {
            Some(command) => (command.handler)(&mut self.shell, &mut self.control, arg),
            None => self.shell.default(&mut self.control, line),
        };

        match result {
            Ok(stop) => stop,
            Err(err) => {
                self.shell.console().error("! FAILED:", &err.to_string());
                false
            }
        }
    }

    fn emptyline(&mut self) -> bool {
        if !self.shell.repeat_last_on_empty() || self.control.last_command.is_empty() {
            return false;
        }
        let last = self.control.last_command.clone();
        self.dispatch(&last)
    }
}

/// Split `line` into the first whitespace-delimited word and the rest.
pub fn split_command(line: &str) -> (&str, &str) {
    match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim_start()),
        None => (line, ""),
    }
}

/// Print the command list, or the help of one command.
pub fn print_help<S>(console: &Console, registry: &Registry<S>, arg: &str) {
    let topic = arg.trim();
    if !topic.is_empty() {
        match registry.lookup(topic) {
            Some(command) => console.line(command.help),
            None => console.line(&format!("*** No help on {}", topic)),
        }
        return;
    }

    console.line("");
    console.line("Documented commands (type help <topic>):");
    console.line("========================================");
    for command in registry.commands() {
        let mut names = vec![command.name];
        names.extend(command.aliases.iter().copied());
        console.line(&format!(
            "{:<18} {}",
            names.join(", "),
            first_line(command.help)
        ));
    }
    console.line("");
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}
