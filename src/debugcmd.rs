//! The interactive debug shell.
//!
//! [`DebugShell`] plugs the debugger commands into [`CommandLoop`]. Every
//! line that is not a command runs as a keyword on the host.

use std::rc::Rc;

use crate::cmdloop::{print_help, CommandLoop, LoopControl, Registry, Shell, ShellError};
use crate::completer::{filter_prefix, words, ArgRequest, CmdCompleter, VocabularyEntry};
use crate::config::ShellConfig;
use crate::console::Console;
use crate::context::DebugContext;
use crate::host::{Host, KeywordDoc, LibraryInfo};
use crate::input::InputFactory;
use crate::keyword::run_command;
use crate::sourcelines::{print_source_lines, print_test_case_lines, SourceError, DEFAULT_RADIUS};

/// Printed when a shell starts with its default intro.
pub const INTRO: &str = "Only accepted plain text format keyword separated with two or more spaces.\n\
Type \"help\" for more information.";

const HELP_INTRO: &str = "Input keywords, or commands listed below.\n\
Use \"libs\" or \"ls\" to see available libraries,\n\
use \"keywords\" or \"k\" see the list of library keywords,\n\
use the TAB keyboard key to autocomplete keywords.";

const NOT_STEPPING: &str = "Please run `step` or `next` command first.";

/// Everything a shell activation needs besides the host.
#[derive(Clone)]
pub struct DebugSession {
    pub context: DebugContext,
    pub config: ShellConfig,
    pub input: InputFactory,
}

impl DebugSession {
    pub fn new(context: DebugContext, config: ShellConfig, input: InputFactory) -> Self {
        DebugSession {
            context,
            config,
            input,
        }
    }
}

pub struct DebugShell<'h> {
    host: &'h mut dyn Host,
    context: DebugContext,
    console: Console,
    registry: Rc<Registry<DebugShell<'h>>>,
}

impl<'h> DebugShell<'h> {
    pub fn new(host: &'h mut dyn Host, context: DebugContext) -> Self {
        let console = host.console();
        let library_names = host.libraries().into_iter().map(|lib| lib.name).collect();
        DebugShell {
            host,
            context,
            console,
            registry: Rc::new(commands(library_names)),
        }
    }

    /// Completer over the commands, libraries and keywords known right now.
    pub fn completer(&self) -> CmdCompleter {
        let mut vocabulary: Vec<VocabularyEntry> = self
            .registry
            .help_entries()
            .into_iter()
            .map(|(name, help)| (name.clone(), name, format!("DEBUG command: {}", help)))
            .collect();

        let libraries = self.host.libraries();
        for lib in &libraries {
            vocabulary.push((
                lib.name.clone(),
                lib.name.clone(),
                format!("Library: {} {}", lib.name, lib.version),
            ));
        }
        for lib in &libraries {
            for keyword in self.host.library_keywords(&lib.name) {
                vocabulary.push((
                    format!("{}.{}", keyword.lib, keyword.name),
                    keyword.name.clone(),
                    format!("Keyword: {}", keyword.summary()),
                ));
                vocabulary.push((
                    keyword.name.clone(),
                    keyword.name.clone(),
                    format!("Keyword[{}.]: {}", keyword.lib, keyword.summary()),
                ));
            }
        }

        CmdCompleter::new(vocabulary, self.registry.arg_completers())
            .with_color(self.console.is_color())
    }

    fn list_source(&mut self, longlist: bool) -> Result<bool, ShellError> {
        if !self.context.is_step_mode() {
            self.console.line(NOT_STEPPING);
            return Ok(false);
        }

        let position = self.context.position();
        let path = position.as_ref().map(|(path, _)| path.as_path());
        let lineno = position.as_ref().map(|(_, lineno)| *lineno).unwrap_or(0);
        let version = self.host.version().clone();
        let printed = if longlist {
            print_test_case_lines(&self.console, &version, path, lineno)
        } else {
            print_source_lines(&self.console, &version, path, lineno, DEFAULT_RADIUS)
        };

        match printed {
            Err(SourceError::NeedUpgrade { required, found }) => {
                self.console
                    .line("Please upgrade the test engine to support list source code:");
                self.console.line(&format!(
                    "    engine {} or newer is required, running {}",
                    required, found
                ));
                Ok(false)
            }
            other => other.map(|_| false).map_err(ShellError::from),
        }
    }

    fn print_library(&self, lib: &LibraryInfo, with_source: bool) {
        self.console.output(&format!("   {}", lib.name), &lib.version);
        if let Some(first) = lib.doc.lines().next().filter(|l| !l.is_empty()) {
            self.console.line(&format!("       {}", first));
        }
        if with_source {
            let source = lib
                .source
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            self.console.line(&format!("       {}", source));
        }
    }

    /// Imported libraries whose name starts with `prefix`, case-insensitive.
    fn match_libs(&self, prefix: &str) -> Vec<String> {
        let names: Vec<String> = self.host.libraries().into_iter().map(|l| l.name).collect();
        filter_prefix(names.iter().map(String::as_str), prefix)
    }

    fn find_keyword(&self, name: &str) -> Vec<KeywordDoc> {
        let wanted = name.trim().to_lowercase();
        self.host
            .libraries()
            .iter()
            .flat_map(|lib| self.host.library_keywords(&lib.name))
            .filter(|kw| kw.name.to_lowercase() == wanted)
            .collect()
    }
}

impl<'h> Shell for DebugShell<'h> {
    fn registry(&self) -> Rc<Registry<Self>> {
        Rc::clone(&self.registry)
    }

    fn console(&self) -> &Console {
        &self.console
    }

    fn default(&mut self, _control: &mut LoopControl, line: &str) -> Result<bool, ShellError> {
        run_command(&mut *self.host, &self.console, line.trim());
        Ok(false)
    }

    fn pre_loop_iter(&mut self) {
        self.host.reset_interrupt();
    }

    fn repeat_last_on_empty(&self) -> bool {
        self.context.is_step_mode()
    }

    fn on_exit_requested(&mut self, control: &mut LoopControl) {
        self.context.set_step_mode(false);
        control.push_exit();
    }

    fn load_last_command(&self) -> Option<String> {
        Some(self.context.last_command())
    }

    fn store_last_command(&mut self, command: &str) {
        self.context.set_last_command(command);
    }
}

fn commands<'h>(library_names: Vec<String>) -> Registry<DebugShell<'h>> {
    let library_completer = Rc::new(move |request: &ArgRequest<'_>| {
        filter_prefix(library_names.iter().map(String::as_str), request.text)
    });

    Registry::new()
        .command(
            "help",
            &[],
            "Show help message.\n\n  help [<command>]",
            do_help,
        )
        .command(
            "exit",
            &[],
            "Exit debug shell. You can also use the Ctrl-D shortcut.",
            do_exit,
        )
        .command(
            "step",
            &["s"],
            "Execute the current line, stop at the first possible occasion.",
            do_step,
        )
        .command(
            "next",
            &["n"],
            "Continue execution until the next line is reached or it returns.",
            do_step,
        )
        .command("continue", &["c"], "Continue execution.", do_exit)
        .command(
            "list",
            &["l"],
            "List source code for the current file.",
            do_list,
        )
        .command(
            "longlist",
            &["ll"],
            "List the whole source code for the current test case.",
            do_longlist,
        )
        .command(
            "libs",
            &["ls"],
            "Print imported and builtin libraries, with source if `-s` specified.\n\n  ls( libs ) [-s]",
            do_libs,
        )
        .completed_by(words(&["-s"]))
        .command(
            "keywords",
            &["k"],
            "Print keywords of libraries, all or starts with <lib_name>.\n\n  k(eywords) [<lib_name>]",
            do_keywords,
        )
        .completed_by(library_completer)
        .command(
            "docs",
            &["d"],
            "Get keyword documentation for individual keywords.\n\n  d(ocs) [<keyword_name>]",
            do_docs,
        )
}

fn do_help(shell: &mut DebugShell<'_>, _: &mut LoopControl, arg: &str) -> Result<bool, ShellError> {
    if arg.trim().is_empty() {
        shell.console.line(HELP_INTRO);
    }
    print_help(&shell.console, &shell.registry, arg);
    Ok(false)
}

/// Leave the shell and stop stepping.
fn do_exit(shell: &mut DebugShell<'_>, control: &mut LoopControl, _: &str) -> Result<bool, ShellError> {
    shell.context.set_step_mode(false);
    control.push_exit();
    Ok(true)
}

/// Hand control back to the engine with step mode on, so the listener
/// breaks again at the next keyword.
fn do_step(shell: &mut DebugShell<'_>, control: &mut LoopControl, _: &str) -> Result<bool, ShellError> {
    shell.context.set_step_mode(true);
    control.push_exit();
    Ok(false)
}

fn do_list(shell: &mut DebugShell<'_>, _: &mut LoopControl, _: &str) -> Result<bool, ShellError> {
    shell.list_source(false)
}

fn do_longlist(shell: &mut DebugShell<'_>, _: &mut LoopControl, _: &str) -> Result<bool, ShellError> {
    shell.list_source(true)
}

fn do_libs(shell: &mut DebugShell<'_>, _: &mut LoopControl, arg: &str) -> Result<bool, ShellError> {
    let with_source = arg.split_whitespace().any(|a| a == "-s");
    shell.console.output("<", "Imported libraries:");
    for lib in shell.host.libraries() {
        shell.print_library(&lib, with_source);
    }
    shell.console.output("<", "Builtin libraries:");
    let mut builtin = shell.host.builtin_libraries();
    builtin.sort();
    for name in builtin {
        shell.console.output(&format!("   {}", name), "");
    }
    Ok(false)
}

fn do_keywords(shell: &mut DebugShell<'_>, _: &mut LoopControl, arg: &str) -> Result<bool, ShellError> {
    let lib_name = arg.trim();
    let matched = shell.match_libs(lib_name);
    if matched.is_empty() {
        shell.console.error("< not found library", lib_name);
        return Ok(false);
    }
    for name in matched {
        shell.console.output("< Keywords of library", &name);
        for keyword in shell.host.library_keywords(&name) {
            shell
                .console
                .output(&format!("   {}\t", keyword.name), keyword.summary());
        }
    }
    Ok(false)
}

fn do_docs(shell: &mut DebugShell<'_>, _: &mut LoopControl, arg: &str) -> Result<bool, ShellError> {
    let keywords = shell.find_keyword(arg);
    match keywords.as_slice() {
        [] => shell.console.error("< not find keyword", arg.trim()),
        [keyword] => shell.console.line(&keyword.doc),
        many => {
            let names: Vec<String> = many
                .iter()
                .map(|kw| format!("{}.{}", kw.lib, kw.name))
                .collect();
            shell
                .console
                .error(&format!("< found {} keywords", many.len()), &names.join(", "));
        }
    }
    Ok(false)
}

/// Run one shell activation on `host` until it stops. `intro` follows
/// [`CommandLoop::cmdloop`].
pub fn run_shell(
    host: &mut dyn Host,
    session: &DebugSession,
    intro: Option<&str>,
) -> Result<(), ShellError> {
    let shell = DebugShell::new(host, session.context.clone());
    let input = (session.input)(shell.completer())?;
    let mut cmd = CommandLoop::new(shell, input, &session.config.prompt).with_intro(INTRO);
    cmd.cmdloop(intro);
    Ok(())
}
