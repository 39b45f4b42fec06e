use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use kwdebug::engine::{parse_suite, return_code, Engine, SuiteResult, DEFAULT_VERSION};
use kwdebug::input::{editor_factory, stdin_factory};
use kwdebug::library::{DebugLibrary, DEBUG_KEYWORD, LIBRARY_NAME};
use kwdebug::signals::install_interrupt_handler;
use kwdebug::{Console, DebugContext, DebugSession, ShellConfig};
use semver::Version;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Return code for invalid suites or arguments.
const DATA_ERROR: u8 = 252;

/// Parsed command-line arguments
pub(crate) struct CliArgs {
    pub(crate) help: bool,
    pub(crate) version: bool,
    pub(crate) engine_version: Option<String>,
    pub(crate) suites: Vec<PathBuf>,
    pub(crate) error: Option<String>,
}

/// Parse command-line arguments
pub(crate) fn parse_args(args: &[String]) -> CliArgs {
    let mut cli = CliArgs {
        help: false,
        version: false,
        engine_version: None,
        suites: Vec::new(),
        error: None,
    };

    let mut i = 1; // Skip program name
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                cli.help = true;
            }
            "--version" | "-V" => {
                cli.version = true;
            }
            "--engine-version" => {
                i += 1;
                match args.get(i) {
                    Some(value) => cli.engine_version = Some(value.clone()),
                    None => cli.error = Some("--engine-version requires a value".into()),
                }
            }
            arg if arg.starts_with("--engine-version=") => {
                cli.engine_version = Some(arg["--engine-version=".len()..].to_string());
            }
            arg if arg.starts_with('-') => {
                cli.error = Some(format!("unknown option: {}", arg));
            }
            path => cli.suites.push(PathBuf::from(path)),
        }
        i += 1;
    }

    cli
}

/// `4`, `3.2` and `3.2.1` are all accepted.
pub(crate) fn parse_engine_version(raw: &str) -> Result<Version, String> {
    let mut parts: Vec<&str> = raw.trim().split('.').collect();
    if parts.is_empty() || parts.len() > 3 {
        return Err(format!("invalid engine version: {}", raw));
    }
    while parts.len() < 3 {
        parts.push("0");
    }
    Version::parse(&parts.join(".")).map_err(|e| format!("invalid engine version {}: {}", raw, e))
}

pub(crate) fn print_help() {
    println!(
        r#"kwdebug-{} - Step debugger and interactive shell for keyword-driven test suites

USAGE:
    kwdebug                         Open an interactive shell
    kwdebug <suite>...              Run suites; a `Debug` keyword opens the shell
    kwdebug --engine-version <X.Y>  Emulate an older engine (listing needs 3.2+)
    kwdebug --help                  Show this help message
    kwdebug --version               Show version

SHELL COMMANDS:
    help [<command>]                Show help
    step, s / next, n               Run the current keyword, stop at the next one
    continue, c                     Continue execution
    list, l / longlist, ll          Show source around the current keyword
    libs, ls [-s]                   Show imported and available libraries
    keywords, k [<lib>]             Show keywords of libraries
    docs, d <keyword>               Show keyword documentation
    exit / Ctrl-D                   Leave the shell

    Anything else runs as a keyword, cells separated by two spaces:
    > log to console  hello
    > ${{now}} =  get time  epoch

ENVIRONMENT:
    KWDEBUG_HISTORY                 History file (default ~/.kwdebug_history)
    KWDEBUG_LOG                     Diagnostic log filter (default warn)
    NO_COLOR                        Disable colored output"#,
        VERSION
    );
}

pub(crate) fn print_version() {
    println!("kwdebug {}", VERSION);
}

/// Suite run when no suite is given: one test that opens the shell.
fn standalone_suite() -> String {
    format!(
        "*** Settings ***\nLibrary    {}\n\n*** Test Cases ***\nDebug Shell\n    {}\n",
        LIBRARY_NAME, DEBUG_KEYWORD
    )
}

fn run_standalone(engine: &mut Engine) -> io::Result<SuiteResult> {
    let mut file = tempfile::Builder::new()
        .prefix("kwdebug_")
        .suffix(".robot")
        .tempfile()?;
    file.write_all(standalone_suite().as_bytes())?;
    file.flush()?;

    let suite = parse_suite("Kwdebug Shell", Some(file.path()), &standalone_suite())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
    Ok(engine.run_suite(&suite))
}

fn run_suites(engine: &mut Engine, paths: &[PathBuf]) -> Result<Vec<SuiteResult>, String> {
    let mut results = Vec::new();
    for path in paths {
        let result = engine
            .run_suite_file(Path::new(path))
            .map_err(|e| e.to_string())?;
        results.push(result);
    }
    Ok(results)
}

/// Run the binary with parsed arguments.
pub(crate) fn run(cli: CliArgs) -> ExitCode {
    if let Some(error) = cli.error {
        eprintln!("kwdebug: {}", error);
        eprintln!("Try 'kwdebug --help' for more information.");
        return ExitCode::from(DATA_ERROR);
    }
    if cli.help {
        print_help();
        return ExitCode::SUCCESS;
    }
    if cli.version {
        print_version();
        return ExitCode::SUCCESS;
    }

    let version = match cli.engine_version.as_deref().map(parse_engine_version) {
        None => DEFAULT_VERSION,
        Some(Ok(version)) => version,
        Some(Err(error)) => {
            eprintln!("kwdebug: {}", error);
            return ExitCode::from(DATA_ERROR);
        }
    };

    let interrupt = Arc::new(AtomicBool::new(false));
    if let Err(err) = install_interrupt_handler(Arc::clone(&interrupt)) {
        tracing::warn!(error = %err, "cannot install interrupt handler");
    }

    let config = ShellConfig::from_env();
    let input = if io::stdin().is_terminal() {
        editor_factory(config.history_path.clone())
    } else {
        stdin_factory()
    };
    let session = DebugSession::new(DebugContext::new(), config, input);

    let mut engine = Engine::new(version.clone(), Console::stdout()).with_interrupt(interrupt);
    engine.register_library(Rc::new(DebugLibrary::new(session)));
    tracing::debug!(engine = %version, suites = cli.suites.len(), "starting");

    let results = if cli.suites.is_empty() {
        match run_standalone(&mut engine) {
            Ok(result) => vec![result],
            Err(err) => {
                eprintln!("kwdebug: cannot create standalone suite: {}", err);
                return ExitCode::from(DATA_ERROR);
            }
        }
    } else {
        match run_suites(&mut engine, &cli.suites) {
            Ok(results) => results,
            Err(err) => {
                eprintln!("[ ERROR ] {}", err);
                return ExitCode::from(DATA_ERROR);
            }
        }
    };

    ExitCode::from(return_code(&results) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("kwdebug")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_suites_and_version() {
        let cli = parse_args(&args(&["--engine-version", "3.1", "a.robot", "b.robot"]));
        assert_eq!(cli.engine_version.as_deref(), Some("3.1"));
        assert_eq!(cli.suites, vec![PathBuf::from("a.robot"), PathBuf::from("b.robot")]);
        assert!(cli.error.is_none());
    }

    #[test]
    fn test_parse_flags() {
        assert!(parse_args(&args(&["-h"])).help);
        assert!(parse_args(&args(&["--version"])).version);
        let cli = parse_args(&args(&["--engine-version=4"]));
        assert_eq!(cli.engine_version.as_deref(), Some("4"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_args(&args(&["--bogus"])).error.is_some());
        assert!(parse_args(&args(&["--engine-version"])).error.is_some());
    }

    #[test]
    fn test_engine_version_padding() {
        assert_eq!(parse_engine_version("3.2").unwrap(), Version::new(3, 2, 0));
        assert_eq!(parse_engine_version("4").unwrap(), Version::new(4, 0, 0));
        assert_eq!(parse_engine_version("3.2.1").unwrap(), Version::new(3, 2, 1));
        assert!(parse_engine_version("three").is_err());
        assert!(parse_engine_version("1.2.3.4").is_err());
    }

    #[test]
    fn test_standalone_suite_opens_shell() {
        let suite = parse_suite("S", None, &standalone_suite()).unwrap();
        assert_eq!(suite.libraries, vec![LIBRARY_NAME]);
        assert_eq!(suite.tests[0].steps[0].keyword, DEBUG_KEYWORD);
    }
}
