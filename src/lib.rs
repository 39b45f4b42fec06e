//! kwdebug - step debugger for keyword-driven test suites
//!
//! # Overview
//!
//! kwdebug pauses a running test suite and opens an interactive shell in
//! which the operator can run keywords, inspect and assign variables, and
//! step through the suite one keyword at a time.
//!
//! # Pieces
//!
//! - [`cmdloop`]: a line-oriented command loop with a command queue, history
//!   and completion. Activations nest by recursion.
//! - [`completer`]: command, library and keyword name completion.
//! - [`listener`]: a [`Listener`] that, while stepping, locates the current
//!   step on the engine's execution stack, prints it and re-enters the shell.
//! - [`context`]: the state every shell activation shares.
//! - [`sourcelines`]: the `list` and `longlist` source views.
//! - [`engine`]: a small keyword-driven engine implementing [`Host`].
//!
//! # Shell
//!
//! ```text
//! > log to console  hello
//! hello
//! > ${now} =  get time  epoch
//! # ${now} = 1700000000
//! > step
//! > /path/to/suite.robot(12)
//! -> Should Be Equal    ${now}    1
//! => BuiltIn.Should Be Equal  ${now}  1
//! > list
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::rc::Rc;
//! use kwdebug::engine::{parse_suite, Engine, DEFAULT_VERSION};
//! use kwdebug::input::{scripted_factory, ScriptedInput};
//! use kwdebug::library::DebugLibrary;
//! use kwdebug::{Console, DebugContext, DebugSession, ShellConfig};
//!
//! let (console, output) = Console::buffer();
//! let script = ScriptedInput::from_lines(["log to console  hello", "exit"]);
//! let session = DebugSession::new(
//!     DebugContext::new(),
//!     ShellConfig::ephemeral(),
//!     scripted_factory(script),
//! );
//!
//! let mut engine = Engine::new(DEFAULT_VERSION, console);
//! engine.register_library(Rc::new(DebugLibrary::new(session)));
//! let suite = parse_suite(
//!     "Demo",
//!     None,
//!     "*** Settings ***\nLibrary    DebugLibrary\n\n*** Test Cases ***\nT\n    Debug\n",
//! )
//! .unwrap();
//! engine.run_suite(&suite);
//! assert!(output.contents().contains("hello"));
//! ```

pub mod cmdloop;
pub mod completer;
pub mod config;
pub mod console;
pub mod context;
pub mod debugcmd;
pub mod engine;
pub mod host;
pub mod input;
pub mod keyword;
pub mod library;
pub mod listener;
pub mod logging;
pub mod probe;
pub mod signals;
pub mod sourcelines;

// Re-export commonly used items
pub use cmdloop::{CommandLoop, LoopControl, Registry, Shell, ShellError};
pub use completer::{CmdCompleter, Completion};
pub use config::ShellConfig;
pub use console::{CapturedOutput, Console};
pub use context::{DebugContext, DebugState};
pub use debugcmd::{run_shell, DebugSession, DebugShell};
pub use host::{Host, HostError, KeywordEvent, Listener, Value};
pub use library::DebugLibrary;
pub use listener::StepListener;
pub use probe::{probe_for, ExecutionProbe, RunProbe, RunStepsProbe};
pub use sourcelines::SourceError;
