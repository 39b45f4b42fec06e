//! kwdebug - step debugger and interactive shell for keyword-driven suites
//!
//! Usage:
//!   kwdebug                   Open an interactive shell
//!   kwdebug suite.robot ...   Run suites; `Debug` keywords open the shell

mod cli;

use std::env;
use std::process::ExitCode;

fn main() -> ExitCode {
    kwdebug::logging::init_logging();

    let args: Vec<String> = env::args().collect();
    let cli = cli::parse_args(&args);
    cli::run(cli)
}
