//! Pass-through execution of keyword lines typed into the shell.

use crate::console::Console;
use crate::host::{Host, HostError, Value};

/// Keyword used to echo a bare variable.
const LOG_TO_CONSOLE: &str = "Log To Console";

/// Split a keyword line into cells.
///
/// Cells are separated by two or more spaces or by a single tab, the same
/// separator suite files use.
pub fn parse_keyword(command: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = command.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\t' => cells.push(std::mem::take(&mut current)),
            ' ' if chars.peek() == Some(&' ') => {
                while chars.peek() == Some(&' ') {
                    chars.next();
                }
                cells.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    cells.push(current);
    cells
}

/// What the shell echoes after a successful keyword line.
#[derive(Debug, Clone, PartialEq)]
pub struct Echo {
    pub head: &'static str,
    pub message: String,
}

/// Run one keyword line.
///
/// - `# ...` is a comment and does nothing.
/// - `${x}` alone logs the variable's value to the console.
/// - `${x} =  Keyword  args` runs the keyword and assigns its result.
/// - anything else runs as `Keyword  args`.
pub fn run_keyword(host: &mut dyn Host, line: &str) -> Result<Option<Echo>, HostError> {
    if line.is_empty() {
        return Ok(None);
    }

    let mut cells = parse_keyword(line);
    let keyword = cells.remove(0);
    let args = cells;

    if keyword.trim_start().starts_with('#') {
        return Ok(None);
    }

    let variable_name = keyword.trim_end_matches(|c: char| c == '=' || c == ' ');
    if host.is_variable(variable_name) {
        if args.is_empty() {
            host.run_keyword(LOG_TO_CONSOLE, &[variable_name.to_string()])?;
            return Ok(None);
        }
        let value = host.run_keyword(&args[0], &args[1..])?;
        host.set_variable(variable_name, value.clone())?;
        return Ok(Some(Echo {
            head: "#",
            message: format!("{} = {}", variable_name, repr(&value)),
        }));
    }

    let output = host.run_keyword(&keyword, &args)?;
    if is_truthy(&output) {
        Ok(Some(Echo {
            head: "<",
            message: repr(&output),
        }))
    } else {
        Ok(None)
    }
}

/// Run a keyword line and report the outcome on the console. Failures are
/// printed, never returned.
pub fn run_command(host: &mut dyn Host, console: &Console, command: &str) {
    if command.is_empty() {
        return;
    }

    match run_keyword(host, command) {
        Ok(Some(echo)) => console.output(echo.head, &echo.message),
        Ok(None) => {}
        Err(err) => {
            console.error("! keyword:", command);
            match err {
                HostError::HandlerFailed(msg) => console.error("! handler execution failed:", &msg),
                HostError::ExecutionFailed(msg) => console.error("! execution failed:", &msg),
                other => console.error("! FAILED:", &other.to_string()),
            }
        }
    }
}

/// Display form of a keyword result: strings quoted, everything else as JSON.
pub fn repr(value: &Value) -> String {
    value.to_string()
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
