//! The always-imported `BuiltIn` library.

use std::time::Duration;

use chrono::Local;

use super::variables::{is_variable, stringify};
use super::{Engine, Library};
use crate::host::{Host, HostError, KeywordDoc, Value};

pub const NAME: &str = "BuiltIn";

type Handler = fn(&mut Engine, Vec<Value>) -> Result<Value, HostError>;

struct Keyword {
    name: &'static str,
    doc: &'static str,
    /// Accepted argument counts, `None` for no upper bound.
    args: (usize, Option<usize>),
    handler: Handler,
}

const KEYWORDS: &[Keyword] = &[
    Keyword {
        name: "Log To Console",
        doc: "Logs the given message to the console.",
        args: (1, Some(1)),
        handler: log_to_console,
    },
    Keyword {
        name: "Log",
        doc: "Logs the given message with the given level.\n\nLevel is one of TRACE, DEBUG, INFO (default) and WARN.",
        args: (1, Some(2)),
        handler: log,
    },
    Keyword {
        name: "No Operation",
        doc: "Does absolutely nothing.",
        args: (0, Some(0)),
        handler: no_operation,
    },
    Keyword {
        name: "Set Variable",
        doc: "Returns the given values which can then be assigned to variables.",
        args: (0, None),
        handler: set_variable,
    },
    Keyword {
        name: "Get Variable Value",
        doc: "Returns variable value or `default` if the variable does not exist.",
        args: (1, Some(2)),
        handler: get_variable_value,
    },
    Keyword {
        name: "Get Time",
        doc: "Returns the current time.\n\n`epoch` returns seconds since the epoch, anything else a `YYYY-MM-DD hh:mm:ss` timestamp.",
        args: (0, Some(1)),
        handler: get_time,
    },
    Keyword {
        name: "Catenate",
        doc: "Catenates the given items together and returns the resulted string.\n\nItems are separated by a space unless the first is `SEPARATOR=<sep>`.",
        args: (0, None),
        handler: catenate,
    },
    Keyword {
        name: "Should Be Equal",
        doc: "Fails if the given objects are unequal.",
        args: (2, Some(3)),
        handler: should_be_equal,
    },
    Keyword {
        name: "Should Contain",
        doc: "Fails if `container` does not contain `item` one or more times.",
        args: (2, Some(3)),
        handler: should_contain,
    },
    Keyword {
        name: "Convert To Integer",
        doc: "Converts the given item to an integer number.",
        args: (1, Some(1)),
        handler: convert_to_integer,
    },
    Keyword {
        name: "Get Length",
        doc: "Returns and logs the length of the given item as an integer.",
        args: (1, Some(1)),
        handler: get_length,
    },
    Keyword {
        name: "Fail",
        doc: "Fails the test with the given message.",
        args: (0, Some(1)),
        handler: fail,
    },
    Keyword {
        name: "Sleep",
        doc: "Pauses the test executed for the given time.\n\nTime is seconds, optionally with an `s` or `ms` suffix.",
        args: (1, Some(1)),
        handler: sleep,
    },
    Keyword {
        name: "Run Keyword",
        doc: "Executes the given keyword with the given arguments.",
        args: (1, None),
        handler: run_keyword,
    },
];

#[derive(Debug, Default)]
pub struct BuiltIn;

impl Library for BuiltIn {
    fn name(&self) -> &str {
        NAME
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn doc(&self) -> &str {
        "An always available standard library with often needed keywords."
    }

    fn keywords(&self) -> Vec<KeywordDoc> {
        KEYWORDS
            .iter()
            .map(|kw| KeywordDoc {
                name: kw.name.to_string(),
                lib: NAME.to_string(),
                doc: kw.doc.to_string(),
            })
            .collect()
    }

    fn run(&self, engine: &mut Engine, keyword: &str, args: Vec<Value>) -> Result<Value, HostError> {
        let kw = KEYWORDS
            .iter()
            .find(|kw| kw.name == keyword)
            .ok_or_else(|| HostError::ExecutionFailed(format!("No keyword with name '{}' found.", keyword)))?;
        check_args(kw, args.len())?;
        (kw.handler)(engine, args)
    }
}

fn check_args(kw: &Keyword, got: usize) -> Result<(), HostError> {
    let (min, max) = kw.args;
    if got >= min && max.map_or(true, |max| got <= max) {
        return Ok(());
    }
    let expected = match max {
        Some(max) if max == min => format!("{}", min),
        Some(max) => format!("{} to {}", min, max),
        None => format!("at least {}", min),
    };
    let plural = if max == Some(1) && min == 1 { "argument" } else { "arguments" };
    Err(HostError::ExecutionFailed(format!(
        "Keyword '{}.{}' expected {} {}, got {}.",
        NAME, kw.name, expected, plural, got
    )))
}

fn text(value: &Value) -> String {
    stringify(value)
}

fn log_to_console(engine: &mut Engine, args: Vec<Value>) -> Result<Value, HostError> {
    engine.console().line(&text(&args[0]));
    Ok(Value::Null)
}

fn log(_: &mut Engine, args: Vec<Value>) -> Result<Value, HostError> {
    let message = text(&args[0]);
    let level = args.get(1).map(text).unwrap_or_else(|| "INFO".to_string());
    match level.to_uppercase().as_str() {
        "TRACE" => tracing::trace!(target: "kwdebug::log", "{}", message),
        "DEBUG" => tracing::debug!(target: "kwdebug::log", "{}", message),
        "INFO" => tracing::info!(target: "kwdebug::log", "{}", message),
        "WARN" => tracing::warn!(target: "kwdebug::log", "{}", message),
        other => {
            return Err(HostError::ExecutionFailed(format!("Invalid log level '{}'.", other)))
        }
    }
    Ok(Value::Null)
}

fn no_operation(_: &mut Engine, _: Vec<Value>) -> Result<Value, HostError> {
    Ok(Value::Null)
}

fn set_variable(_: &mut Engine, mut args: Vec<Value>) -> Result<Value, HostError> {
    Ok(match args.len() {
        0 => Value::from(""),
        1 => args.remove(0),
        _ => Value::Array(args),
    })
}

fn get_variable_value(engine: &mut Engine, args: Vec<Value>) -> Result<Value, HostError> {
    let name = text(&args[0]);
    let variable = if is_variable(&name) {
        name
    } else if let Some(bare) = name.strip_prefix('$') {
        format!("${{{}}}", bare)
    } else {
        format!("${{{}}}", name)
    };
    match engine.variables().get(&variable) {
        Ok(value) => Ok(value),
        Err(_) => Ok(args.get(1).cloned().unwrap_or(Value::Null)),
    }
}

fn get_time(_: &mut Engine, args: Vec<Value>) -> Result<Value, HostError> {
    let format = args.first().map(text).unwrap_or_default();
    let now = Local::now();
    if format.trim().eq_ignore_ascii_case("epoch") {
        Ok(Value::from(now.timestamp()))
    } else {
        Ok(Value::from(now.format("%Y-%m-%d %H:%M:%S").to_string()))
    }
}

fn catenate(_: &mut Engine, args: Vec<Value>) -> Result<Value, HostError> {
    let mut items: Vec<String> = args.iter().map(text).collect();
    let mut separator = " ".to_string();
    if let Some(sep) = items.first().and_then(|first| first.strip_prefix("SEPARATOR=")) {
        separator = sep.to_string();
        items.remove(0);
    }
    Ok(Value::from(items.join(&separator)))
}

fn should_be_equal(_: &mut Engine, args: Vec<Value>) -> Result<Value, HostError> {
    if args[0] == args[1] {
        return Ok(Value::Null);
    }
    let message = match args.get(2) {
        Some(msg) => text(msg),
        None => format!("{} != {}", text(&args[0]), text(&args[1])),
    };
    Err(HostError::HandlerFailed(message))
}

fn should_contain(_: &mut Engine, args: Vec<Value>) -> Result<Value, HostError> {
    let found = match &args[0] {
        Value::Array(items) => items.contains(&args[1]),
        Value::Object(map) => map.contains_key(&text(&args[1])),
        other => text(other).contains(&text(&args[1])),
    };
    if found {
        return Ok(Value::Null);
    }
    let message = match args.get(2) {
        Some(msg) => text(msg),
        None => format!("'{}' does not contain '{}'", text(&args[0]), text(&args[1])),
    };
    Err(HostError::HandlerFailed(message))
}

fn convert_to_integer(_: &mut Engine, args: Vec<Value>) -> Result<Value, HostError> {
    let item = &args[0];
    if let Some(n) = item.as_i64() {
        return Ok(Value::from(n));
    }
    if let Some(f) = item.as_f64() {
        return Ok(Value::from(f.round() as i64));
    }
    text(item)
        .trim()
        .parse::<i64>()
        .map(Value::from)
        .map_err(|_| {
            HostError::HandlerFailed(format!("'{}' cannot be converted to an integer.", text(item)))
        })
}

fn get_length(_: &mut Engine, args: Vec<Value>) -> Result<Value, HostError> {
    let length = match &args[0] {
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        other => {
            return Err(HostError::HandlerFailed(format!(
                "Could not get length of '{}'.",
                text(other)
            )))
        }
    };
    tracing::info!(target: "kwdebug::log", "Length is {}", length);
    Ok(Value::from(length))
}

fn fail(_: &mut Engine, args: Vec<Value>) -> Result<Value, HostError> {
    Err(HostError::HandlerFailed(args.first().map(text).unwrap_or_default()))
}

fn sleep(_: &mut Engine, args: Vec<Value>) -> Result<Value, HostError> {
    let raw = text(&args[0]);
    let duration = parse_duration(&raw)
        .ok_or_else(|| HostError::ExecutionFailed(format!("Invalid time string '{}'.", raw)))?;
    std::thread::sleep(duration);
    Ok(Value::Null)
}

/// `1.5`, `2s`, `200ms`
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim().to_lowercase();
    let (number, scale) = if let Some(ms) = raw.strip_suffix("ms") {
        (ms, 0.001)
    } else if let Some(s) = raw.strip_suffix('s') {
        (s, 1.0)
    } else {
        (raw.as_str(), 1.0)
    };
    let seconds = number.trim().parse::<f64>().ok()? * scale;
    if seconds.is_finite() && seconds >= 0.0 {
        Some(Duration::from_secs_f64(seconds))
    } else {
        None
    }
}

fn run_keyword(engine: &mut Engine, args: Vec<Value>) -> Result<Value, HostError> {
    let mut cells = args.iter().map(text);
    let name = cells.next().unwrap_or_default();
    let rest: Vec<String> = cells.collect();
    engine.run_keyword_cells(&name, &rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("1.5"), Some(Duration::from_millis(1500)));
        assert_eq!(parse_duration("2s"), Some(Duration::from_secs(2)));
        assert_eq!(parse_duration("200ms"), Some(Duration::from_millis(200)));
        assert_eq!(parse_duration("soon"), None);
        assert_eq!(parse_duration("-1"), None);
    }

    #[test]
    fn test_argument_count_message() {
        let kw = KEYWORDS.iter().find(|k| k.name == "Log To Console").unwrap();
        let err = check_args(kw, 0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Keyword 'BuiltIn.Log To Console' expected 1 argument, got 0."
        );
        let kw = KEYWORDS.iter().find(|k| k.name == "Log").unwrap();
        assert_eq!(
            check_args(kw, 3).unwrap_err().to_string(),
            "Keyword 'BuiltIn.Log' expected 1 to 2 arguments, got 3."
        );
    }

    #[test]
    fn test_keyword_docs() {
        let docs = BuiltIn.keywords();
        assert_eq!(docs.len(), KEYWORDS.len());
        assert!(docs.iter().all(|d| d.lib == NAME));
        let get_time = docs.iter().find(|d| d.name == "Get Time").unwrap();
        assert_eq!(get_time.summary(), "Returns the current time.");
    }

    #[test]
    fn test_log_to_console_writes_engine_console() {
        let (console, out) = crate::console::Console::buffer();
        let mut engine = Engine::new(super::super::DEFAULT_VERSION, console);
        let result = BuiltIn
            .run(&mut engine, "Log To Console", vec![Value::from(42)])
            .unwrap();
        assert_eq!(result, Value::Null);
        assert_eq!(out.lines(), vec!["42"]);
    }
}
