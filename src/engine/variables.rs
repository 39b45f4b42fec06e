//! Variable syntax and storage.
//!
//! Variables are written `${name}` (scalar), `@{name}` (list) or `&{name}`
//! (dictionary). Names compare ignoring case, spaces and underscores, so
//! `${My Var}` and `${my_var}` are the same variable.

use std::collections::HashMap;

use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{anychar, char, one_of},
    combinator::{all_consuming, map},
    multi::many0,
    sequence::{delimited, pair, preceded},
    IResult,
};

use crate::host::{HostError, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Scalar,
    List,
    Dict,
}

impl VarKind {
    fn sigil(self) -> char {
        match self {
            VarKind::Scalar => '$',
            VarKind::List => '@',
            VarKind::Dict => '&',
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment<'a> {
    Text(&'a str),
    Escaped(char),
    Var(VarKind, &'a str),
}

fn kind(c: char) -> VarKind {
    match c {
        '@' => VarKind::List,
        '&' => VarKind::Dict,
        _ => VarKind::Scalar,
    }
}

/// `${name}`, `@{name}` or `&{name}`
fn variable(input: &str) -> IResult<&str, (VarKind, &str)> {
    map(
        pair(
            one_of("$@&"),
            delimited(char('{'), take_while1(|c: char| c != '}' && c != '{'), char('}')),
        ),
        |(sigil, name)| (kind(sigil), name),
    )(input)
}

fn segment(input: &str) -> IResult<&str, Segment<'_>> {
    alt((
        map(preceded(char('\\'), anychar), Segment::Escaped),
        map(variable, |(k, name)| Segment::Var(k, name)),
        map(take_while1(|c: char| !"$@&\\".contains(c)), Segment::Text),
        // A sigil that does not open a variable is plain text.
        map(anychar, Segment::Escaped),
    ))(input)
}

fn segments(input: &str) -> Vec<Segment<'_>> {
    match many0(segment)(input) {
        Ok((_, found)) => found,
        Err(_) => vec![Segment::Text(input)],
    }
}

/// Whether `text` is exactly one variable, e.g. `${x}`.
pub fn is_variable(text: &str) -> bool {
    parse_variable(text).is_some()
}

/// Kind and raw name of a text that is exactly one variable.
pub fn parse_variable(text: &str) -> Option<(VarKind, &str)> {
    all_consuming(variable)(text).ok().map(|(_, found)| found)
}

/// Lookup key of a variable name.
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != ' ' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Text form of a value when interpolated into a string.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct Variables {
    values: HashMap<String, Value>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `${name}`-style `variable`.
    pub fn get(&self, variable: &str) -> Result<Value, HostError> {
        let (_, name) = parse_variable(variable).ok_or_else(|| not_found(variable))?;
        self.values
            .get(&normalize(name))
            .cloned()
            .ok_or_else(|| not_found(variable))
    }

    /// Assign `value` to `variable`. List variables need a list value.
    pub fn set(&mut self, variable: &str, value: Value) -> Result<(), HostError> {
        let (kind, name) = parse_variable(variable).ok_or_else(|| {
            HostError::ExecutionFailed(format!("Invalid variable name '{}'.", variable))
        })?;
        match (kind, &value) {
            (VarKind::List, v) if !v.is_array() => {
                return Err(HostError::ExecutionFailed(format!(
                    "Value of variable '{}' is not list or list-like.",
                    variable
                )))
            }
            (VarKind::Dict, v) if !v.is_object() => {
                return Err(HostError::ExecutionFailed(format!(
                    "Value of variable '{}' is not dictionary or dictionary-like.",
                    variable
                )))
            }
            _ => {}
        }
        tracing::debug!(variable, value = %value, "set variable");
        self.values.insert(normalize(name), value);
        Ok(())
    }

    pub fn contains(&self, variable: &str) -> bool {
        self.get(variable).is_ok()
    }

    /// Resolve one argument. A lone variable keeps its value; anything else
    /// becomes a string with every variable interpolated.
    pub fn resolve(&self, arg: &str) -> Result<Value, HostError> {
        if let Some((kind, name)) = parse_variable(arg) {
            return self.lookup(kind, name);
        }
        self.replace_string(arg).map(Value::String)
    }

    pub fn replace_string(&self, text: &str) -> Result<String, HostError> {
        let mut out = String::new();
        for segment in segments(text) {
            match segment {
                Segment::Text(t) => out.push_str(t),
                Segment::Escaped(c) => out.push(c),
                Segment::Var(kind, name) => out.push_str(&stringify(&self.lookup(kind, name)?)),
            }
        }
        Ok(out)
    }

    fn lookup(&self, kind: VarKind, name: &str) -> Result<Value, HostError> {
        self.values
            .get(&normalize(name))
            .cloned()
            .ok_or_else(|| not_found(&format!("{}{{{}}}", kind.sigil(), name)))
    }
}

fn not_found(variable: &str) -> HostError {
    HostError::ExecutionFailed(format!("Variable '{}' not found.", variable))
}
