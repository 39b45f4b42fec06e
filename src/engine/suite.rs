//! Plain text suite files.
//!
//! ```text
//! *** Settings ***
//! Library    DebugLibrary
//!
//! *** Variables ***
//! ${GREETING}    hello
//!
//! *** Test Cases ***
//! Say Hello
//!     ${now} =    Get Time    epoch
//!     Log To Console    ${GREETING}
//!     Debug
//! ```
//!
//! Cells are separated by two or more spaces or a tab.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::variables::parse_variable;
use crate::host::Step;
use crate::keyword::parse_keyword;

#[derive(Error, Debug)]
pub enum SuiteError {
    #[error("cannot read suite {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{name}:{line}: {message}")]
    Parse {
        name: String,
        line: usize,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    pub name: String,
    pub lineno: usize,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Suite {
    pub name: String,
    pub source: Option<PathBuf>,
    pub libraries: Vec<String>,
    /// Variable name with its raw value cells.
    pub variables: Vec<(String, Vec<String>)>,
    pub tests: Vec<TestCase>,
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    None,
    Settings,
    Variables,
    TestCases,
    Ignored,
}

fn section(header: &str) -> Section {
    let name = header.trim().trim_matches('*').trim().to_lowercase();
    match name.as_str() {
        "settings" | "setting" => Section::Settings,
        "variables" | "variable" => Section::Variables,
        "test cases" | "test case" => Section::TestCases,
        _ => Section::Ignored,
    }
}

/// Suite name from a file name: `my_first_suite.robot` is `My First Suite`.
pub fn suite_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    stem.replace('_', " ")
        .split(' ')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn load_suite(path: &Path) -> Result<Suite, SuiteError> {
    let text = fs::read_to_string(path).map_err(|source| SuiteError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_suite(&suite_name(path), Some(path), &text)
}

pub fn parse_suite(name: &str, source: Option<&Path>, text: &str) -> Result<Suite, SuiteError> {
    let mut suite = Suite {
        name: name.to_string(),
        source: source.map(Path::to_path_buf),
        libraries: Vec::new(),
        variables: Vec::new(),
        tests: Vec::new(),
    };
    let mut current = Section::None;

    for (index, raw) in text.lines().enumerate() {
        let lineno = index + 1;
        let error = |message: String| SuiteError::Parse {
            name: name.to_string(),
            line: lineno,
            message,
        };

        if raw.starts_with('*') {
            current = section(raw);
            if current == Section::Ignored {
                tracing::debug!(suite = name, line = lineno, header = raw, "skipping section");
            }
            continue;
        }
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let cells = parse_keyword(trimmed);

        match current {
            Section::None | Section::Ignored => {}
            Section::Settings => {
                if cells[0].eq_ignore_ascii_case("library") {
                    let library = cells
                        .get(1)
                        .filter(|c| !c.is_empty())
                        .ok_or_else(|| error("Library setting requires a name.".into()))?;
                    suite.libraries.push(library.clone());
                } else {
                    tracing::debug!(suite = name, line = lineno, setting = %cells[0], "unsupported setting");
                }
            }
            Section::Variables => {
                let variable = cells[0].trim_end_matches(|c: char| c == '=' || c == ' ');
                if parse_variable(variable).is_none() {
                    return Err(error(format!("Invalid variable name '{}'.", cells[0])));
                }
                suite
                    .variables
                    .push((variable.to_string(), cells[1..].to_vec()));
            }
            Section::TestCases => {
                let indented = raw.starts_with(' ') || raw.starts_with('\t');
                if !indented {
                    suite.tests.push(TestCase {
                        name: cells[0].clone(),
                        lineno,
                        steps: Vec::new(),
                    });
                    let rest: Vec<String> = cells[1..].iter().filter(|c| !c.is_empty()).cloned().collect();
                    if rest.is_empty() {
                        continue;
                    }
                    push_step(&mut suite, rest, source, lineno);
                    continue;
                }
                if suite.tests.is_empty() {
                    return Err(error("Step outside of a test case.".into()));
                }
                push_step(&mut suite, cells, source, lineno);
            }
        }
    }

    Ok(suite)
}

fn push_step(suite: &mut Suite, cells: Vec<String>, source: Option<&Path>, lineno: usize) {
    // Test settings such as [Documentation] are not steps.
    if cells[0].starts_with('[') {
        return;
    }
    let Some(step) = build_step(cells, source, lineno) else {
        return;
    };
    if let Some(test) = suite.tests.last_mut() {
        test.steps.push(step);
    }
}

/// Split leading assignment cells from the keyword and its arguments.
pub fn build_step(cells: Vec<String>, source: Option<&Path>, lineno: usize) -> Option<Step> {
    let mut cells = cells.into_iter().peekable();
    let mut assign = Vec::new();
    while let Some(cell) = cells.peek() {
        let name = cell.trim_end_matches(|c: char| c == '=' || c == ' ');
        if parse_variable(name).is_none() {
            break;
        }
        assign.push(name.to_string());
        cells.next();
    }
    let keyword = cells.next()?;
    Some(Step {
        keyword,
        args: cells.collect(),
        assign,
        source: source.map(Path::to_path_buf),
        lineno: Some(lineno),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUITE: &str = "\
*** Settings ***
Library    DebugLibrary
Documentation    ignored

** Variables **
${GREETING} =    hello
@{ITEMS}    a    b

*** Test Cases ***
First Test
    ${now} =    Get Time    epoch
    # a comment
    [Documentation]    not a step
\tLog To Console\t${GREETING}
Second Test    No Operation
    ${a}    ${b} =    Set Variable    1    2

*** Keywords ***
Ignored
    Log    x
";

    #[test]
    fn test_parse_sections() {
        let suite = parse_suite("Demo", Some(Path::new("demo.robot")), SUITE).unwrap();
        assert_eq!(suite.libraries, vec!["DebugLibrary"]);
        assert_eq!(
            suite.variables,
            vec![
                ("${GREETING}".to_string(), vec!["hello".to_string()]),
                ("@{ITEMS}".to_string(), vec!["a".to_string(), "b".to_string()]),
            ]
        );
        assert_eq!(suite.tests.len(), 2);
    }

    #[test]
    fn test_steps_carry_lines_and_assignments() {
        let suite = parse_suite("Demo", Some(Path::new("demo.robot")), SUITE).unwrap();
        let first = &suite.tests[0];
        assert_eq!(first.name, "First Test");
        assert_eq!(first.lineno, 10);
        assert_eq!(first.steps.len(), 2);
        assert_eq!(first.steps[0].keyword, "Get Time");
        assert_eq!(first.steps[0].assign, vec!["${now}"]);
        assert_eq!(first.steps[0].args, vec!["epoch"]);
        assert_eq!(first.steps[0].lineno, Some(11));
        assert_eq!(first.steps[1].keyword, "Log To Console");
        assert_eq!(first.steps[1].lineno, Some(14));
        assert_eq!(first.steps[1].source.as_deref(), Some(Path::new("demo.robot")));
    }

    #[test]
    fn test_step_on_test_name_line() {
        let suite = parse_suite("Demo", None, SUITE).unwrap();
        let second = &suite.tests[1];
        assert_eq!(second.steps[0].keyword, "No Operation");
        assert_eq!(second.steps[0].lineno, Some(15));
        assert_eq!(second.steps[1].assign, vec!["${a}", "${b}"]);
        assert_eq!(second.steps[1].args, vec!["1", "2"]);
    }

    #[test]
    fn test_step_outside_test() {
        let err = parse_suite("Bad", None, "*** Test Cases ***\n    Log    x\n").unwrap_err();
        assert_eq!(err.to_string(), "Bad:2: Step outside of a test case.");
    }

    #[test]
    fn test_suite_name_from_file() {
        assert_eq!(suite_name(Path::new("/tmp/my_first_suite.robot")), "My First Suite");
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_suite(Path::new("/nonexistent/suite.robot")).unwrap_err();
        assert!(matches!(err, SuiteError::Io { .. }));
    }
}
