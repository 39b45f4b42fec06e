//! Source windows around the current step.
//!
//! Both views work on raw file lines. The test-case view finds the block
//! around a line with an indentation heuristic, not a parser: a line belongs
//! to the block when it starts with a space, a tab or `#`.

use std::fs;
use std::path::{Path, PathBuf};

use semver::Version;
use thiserror::Error;

use crate::console::Console;

/// First engine version whose steps carry source file and line.
pub const SOURCE_LINES_SINCE: Version = Version::new(3, 2, 0);

/// Lines shown on each side of the current line by `list`.
pub const DEFAULT_RADIUS: usize = 5;

/// Marker put in front of the current line.
pub const CURRENT_LINE_MARKER: &str = "->";

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("engine {found} does not report source lines, {required} or newer is required")]
    NeedUpgrade { required: Version, found: Version },
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceLine {
    pub lineno: usize,
    pub text: String,
    pub current: bool,
}

impl SourceLine {
    /// `<lineno:>3> <marker:2>\t<text>`
    pub fn render(&self) -> String {
        let marker = if self.current { CURRENT_LINE_MARKER } else { "" };
        format!("{:>3} {:2}\t{}", self.lineno, marker, self.text.trim_end())
    }
}

/// Fail with [`SourceError::NeedUpgrade`] when `version` predates source lines.
pub fn check_version(version: &Version) -> Result<(), SourceError> {
    if supports_source_lines(version) {
        Ok(())
    } else {
        Err(SourceError::NeedUpgrade {
            required: SOURCE_LINES_SINCE,
            found: version.clone(),
        })
    }
}

pub fn supports_source_lines(version: &Version) -> bool {
    *version >= SOURCE_LINES_SINCE
}

/// Lines `lineno - radius ..= lineno + radius`, clipped to the file.
pub fn window_lines(lines: &[String], lineno: usize, radius: usize) -> Vec<SourceLine> {
    if lineno == 0 || lines.is_empty() {
        return Vec::new();
    }
    let first = lineno.saturating_sub(radius).max(1);
    let last = lineno.saturating_add(radius).min(lines.len());
    collect(lines, first, last, lineno)
}

/// The contiguous block around `lineno`, plus the non-block line that
/// opens it (normally the test case name).
pub fn block_lines(lines: &[String], lineno: usize) -> Vec<SourceLine> {
    if lineno == 0 || lineno > lines.len() {
        return Vec::new();
    }
    let target = lineno - 1;

    let mut start = 0;
    let mut index = target;
    while index > 0 {
        index -= 1;
        if !inside_block(&lines[index]) {
            start = index;
            break;
        }
    }

    let mut end = target;
    while end < lines.len() && inside_block(&lines[end]) {
        end += 1;
    }
    let end = end.max(target + 1);

    collect(lines, start + 1, end, lineno)
}

/// Whether a raw line continues the current block.
pub fn inside_block(line: &str) -> bool {
    line.starts_with(' ') || line.starts_with('\t') || line.starts_with('#')
}

fn collect(lines: &[String], first: usize, last: usize, current: usize) -> Vec<SourceLine> {
    if first > last {
        return Vec::new();
    }
    (first..=last)
        .map(|lineno| SourceLine {
            lineno,
            text: lines[lineno - 1].clone(),
            current: lineno == current,
        })
        .collect()
}

pub fn read_lines(path: &Path) -> Result<Vec<String>, SourceError> {
    let content = fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(content.lines().map(String::from).collect())
}

/// Print the fixed-radius window around `lineno` of `path`.
pub fn print_source_lines(
    console: &Console,
    version: &Version,
    path: Option<&Path>,
    lineno: usize,
    radius: usize,
) -> Result<(), SourceError> {
    check_version(version)?;
    let Some(path) = path else { return Ok(()) };
    if lineno == 0 {
        return Ok(());
    }
    let lines = read_lines(path)?;
    print_lines(console, &window_lines(&lines, lineno, radius));
    Ok(())
}

/// Print the whole block (test case) enclosing `lineno` of `path`.
pub fn print_test_case_lines(
    console: &Console,
    version: &Version,
    path: Option<&Path>,
    lineno: usize,
) -> Result<(), SourceError> {
    check_version(version)?;
    let Some(path) = path else { return Ok(()) };
    if lineno == 0 {
        return Ok(());
    }
    let lines = read_lines(path)?;
    print_lines(console, &block_lines(&lines, lineno));
    Ok(())
}

fn print_lines(console: &Console, lines: &[SourceLine]) {
    for line in lines {
        console.line(&line.render());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("    step {}", i)).collect()
    }

    fn suite() -> Vec<String> {
        [
            "*** Test Cases ***",
            "First",
            "    log  one",
            "",
            "Second",
            "    log  two",
            "# note",
            "\tlog  three",
            "    log  four",
            "Third",
            "    log  five",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    #[test]
    fn test_window_line_count() {
        let lines = numbered(12);
        for n in [1usize, 3, 12] {
            let lines = &lines[..n];
            for l in 1..=n {
                for r in 0..7 {
                    let window = window_lines(lines, l, r);
                    let expected = (l + r).min(n) - l.saturating_sub(r).max(1) + 1;
                    assert_eq!(window.len(), expected, "L={} r={} N={}", l, r, n);
                    let marked: Vec<_> = window.iter().filter(|s| s.current).collect();
                    assert_eq!(marked.len(), 1);
                    assert_eq!(marked[0].lineno, l);
                }
            }
        }
    }

    #[test]
    fn test_window_is_idempotent() {
        let lines = numbered(20);
        assert_eq!(window_lines(&lines, 10, 3), window_lines(&lines, 10, 3));
        let window = window_lines(&lines, 10, 3);
        assert_eq!(window.first().map(|l| l.lineno), Some(7));
        assert_eq!(window.last().map(|l| l.lineno), Some(13));
    }

    #[test]
    fn test_window_out_of_range() {
        assert!(window_lines(&numbered(3), 0, 5).is_empty());
        assert!(window_lines(&[], 1, 5).is_empty());
    }

    #[test]
    fn test_block_includes_header_and_comments() {
        let lines = suite();
        let block = block_lines(&lines, 8);
        let numbers: Vec<_> = block.iter().map(|l| l.lineno).collect();
        assert_eq!(numbers, vec![5, 6, 7, 8, 9]);
        assert!(block.iter().find(|l| l.lineno == 8).unwrap().current);
    }

    #[test]
    fn test_block_stops_at_blank_line() {
        let lines = suite();
        let block = block_lines(&lines, 3);
        let numbers: Vec<_> = block.iter().map(|l| l.lineno).collect();
        assert_eq!(numbers, vec![2, 3]);
    }

    #[test]
    fn test_block_at_top_of_file() {
        let lines: Vec<String> = vec!["    a".into(), "    b".into(), "c".into()];
        let numbers: Vec<_> = block_lines(&lines, 2).iter().map(|l| l.lineno).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn test_block_target_not_indented() {
        let lines = suite();
        let numbers: Vec<_> = block_lines(&lines, 10).iter().map(|l| l.lineno).collect();
        assert_eq!(numbers, vec![5, 6, 7, 8, 9, 10]);
    }

    #[test]
    fn test_render_format() {
        let line = SourceLine {
            lineno: 7,
            text: "    log  hi   ".into(),
            current: true,
        };
        assert_eq!(line.render(), "  7 ->\t    log  hi");
        let other = SourceLine {
            current: false,
            ..line
        };
        assert_eq!(other.render(), "  7   \t    log  hi");
    }

    #[test]
    fn test_check_version() {
        assert!(check_version(&Version::new(3, 2, 0)).is_ok());
        assert!(check_version(&Version::new(4, 1, 0)).is_ok());
        assert!(matches!(
            check_version(&Version::new(3, 1, 2)),
            Err(SourceError::NeedUpgrade { .. })
        ));
    }

    #[test]
    fn test_print_source_lines_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("suite.robot");
        fs::write(&path, suite().join("\n")).unwrap();
        let (console, out) = Console::buffer();
        print_source_lines(&console, &Version::new(4, 0, 0), Some(&path), 3, 1).unwrap();
        assert_eq!(
            out.lines(),
            vec!["  2   \tFirst", "  3 ->\t    log  one", "  4   \t"]
        );
    }

    #[test]
    fn test_print_without_position_prints_nothing() {
        let (console, out) = Console::buffer();
        print_test_case_lines(&console, &Version::new(4, 0, 0), None, 0).unwrap();
        assert!(out.contents().is_empty());
    }
}
