//! Shell configuration read from the environment.

use std::env;
use std::path::PathBuf;

/// Environment variable selecting the history file.
pub const HISTORY_ENV: &str = "KWDEBUG_HISTORY";

/// History file used when [`HISTORY_ENV`] is unset.
pub const DEFAULT_HISTORY: &str = "~/.kwdebug_history";

/// Settings shared by every shell activation.
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Where accepted input lines are appended. `None` disables history.
    pub history_path: Option<PathBuf>,
    /// Prompt shown before each interactive line.
    pub prompt: String,
}

impl ShellConfig {
    pub fn from_env() -> Self {
        let raw = env::var(HISTORY_ENV).unwrap_or_else(|_| DEFAULT_HISTORY.to_string());
        ShellConfig {
            history_path: expand_home(&raw),
            prompt: "> ".to_string(),
        }
    }

    /// Configuration without history, used by embedded and test shells.
    pub fn ephemeral() -> Self {
        ShellConfig {
            history_path: None,
            prompt: "> ".to_string(),
        }
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Get home directory
pub(crate) fn dirs_home() -> Option<PathBuf> {
    env::var_os("HOME").map(PathBuf::from)
}

/// Expand a leading `~` against `$HOME`. Returns `None` for an empty path or
/// when `~` cannot be resolved.
pub(crate) fn expand_home(raw: &str) -> Option<PathBuf> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw == "~" {
        return dirs_home();
    }
    match raw.strip_prefix("~/") {
        Some(rest) => dirs_home().map(|home| home.join(rest)),
        None => Some(PathBuf::from(raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_home_plain_path() {
        assert_eq!(expand_home("/tmp/hist"), Some(PathBuf::from("/tmp/hist")));
    }

    #[test]
    fn test_expand_home_tilde() {
        if let Some(home) = dirs_home() {
            assert_eq!(expand_home("~/.hist"), Some(home.join(".hist")));
        }
    }

    #[test]
    fn test_expand_home_empty() {
        assert_eq!(expand_home("   "), None);
    }

    #[test]
    fn test_history_path_from_env() {
        env::set_var(HISTORY_ENV, "/tmp/kwdebug_hist");
        let config = ShellConfig::from_env();
        env::remove_var(HISTORY_ENV);
        assert_eq!(config.history_path, Some(PathBuf::from("/tmp/kwdebug_hist")));
    }

    #[test]
    fn test_ephemeral_has_no_history() {
        assert!(ShellConfig::ephemeral().history_path.is_none());
    }
}
