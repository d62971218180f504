//! CLI configuration via environment variables
//!
//! Only settings without a command-line flag live here; flag-backed
//! variables (`MONKEY_ENGINE`, `MONKEY_JSON`, `MONKEY_NO_HISTORY`) are bound
//! by clap.

use std::env;
use std::path::PathBuf;

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Custom history file path (MONKEY_HISTORY_FILE=/path/to/file)
    pub history_file: Option<PathBuf>,
    /// tracing filter directives (MONKEY_LOG=monkey::vm=trace)
    pub log_filter: Option<String>,
    /// Disable colored output (NO_COLOR=1)
    pub no_color: bool,
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            history_file: lookup("MONKEY_HISTORY_FILE")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            log_filter: lookup("MONKEY_LOG").filter(|v| !v.is_empty()),
            // any value counts, per no-color.org
            no_color: lookup("NO_COLOR").is_some(),
        }
    }

    /// Get the history file path
    ///
    /// Returns:
    /// 1. MONKEY_HISTORY_FILE if set
    /// 2. ~/.monkey/history if home directory exists
    /// 3. None otherwise
    pub fn history_path(&self) -> Option<PathBuf> {
        if let Some(ref path) = self.history_file {
            return Some(path.clone());
        }
        dirs::home_dir().map(|home| home.join(".monkey").join("history"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_config_defaults() {
        let config = config_with(&[]);
        assert!(config.history_file.is_none());
        assert!(config.log_filter.is_none());
        assert!(!config.no_color);
    }

    #[test]
    fn test_config_no_color() {
        assert!(config_with(&[("NO_COLOR", "")]).no_color);
        assert!(config_with(&[("NO_COLOR", "1")]).no_color);
    }

    #[test]
    fn test_config_log_filter() {
        let config = config_with(&[("MONKEY_LOG", "monkey::vm=trace")]);
        assert_eq!(config.log_filter.as_deref(), Some("monkey::vm=trace"));
        assert!(config_with(&[("MONKEY_LOG", "")]).log_filter.is_none());
    }

    #[test]
    fn test_history_path_custom() {
        let config = config_with(&[("MONKEY_HISTORY_FILE", "/tmp/custom")]);
        assert_eq!(config.history_path(), Some(PathBuf::from("/tmp/custom")));
    }
}
