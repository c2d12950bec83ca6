//! Runtime paths and logging settings.
//!
//! Everything is resolved from the environment once at startup. The lookup is
//! injected so tests can exercise the rules without touching process state.

use std::path::PathBuf;

use directories::BaseDirs;
use thiserror::Error;

/// Overrides the data directory (database and log file).
pub const HOME_VAR: &str = "CLIENT_ROSTER_HOME";
/// Log filter; falls back to `RUST_LOG`.
pub const LOG_VAR: &str = "CLIENT_ROSTER_LOG";

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".client-roster";
const DB_FILE_NAME: &str = "clients.sqlite";
const LOG_FILE_NAME: &str = "client-roster.log";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("could not locate home directory; set CLIENT_ROSTER_HOME")]
    NoHomeDirectory,
    #[error("{0} is set but empty")]
    EmptyOverride(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub log_path: PathBuf,
    pub log_filter: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok(), || {
            BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
        })
    }

    /// Resolve the configuration from an environment lookup and a home
    /// directory lookup.
    pub fn from_lookup<F, H>(lookup: F, home: H) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
        H: FnOnce() -> Option<PathBuf>,
    {
        let data_dir = match lookup(HOME_VAR) {
            Some(dir) if dir.trim().is_empty() => return Err(ConfigError::EmptyOverride(HOME_VAR)),
            Some(dir) => PathBuf::from(dir),
            None => home()
                .ok_or(ConfigError::NoHomeDirectory)?
                .join(DATA_DIR_NAME),
        };

        let log_filter = match lookup(LOG_VAR) {
            Some(filter) if filter.trim().is_empty() => {
                return Err(ConfigError::EmptyOverride(LOG_VAR))
            }
            Some(filter) => filter,
            None => lookup("RUST_LOG")
                .filter(|filter| !filter.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        };

        Ok(Self::in_dir(data_dir, log_filter))
    }

    /// Lay out every file under `data_dir`.
    pub fn in_dir(data_dir: PathBuf, log_filter: impl Into<String>) -> Self {
        Self {
            db_path: data_dir.join(DB_FILE_NAME),
            log_path: data_dir.join(LOG_FILE_NAME),
            data_dir,
            log_filter: log_filter.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::Path;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_live_under_home() {
        let vars = env(&[]);
        let config = AppConfig::from_lookup(|k| vars.get(k).cloned(), || Some("/home/ada".into()))
            .unwrap();
        assert_eq!(config.data_dir, Path::new("/home/ada/.client-roster"));
        assert_eq!(config.db_path, Path::new("/home/ada/.client-roster/clients.sqlite"));
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn overrides_take_precedence() {
        let vars = env(&[(HOME_VAR, "/tmp/roster"), ("RUST_LOG", "warn"), (LOG_VAR, "debug")]);
        let config = AppConfig::from_lookup(|k| vars.get(k).cloned(), || None).unwrap();
        assert_eq!(config.log_path, Path::new("/tmp/roster/client-roster.log"));
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn rust_log_is_the_fallback_filter() {
        let vars = env(&[("RUST_LOG", "client_roster=trace")]);
        let config = AppConfig::from_lookup(|k| vars.get(k).cloned(), || Some("/h".into())).unwrap();
        assert_eq!(config.log_filter, "client_roster=trace");
    }

    #[test]
    fn empty_overrides_and_missing_home_are_errors() {
        let vars = env(&[(HOME_VAR, "  ")]);
        assert_eq!(
            AppConfig::from_lookup(|k| vars.get(k).cloned(), || None),
            Err(ConfigError::EmptyOverride(HOME_VAR))
        );
        let vars = env(&[]);
        assert_eq!(
            AppConfig::from_lookup(|k| vars.get(k).cloned(), || None),
            Err(ConfigError::NoHomeDirectory)
        );
    }
}
