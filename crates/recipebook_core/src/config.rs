//! Process configuration for recipebook binaries.
//!
//! # Responsibility
//! - Collect database, collection and logging settings from the environment.
//! - Apply defaults so an empty environment yields a runnable in-memory setup.
//!
//! # Invariants
//! - Blank values are treated as unset.
//! - `log_level` is always a normalized level name.

use crate::logging::{default_log_level, normalize_level};
use crate::repo::recipe_repo::RECIPES_COLLECTION;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "RECIPEBOOK_DB_PATH";
pub const ENV_COLLECTION: &str = "RECIPEBOOK_COLLECTION";
pub const ENV_LOG_LEVEL: &str = "RECIPEBOOK_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "RECIPEBOOK_LOG_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        message: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue {
                key,
                value,
                message,
            } => write!(f, "invalid {key}=`{value}`: {message}"),
        }
    }
}

impl Error for ConfigError {}

/// Resolved settings for one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipebookConfig {
    /// SQLite file; `None` means an in-memory database.
    pub db_path: Option<PathBuf>,
    pub collection: String,
    pub log_level: &'static str,
    /// Rolling log directory; `None` leaves logging uninitialized.
    pub log_dir: Option<PathBuf>,
}

impl Default for RecipebookConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            collection: RECIPES_COLLECTION.to_string(),
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

impl RecipebookConfig {
    /// Loads settings from `RECIPEBOOK_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads settings through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = Some(PathBuf::from(path));
        }
        if let Some(collection) = read(ENV_COLLECTION) {
            config.collection = collection;
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level =
                normalize_level(&level).map_err(|err| ConfigError::InvalidValue {
                    key: ENV_LOG_LEVEL,
                    value: level.clone(),
                    message: err.to_string(),
                })?;
        }
        if let Some(dir) = read(ENV_LOG_DIR) {
            let dir = PathBuf::from(dir);
            if !dir.is_absolute() {
                return Err(ConfigError::InvalidValue {
                    key: ENV_LOG_DIR,
                    value: dir.display().to_string(),
                    message: "log directory must be absolute".to_string(),
                });
            }
            config.log_dir = Some(dir);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ConfigError, RecipebookConfig, ENV_COLLECTION, ENV_DB_PATH, ENV_LOG_DIR, ENV_LOG_LEVEL,
    };
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = RecipebookConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, RecipebookConfig::default());
        assert_eq!(config.collection, "recipes");
        assert!(config.db_path.is_none());
    }

    #[test]
    fn values_override_defaults_and_blanks_are_ignored() {
        let config = RecipebookConfig::from_lookup(lookup(&[
            (ENV_DB_PATH, "/tmp/recipes.db"),
            (ENV_COLLECTION, "   "),
            (ENV_LOG_LEVEL, "WARNING"),
            (ENV_LOG_DIR, "/tmp/recipebook-logs"),
        ]))
        .unwrap();

        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/recipes.db")));
        assert_eq!(config.collection, "recipes");
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/recipebook-logs")));
    }

    #[test]
    fn invalid_level_and_relative_log_dir_are_rejected() {
        let err = RecipebookConfig::from_lookup(lookup(&[(ENV_LOG_LEVEL, "chatty")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { key, .. } if key == ENV_LOG_LEVEL
        ));

        let err = RecipebookConfig::from_lookup(lookup(&[(ENV_LOG_DIR, "logs")])).unwrap_err();
        assert!(err.to_string().contains("RECIPEBOOK_LOG_DIR"));
    }
}
