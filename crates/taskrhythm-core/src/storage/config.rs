//! TOML-based application configuration.
//!
//! Holds scheduler tuning, the default user and an optional database path.
//! Stored at `~/.config/taskrhythm/config.toml` (see [`super::data_dir`]).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::data_dir;
use crate::error::ConfigError;
use crate::scheduler::SchedulerConfig;
use crate::task::UserId;

/// Who commands act for when `--user` is not given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default = "default_user")]
    pub default_user: UserId,
}

/// Where the database lives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Overrides `<data dir>/taskrhythm.db`.
    #[serde(default)]
    pub database: Option<PathBuf>,
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub user: UserConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

fn default_user() -> UserId {
    1
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            default_user: default_user(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(root: &'a Value, key: &str) -> Option<&'a Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(root: &mut Value, key: &str, value: &str) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;

            let new_value = match existing {
                Value::Bool(_) => Value::Bool(
                    value
                        .parse::<bool>()
                        .map_err(|e| invalid(e.to_string()))?,
                ),
                Value::Number(_) => {
                    if let Ok(n) = value.parse::<u64>() {
                        Value::Number(n.into())
                    } else if let Ok(n) = value.parse::<i64>() {
                        Value::Number(n.into())
                    } else {
                        return Err(invalid(format!("cannot parse '{value}' as number")));
                    }
                }
                Value::Object(_) | Value::Array(_) => {
                    return Err(invalid("not a leaf key".to_string()));
                }
                Value::Null | Value::String(_) if value.is_empty() => Value::Null,
                _ => Value::String(value.to_string()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// `<data dir>/config.toml`
    pub fn path() -> Result<PathBuf, ConfigError> {
        data_dir()
            .map(|dir| dir.join("config.toml"))
            .map_err(|e| ConfigError::LoadFailed {
                path: PathBuf::from("config.toml"),
                message: e.to_string(),
            })
    }

    /// Load from disk, writing the defaults first if no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config =
                    toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "writing default config");
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scheduler.validate()
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key. The change is in memory
    /// only; call [`Config::save`] to keep it.
    ///
    /// # Errors
    ///
    /// `UnknownKey` for keys outside the schema, `InvalidValue` when the
    /// value does not fit the key.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Database file: `storage.database`, or `<data dir>/taskrhythm.db`.
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.storage.database {
            Some(path) => Ok(path.clone()),
            None => data_dir()
                .map(|dir| dir.join("taskrhythm.db"))
                .map_err(|e| ConfigError::LoadFailed {
                    path: PathBuf::from("taskrhythm.db"),
                    message: e.to_string(),
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::BacklogOrder;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.scheduler.default_task_minutes, 60);
        assert_eq!(parsed.user.default_user, 1);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[scheduler]\nbacklog_order = \"ranked\"\n").unwrap();
        assert_eq!(parsed.scheduler.backlog_order, BacklogOrder::Ranked);
        assert_eq!(parsed.scheduler.default_task_minutes, 60);
        assert!(parsed.storage.database.is_none());
    }

    #[test]
    fn get_by_dot_path() {
        let cfg = Config::default();
        assert_eq!(cfg.get("scheduler.default_task_minutes").as_deref(), Some("60"));
        assert_eq!(cfg.get("scheduler.backlog_order").as_deref(), Some("lexical"));
        assert_eq!(cfg.get("nope.nothing"), None);
    }

    #[test]
    fn set_by_dot_path() {
        let mut cfg = Config::default();
        cfg.set("scheduler.default_task_minutes", "45").unwrap();
        cfg.set("scheduler.backlog_order", "ranked").unwrap();
        cfg.set("user.default_user", "7").unwrap();
        cfg.set("storage.database", "/tmp/rhythm.db").unwrap();

        assert_eq!(cfg.scheduler.default_task_minutes, 45);
        assert_eq!(cfg.scheduler.backlog_order, BacklogOrder::Ranked);
        assert_eq!(cfg.user.default_user, 7);
        assert_eq!(cfg.storage.database, Some(PathBuf::from("/tmp/rhythm.db")));

        cfg.set("storage.database", "").unwrap();
        assert!(cfg.storage.database.is_none());
    }

    #[test]
    fn set_rejects_bad_input_and_keeps_old_value() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("scheduler.unknown", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            cfg.set("scheduler.default_task_minutes", "soon"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(cfg.set("scheduler.default_task_minutes", "0").is_err());
        assert!(cfg.set("scheduler.backlog_order", "random").is_err());
        assert!(cfg.set("scheduler", "1").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn load_from_writes_defaults_then_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let first = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(first, Config::default());

        let mut changed = first;
        changed.set("scheduler.default_task_minutes", "30").unwrap();
        changed.save_to(&path).unwrap();
        assert_eq!(
            Config::load_from(&path).unwrap().scheduler.default_task_minutes,
            30
        );
    }

    #[test]
    fn load_from_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "scheduler = [").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::ParseFailed(_))));
    }

    #[test]
    fn database_path_override() {
        let mut cfg = Config::default();
        cfg.storage.database = Some(PathBuf::from("/srv/rhythm.db"));
        assert_eq!(cfg.database_path().unwrap(), PathBuf::from("/srv/rhythm.db"));
    }
}
