//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - The exercise opened by default and the tick cadence of the host loop
//! - Database file name and completion log key
//! - User-defined breathing exercises
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::breathing::{catalog, BreathPattern, Exercise, Termination};
use crate::error::{ConfigError, CoreError, ValidationError};
use crate::history::DEFAULT_LOG_KEY;

/// Breathing session preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreathingConfig {
    #[serde(default = "default_exercise")]
    pub default_exercise: String,
    /// Wall-clock length of one engine tick, in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Print phase changes while a session runs.
    #[serde(default = "default_true")]
    pub announce_phases: bool,
}

/// Storage locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_database_file")]
    pub database_file: String,
    #[serde(default = "default_log_key")]
    pub log_key: String,
}

/// A user-defined exercise. Exactly one of `cycles` / `total_seconds` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomExercise {
    pub id: String,
    pub name: String,
    /// Seconds for [inhale, hold1, exhale, hold2].
    pub pattern: [u32; 4],
    #[serde(default)]
    pub cycles: Option<u32>,
    #[serde(default)]
    pub total_seconds: Option<u32>,
}

impl CustomExercise {
    /// Validate and convert into a runnable exercise.
    pub fn to_exercise(&self) -> Result<Exercise, ValidationError> {
        let termination = match (self.cycles, self.total_seconds) {
            (Some(n), None) => Termination::Cycles(n),
            (None, Some(t)) => Termination::TotalSeconds(t),
            _ => {
                return Err(ValidationError::InvalidValue {
                    field: format!("custom_exercises.{}", self.id),
                    message: "exactly one of 'cycles' or 'total_seconds' must be set".into(),
                })
            }
        };
        if self.id.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "custom_exercises.id".into(),
                message: "id must not be empty".into(),
            });
        }
        Exercise::new(
            self.id.clone(),
            self.name.clone(),
            BreathPattern::new(self.pattern)?,
            termination,
        )
    }
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub breathing: BreathingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub custom_exercises: Vec<CustomExercise>,
}

fn default_exercise() -> String {
    catalog::COACHING_BOX.into()
}
fn default_tick_interval_ms() -> u64 {
    1000
}
fn default_true() -> bool {
    true
}
fn default_database_file() -> String {
    super::database::DEFAULT_DATABASE_FILE.into()
}
fn default_log_key() -> String {
    DEFAULT_LOG_KEY.into()
}

impl Default for BreathingConfig {
    fn default() -> Self {
        Self {
            default_exercise: default_exercise(),
            tick_interval_ms: default_tick_interval_ms(),
            announce_phases: true,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_file: default_database_file(),
            log_key: default_log_key(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            breathing: BreathingConfig::default(),
            storage: StorageConfig::default(),
            custom_exercises: Vec::new(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
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
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default config file location.
    pub fn path() -> Result<PathBuf, CoreError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, CoreError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults if the file is missing.
    pub fn load_from(path: &Path) -> Result<Self, CoreError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config =
                    toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), CoreError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), CoreError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving. Returns error if the key is
    /// unknown or the resulting config doesn't validate.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and save to the default location.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Check cross-field constraints that serde can't express.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.breathing.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "breathing.tick_interval_ms".into(),
                message: "must be at least 1".into(),
            }
            .into());
        }
        self.exercises()?;
        Ok(())
    }

    /// Built-in exercises followed by the custom ones.
    ///
    /// Custom exercises may not reuse an id already in the list.
    pub fn exercises(&self) -> Result<Vec<Exercise>, ValidationError> {
        let mut all = catalog::builtin_exercises();
        for custom in &self.custom_exercises {
            let exercise = custom.to_exercise()?;
            if all.iter().any(|e| e.id == exercise.id) {
                return Err(ValidationError::InvalidValue {
                    field: "custom_exercises.id".into(),
                    message: format!("duplicate exercise id '{}'", exercise.id),
                });
            }
            all.push(exercise);
        }
        Ok(all)
    }

    /// Look up an exercise by id.
    pub fn exercise(&self, id: &str) -> Result<Exercise, ValidationError> {
        self.exercises()?
            .into_iter()
            .find(|e| e.id == id)
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "exercise".into(),
                message: format!("unknown exercise '{id}'"),
            })
    }
}
