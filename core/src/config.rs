//! Engine configuration applied when a connection is opened.
//!
//! Every field has an engine default, so an empty YAML document or an empty
//! override map yields [`EngineConfig::default`].
//!
//! # Example YAML
//!
//! ```yaml
//! journal_mode: wal
//! busy_timeout: 5000
//! synchronous: normal
//! cache_size: 2000
//! temp_store: memory
//! foreign_keys: true
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CoreError, Result};

/// Default lock wait before the engine reports `SQLITE_BUSY` (milliseconds).
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Default page cache size.
pub const DEFAULT_CACHE_SIZE: i64 = 2_000;

/// `journal_mode` pragma values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
    Delete,
    Truncate,
    Persist,
    Memory,
    /// Write-ahead log (the default).
    #[default]
    Wal,
    Off,
}

impl JournalMode {
    const ALL: [JournalMode; 6] = [
        Self::Delete,
        Self::Truncate,
        Self::Persist,
        Self::Memory,
        Self::Wal,
        Self::Off,
    ];

    /// Returns the pragma value.
    pub fn pragma_value(self) -> &'static str {
        match self {
            Self::Delete => "DELETE",
            Self::Truncate => "TRUNCATE",
            Self::Persist => "PERSIST",
            Self::Memory => "MEMORY",
            Self::Wal => "WAL",
            Self::Off => "OFF",
        }
    }
}

/// `synchronous` pragma values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Synchronous {
    Off,
    /// Safe with WAL; the default.
    #[default]
    Normal,
    Full,
    Extra,
}

impl Synchronous {
    const ALL: [Synchronous; 4] = [Self::Off, Self::Normal, Self::Full, Self::Extra];

    /// Returns the pragma value.
    pub fn pragma_value(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Normal => "NORMAL",
            Self::Full => "FULL",
            Self::Extra => "EXTRA",
        }
    }
}

/// `temp_store` pragma values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TempStore {
    Default,
    File,
    #[default]
    Memory,
}

impl TempStore {
    const ALL: [TempStore; 3] = [Self::Default, Self::File, Self::Memory];

    /// Returns the pragma value.
    pub fn pragma_value(self) -> &'static str {
        match self {
            Self::Default => "DEFAULT",
            Self::File => "FILE",
            Self::Memory => "MEMORY",
        }
    }
}

fn parse_setting<T: Copy>(
    key: &'static str,
    raw: &str,
    all: &[T],
    name: impl Fn(T) -> &'static str,
) -> Result<T> {
    all.iter()
        .copied()
        .find(|value| name(*value).eq_ignore_ascii_case(raw.trim()))
        .ok_or_else(|| CoreError::InvalidSetting {
            key,
            value: raw.to_string(),
        })
}

impl FromStr for JournalMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        parse_setting("journal_mode", s, &Self::ALL, Self::pragma_value)
    }
}

impl FromStr for Synchronous {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        parse_setting("synchronous", s, &Self::ALL, Self::pragma_value)
    }
}

impl FromStr for TempStore {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        parse_setting("temp_store", s, &Self::ALL, Self::pragma_value)
    }
}

/// Tunable engine parameters.
///
/// # Examples
///
/// ```
/// use litegate_core::{EngineConfig, JournalMode};
///
/// let mut config = EngineConfig::default();
/// assert_eq!(config.journal_mode, JournalMode::Wal);
///
/// config.apply_overrides([("cache_size", serde_json::json!(10000))]);
/// assert_eq!(config.cache_size, 10000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Journal mode.
    pub journal_mode: JournalMode,
    /// Lock wait in milliseconds before the engine gives up.
    pub busy_timeout: u64,
    /// Sync level.
    pub synchronous: Synchronous,
    /// Page cache size (negative values are KiB, as in the engine).
    pub cache_size: i64,
    /// Temporary table storage.
    pub temp_store: TempStore,
    /// Whether foreign key constraints are enforced.
    pub foreign_keys: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            journal_mode: JournalMode::default(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT_MS,
            synchronous: Synchronous::default(),
            cache_size: DEFAULT_CACHE_SIZE,
            temp_store: TempStore::default(),
            foreign_keys: true,
        }
    }
}

impl EngineConfig {
    /// Loads configuration from a YAML file. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IoError`] if the file cannot be read, or
    /// [`CoreError::YamlError`] if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Builds a configuration from defaults plus `overrides`.
    pub fn from_overrides<I, K>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, serde_json::Value)>,
        K: AsRef<str>,
    {
        let mut config = Self::default();
        config.apply_overrides(overrides);
        config
    }

    /// Applies recognized overrides and returns how many were applied.
    ///
    /// Null, empty, non-scalar, unknown or unparsable values are skipped and
    /// the current value is kept.
    pub fn apply_overrides<I, K>(&mut self, overrides: I) -> usize
    where
        I: IntoIterator<Item = (K, serde_json::Value)>,
        K: AsRef<str>,
    {
        let mut applied = 0;
        for (key, value) in overrides {
            let key = key.as_ref();
            let Some(raw) = scalar_text(&value) else {
                warn!(key, %value, "ignoring non-scalar or empty engine override");
                continue;
            };
            match self.apply_one(key, &raw) {
                Ok(()) => {
                    debug!(key, value = %raw, "applied engine override");
                    applied += 1;
                }
                Err(err) => warn!(key, value = %raw, error = %err, "ignoring engine override"),
            }
        }
        applied
    }

    fn apply_one(&mut self, key: &str, raw: &str) -> Result<()> {
        let invalid = |key: &'static str| CoreError::InvalidSetting {
            key,
            value: raw.to_string(),
        };
        match key {
            "journal_mode" => self.journal_mode = raw.parse()?,
            "busy_timeout" => {
                self.busy_timeout = raw.parse().map_err(|_| invalid("busy_timeout"))?;
            }
            "synchronous" => self.synchronous = raw.parse()?,
            "cache_size" => self.cache_size = raw.parse().map_err(|_| invalid("cache_size"))?,
            "temp_store" => self.temp_store = raw.parse()?,
            "foreign_keys" => {
                self.foreign_keys = parse_flag(raw).ok_or_else(|| invalid("foreign_keys"))?;
            }
            other => return Err(CoreError::UnknownSetting(other.to_string())),
        }
        Ok(())
    }

    /// Renders the `PRAGMA` statements applied when a connection opens.
    pub fn pragma_statements(&self) -> Vec<String> {
        vec![
            format!("PRAGMA journal_mode = {};", self.journal_mode.pragma_value()),
            format!("PRAGMA busy_timeout = {};", self.busy_timeout),
            format!("PRAGMA synchronous = {};", self.synchronous.pragma_value()),
            format!("PRAGMA cache_size = {};", self.cache_size),
            format!("PRAGMA temp_store = {};", self.temp_store.pragma_value()),
            format!(
                "PRAGMA foreign_keys = {};",
                if self.foreign_keys { "ON" } else { "OFF" }
            ),
        ]
    }
}

fn scalar_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}
