//! Error types for core operations.
//!
//! Covers configuration loading and identifier/type validation.

use thiserror::Error;

/// Errors that can occur in engine-agnostic operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Table or column name contains invalid characters.
    #[error("invalid identifier '{0}': must contain only alphanumeric characters and underscores")]
    InvalidIdentifier(String),

    /// Configuration value that does not parse for its key.
    #[error("invalid value '{value}' for setting '{key}'")]
    InvalidSetting {
        /// Setting name.
        key: &'static str,
        /// Rejected raw value.
        value: String,
    },

    /// Configuration key that is not a recognized engine parameter.
    #[error("unknown setting '{0}'")]
    UnknownSetting(String),

    /// Column type outside the supported vocabulary.
    #[error("unknown column type '{0}'")]
    UnknownColumnType(String),
}

/// Convenience alias for results with [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;
