//! Engine-agnostic building blocks for the litegate SQLite access layer.
//!
//! - [`classify`] maps raw SQL text to a [`StatementKind`], which drives the
//!   automatic write-transaction batching in `litegate-sqlite`.
//! - [`ColumnDeclaration`] and [`IndexDeclaration`] describe additive schema
//!   changes and render their DDL fragments.
//! - [`EngineConfig`] holds the engine parameters applied on connect, with
//!   defaults, override maps and YAML loading.
//!
//! # Example
//!
//! ```
//! use litegate_core::*;
//!
//! assert_eq!(classify("DELETE FROM users WHERE id = 1"), StatementKind::Write);
//!
//! let column = ColumnDeclaration::new("email", ColumnType::Text).not_null().indexed(true);
//! let index = column.index_on("users").unwrap();
//! assert_eq!(index.name, "idx_email");
//!
//! let config = EngineConfig::default();
//! assert_eq!(config.journal_mode, JournalMode::Wal);
//! ```

mod classify;
mod config;
mod error;
mod types;

pub use classify::{StatementKind, WRITE_KEYWORDS, classify};
pub use config::{
    DEFAULT_BUSY_TIMEOUT_MS, DEFAULT_CACHE_SIZE, EngineConfig, JournalMode, Synchronous, TempStore,
};
pub use error::{CoreError, Result};
pub use types::{
    ColumnDeclaration, ColumnType, INDEX_PREFIX, IndexDeclaration, quote_identifier,
    validate_identifier,
};
