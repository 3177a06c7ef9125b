//! SQLite access layer with automatic write batching and additive migration.
//!
//! A [`Database`] owns one lazily opened connection to
//! `<directory>/<name>.sqlite3`, configured from an
//! [`EngineConfig`](litegate_core::EngineConfig) (WAL journaling by default).
//!
//! # Architecture
//!
//! - **`handle`**: location resolution and the lazily opened connection
//! - **`transaction`**: write batching; consecutive writes share one
//!   `BEGIN IMMEDIATE` transaction, the next read commits it
//! - **`registry`** and **`migration`**: pending column declarations and
//!   the additive migration that applies them
//! - **`schema`**: DDL rendering and live schema introspection
//! - **`query`**: statement execution with bind tuples
//!
//! # Quick start
//!
//! ```no_run
//! use litegate_core::{ColumnType, EngineConfig};
//! use litegate_sqlite::{Database, TypeHint, bind, bind_as};
//!
//! let mut db = Database::new("./example", EngineConfig::default()).unwrap();
//! db.set_table_name("example").unwrap();
//! db.register_column("uuid", ColumnType::Text, false, true, true, true).unwrap();
//! db.register_column("visits", ColumnType::Integer, true, false, false, false).unwrap();
//! db.migrate().unwrap();
//!
//! for i in 0..100 {
//!     db.query(
//!         "INSERT INTO example (uuid, visits) VALUES (:uuid, :visits)",
//!         false,
//!         &[bind(":uuid", format!("user-{i}")), bind_as(":visits", "0", TypeHint::Integer)],
//!     )
//!     .unwrap();
//! }
//!
//! // The read commits the 100 inserts as one transaction.
//! let rows = db
//!     .query("SELECT COUNT(*) AS total FROM example", true, &[])
//!     .unwrap()
//!     .into_rows();
//! println!("{}", rows[0]["total"]);
//! ```

mod database;
mod error;
mod handle;
mod migration;
mod query;
mod registry;
mod schema;
mod transaction;
mod value;

pub use database::Database;
pub use error::{CommitOutcome, PARAMS_ERROR, Result, SqliteError};
pub use handle::{DATABASE_EXTENSION, resolve_location};
pub use migration::MigrationReport;
pub use query::QueryOutcome;
pub use schema::{LiveColumn, LiveIndex};
pub use transaction::{TransactionState, TransactionStats};
pub use value::{Placeholder, Row, TypeHint, Value, bind, bind_as};
