//! The [`Database`] handle tying connection, transactions and registry together.

use std::path::Path;

use litegate_core::{ColumnDeclaration, ColumnType, EngineConfig, classify};
use rusqlite::Connection;
use tracing::{debug, warn};

use crate::error::Result;
use crate::handle::{EngineHandle, resolve_location};
use crate::registry::SchemaRegistry;
use crate::schema::{LiveColumn, LiveIndex, index_list_sql, table_info_sql};
use crate::transaction::{TransactionCoordinator, TransactionState, TransactionStats};

/// A single SQLite database file with automatic write batching and
/// additive schema migration.
///
/// The connection is opened on first use. Writes are grouped into one
/// immediate transaction that the next read commits. Dropping the handle
/// commits any open batch.
///
/// # Examples
///
/// ```no_run
/// use litegate_core::{ColumnType, EngineConfig};
/// use litegate_sqlite::{Database, bind};
///
/// let mut db = Database::new("/var/lib/app/users", EngineConfig::default()).unwrap();
/// db.set_table_name("users").unwrap();
/// db.register_column("email", ColumnType::Text, false, true, true, true).unwrap();
/// db.migrate().unwrap();
///
/// db.query("INSERT INTO users (email) VALUES (:email)", false, &[bind(":email", "a@b.c")])
///     .unwrap();
/// let rows = db.query("SELECT * FROM users", true, &[]).unwrap().into_rows();
/// println!("{} users", rows.len());
/// ```
#[derive(Debug)]
pub struct Database {
    pub(crate) handle: EngineHandle,
    pub(crate) transactions: TransactionCoordinator,
    pub(crate) registry: SchemaRegistry,
}

impl Database {
    /// Creates a handle for `<directory of path>/<stem of path>.sqlite3`.
    ///
    /// No I/O happens beyond checking that the directory exists.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::DatabasePath`](crate::SqliteError::DatabasePath)
    /// if the directory does not exist.
    pub fn new(path: impl AsRef<Path>, config: EngineConfig) -> Result<Self> {
        let location = resolve_location(path.as_ref())?;
        debug!(path = %location.display(), "database handle created");
        Ok(Self {
            handle: EngineHandle::new(location, config),
            transactions: TransactionCoordinator::default(),
            registry: SchemaRegistry::default(),
        })
    }

    /// Like [`Database::new`], starting from the default configuration with
    /// `overrides` applied. Unusable overrides are skipped.
    pub fn with_overrides<I, K>(path: impl AsRef<Path>, overrides: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, serde_json::Value)>,
        K: AsRef<str>,
    {
        Self::new(path, EngineConfig::from_overrides(overrides))
    }

    /// Resolved database file.
    pub fn location(&self) -> &Path {
        self.handle.location()
    }

    pub fn config(&self) -> &EngineConfig {
        self.handle.config()
    }

    /// Opens the connection now instead of on first use.
    pub fn open(&mut self) -> Result<()> {
        self.handle.open()?;
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_open()
    }

    /// Commits any open write batch and closes the connection.
    ///
    /// The handle stays usable; the next operation reopens the file.
    pub fn close(&mut self) -> Result<()> {
        self.complete_write_transaction()?;
        self.handle.close()
    }

    /// Returns the underlying connection, opening it if needed.
    ///
    /// Statements run here bypass classification and write batching.
    pub fn connection(&mut self) -> Result<&Connection> {
        self.handle.open()
    }

    // -- transactions --

    /// Begins an immediate write transaction.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::BeginTransaction`](crate::SqliteError::BeginTransaction)
    /// if the engine rejects it, including when a batch is already open.
    pub fn begin_write_transaction(&mut self) -> Result<()> {
        let conn = self.handle.open()?;
        self.transactions.begin(conn)
    }

    /// Commits the open write batch. No-op when none is open.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::CompleteTransaction`](crate::SqliteError::CompleteTransaction)
    /// if the engine rejects the commit; the batch is closed either way.
    pub fn complete_write_transaction(&mut self) -> Result<()> {
        if self.transactions.state() == TransactionState::Idle {
            return Ok(());
        }
        let conn = self.handle.open()?;
        self.transactions.complete(conn)
    }

    pub fn transaction_state(&self) -> TransactionState {
        self.transactions.state()
    }

    pub fn transaction_stats(&self) -> TransactionStats {
        self.transactions.stats()
    }

    /// Returns `true` if `sql` would be run inside the write batch.
    pub fn is_write_statement(&self, sql: &str) -> bool {
        classify(sql).is_write()
    }

    // -- table context and registrations --

    /// Selects the table used by registration, migration and introspection.
    ///
    /// Pending registrations are kept and will target the new table.
    pub fn set_table_name(&mut self, name: &str) -> Result<&str> {
        self.registry.set_table(name)
    }

    pub fn current_table_name(&self) -> Result<&str> {
        self.registry.table()
    }

    /// Registers a column for the next [`Database::migrate`].
    ///
    /// `indexed` derives an `idx_<name>` index, unique if `unique` is set.
    /// Registering a name again replaces the earlier declaration.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::SetTable`](crate::SqliteError::SetTable) if no
    /// table is selected, or a core error if `name` is not a valid identifier.
    pub fn register_column(
        &mut self,
        name: &str,
        column_type: ColumnType,
        nullable: bool,
        post_required: bool,
        indexed: bool,
        unique: bool,
    ) -> Result<()> {
        let mut column = ColumnDeclaration::new(name, column_type).post_required(post_required);
        if !nullable {
            column = column.not_null();
        }
        if indexed {
            column = column.indexed(unique);
        }
        self.register(column)
    }

    /// Registers a prepared declaration. See [`Database::register_column`].
    pub fn register(&mut self, column: ColumnDeclaration) -> Result<()> {
        debug!(column = %column.name, column_type = %column.column_type, "registering column");
        self.registry.register(column)
    }

    /// Returns `true` if `name` is pending registration. Live columns are not consulted.
    pub fn has_column(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    pub fn registered_columns(&self) -> &[ColumnDeclaration] {
        self.registry.columns()
    }

    // -- introspection --

    /// Live columns of the current table; empty if the table does not exist.
    pub fn columns(&mut self) -> Result<Vec<LiveColumn>> {
        let sql = table_info_sql(self.registry.table()?);
        let rows = self.query(&sql, true, &[])?.into_rows();
        Ok(rows.iter().filter_map(LiveColumn::from_row).collect())
    }

    /// Live indices of the current table.
    pub fn indices(&mut self) -> Result<Vec<LiveIndex>> {
        let sql = index_list_sql(self.registry.table()?);
        let rows = self.query(&sql, true, &[])?.into_rows();
        Ok(rows.iter().filter_map(LiveIndex::from_row).collect())
    }

    pub fn column_names(&mut self) -> Result<Vec<String>> {
        Ok(self.columns()?.into_iter().map(|c| c.name).collect())
    }

    pub fn index_names(&mut self) -> Result<Vec<String>> {
        Ok(self.indices()?.into_iter().map(|i| i.name).collect())
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if let Err(err) = self.complete_write_transaction() {
            warn!(error = %err, path = %self.location().display(), "failed to commit write batch on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SqliteError;

    #[test]
    fn test_new_rejects_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = Database::new(dir.path().join("missing/db"), EngineConfig::default()).unwrap_err();
        assert!(matches!(err, SqliteError::DatabasePath(_)));
        assert!(err.to_string().starts_with("Path provided is not a valid directory"));
    }

    #[test]
    fn test_table_required_for_registration() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = Database::new(dir.path().join("db"), EngineConfig::default()).unwrap();
        let err = db
            .register_column("uuid", ColumnType::Text, false, true, false, false)
            .unwrap_err();
        assert_eq!(err.to_string(), "Table name has not been set");
        assert!(matches!(db.columns(), Err(SqliteError::SetTable)));
    }

    #[test]
    fn test_register_column_flags() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = Database::new(dir.path().join("db"), EngineConfig::default()).unwrap();
        db.set_table_name("example").unwrap();
        db.register_column("uuid", ColumnType::Text, false, false, true, true)
            .unwrap();

        let column = &db.registered_columns()[0];
        assert!(!column.nullable);
        assert!(!column.post_required);
        assert!(column.indexed && column.unique);
        assert!(db.has_column("uuid"));
        assert!(!db.has_column("id"));
    }

    #[test]
    fn test_columns_of_missing_table_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = Database::new(dir.path().join("db"), EngineConfig::default()).unwrap();
        db.set_table_name("nothing_here").unwrap();
        assert!(db.columns().unwrap().is_empty());
        assert!(db.index_names().unwrap().is_empty());
    }

    #[test]
    fn test_close_commits_open_batch() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = Database::new(dir.path().join("db"), EngineConfig::default()).unwrap();
        db.query("CREATE TABLE t (x INTEGER)", false, &[]).unwrap();
        assert_eq!(db.transaction_state(), TransactionState::Open);

        db.close().unwrap();
        assert!(!db.is_open());
        assert_eq!(db.transaction_state(), TransactionState::Idle);
        assert_eq!(db.transaction_stats().committed, 1);

        let rows = db.query("SELECT name FROM sqlite_master", true, &[]).unwrap();
        assert_eq!(rows.rows().len(), 1);
    }

    #[test]
    fn test_explicit_begin_sets_open() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = Database::new(dir.path().join("db"), EngineConfig::default()).unwrap();
        db.begin_write_transaction().unwrap();
        assert_eq!(db.transaction_state(), TransactionState::Open);
        assert!(matches!(
            db.begin_write_transaction(),
            Err(SqliteError::BeginTransaction(_))
        ));
        db.complete_write_transaction().unwrap();
        assert_eq!(db.transaction_state(), TransactionState::Idle);
    }

    #[test]
    fn test_is_write_statement() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("db"), EngineConfig::default()).unwrap();
        assert!(db.is_write_statement("DELETE FROM t"));
        assert!(!db.is_write_statement("SELECT 'DELETE' FROM t"));
    }
}
