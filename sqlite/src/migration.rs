//! Additive schema migration.
//!
//! [`Database::migrate`] compares the pending registrations with the live
//! table and only ever adds: the table when it does not exist, missing
//! columns, and missing derived indices. Existing columns are never altered
//! or type-checked, so running it again is a no-op.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info};

use crate::Database;
use crate::error::{Result, SqliteError};
use crate::schema::{INDEX_OWNER_SQL, add_column_sql, create_table_sql};
use crate::value::bind;

/// Report of a migration run, listing the DDL that was applied.
///
/// Returned by [`Database::migrate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Table the migration targeted.
    pub table: String,
    /// Whether the table was created by this run.
    pub created_table: bool,
    /// Columns added, in registration order. Includes the columns of a
    /// newly created table.
    pub columns_added: Vec<String>,
    /// Indices created.
    pub indices_created: Vec<String>,
}

impl MigrationReport {
    fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// Returns `true` if any DDL was applied.
    pub fn has_changes(&self) -> bool {
        self.created_table || !self.columns_added.is_empty() || !self.indices_created.is_empty()
    }
}

impl Database {
    /// Applies the pending column registrations to the current table.
    ///
    /// Creates the table if it has no live columns, otherwise adds every
    /// registered column it lacks, then creates every missing derived
    /// index. On success the registrations are cleared and the table
    /// context is kept. The write batch holding the DDL is committed
    /// before returning.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::SetTable`](crate::SqliteError::SetTable) if no
    /// table is selected and [`SqliteError::QueryError`](crate::SqliteError::QueryError)
    /// if a DDL statement fails, or if a derived index name is already taken
    /// by another table. DDL applied before the failure stays in
    /// place and the registrations are kept, so the call can be retried.
    pub fn migrate(&mut self) -> Result<MigrationReport> {
        if self.registry.is_empty() {
            debug!("no pending columns; nothing to migrate");
            return Ok(MigrationReport::new(self.registry.table().unwrap_or_default()));
        }

        let table = self.registry.table()?.to_string();
        let mut report = MigrationReport::new(&table);
        let pending = self.registry.columns().to_vec();

        let live_columns = lowercase_set(self.column_names()?);
        if live_columns.is_empty() {
            self.run_ddl(&create_table_sql(&table, &pending))?;
            report.created_table = true;
            report.columns_added = pending.iter().map(|c| c.name.clone()).collect();
        } else {
            for column in pending
                .iter()
                .filter(|c| !live_columns.contains(&c.name.to_ascii_lowercase()))
            {
                self.run_ddl(&add_column_sql(&table, column))?;
                report.columns_added.push(column.name.clone());
            }
        }

        let live_indices = lowercase_set(self.index_names()?);
        for index in self.registry.indices()? {
            if live_indices.contains(&index.name.to_ascii_lowercase()) {
                continue;
            }
            // Index names are shared by every table in the file.
            if let Some(owner) = self.index_owner(&index.name)? {
                return Err(SqliteError::query(
                    format!("Index {} already exists on table {owner}", index.name),
                    &index.create_sql(),
                ));
            }
            self.run_ddl(&index.create_sql())?;
            report.indices_created.push(index.name);
        }

        self.complete_write_transaction()?;
        self.registry.clear();

        info!(
            table = %report.table,
            created_table = report.created_table,
            columns_added = report.columns_added.len(),
            indices_created = report.indices_created.len(),
            "migration complete"
        );
        Ok(report)
    }

    fn run_ddl(&mut self, sql: &str) -> Result<()> {
        info!(%sql, "applying schema change");
        self.query(sql, false, &[])?;
        Ok(())
    }

    fn index_owner(&mut self, name: &str) -> Result<Option<String>> {
        let rows = self
            .query(INDEX_OWNER_SQL, true, &[bind(":name", name)])?
            .into_rows();
        Ok(rows
            .first()
            .and_then(|row| row.get("tbl_name"))
            .and_then(|owner| owner.as_str())
            .map(str::to_string))
    }
}

fn lowercase_set(names: Vec<String>) -> HashSet<String> {
    names.into_iter().map(|name| name.to_ascii_lowercase()).collect()
}
