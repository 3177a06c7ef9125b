//! Pending column registrations for the selected table.

use litegate_core::{ColumnDeclaration, IndexDeclaration, validate_identifier};

use crate::error::{Result, SqliteError};

/// Table context plus the columns waiting for the next migration.
///
/// Index declarations are derived from the indexed columns on demand, so
/// they always target the current table and disappear with their column.
#[derive(Debug, Default)]
pub(crate) struct SchemaRegistry {
    table: Option<String>,
    columns: Vec<ColumnDeclaration>,
}

impl SchemaRegistry {
    pub(crate) fn set_table(&mut self, name: &str) -> Result<&str> {
        validate_identifier(name)?;
        Ok(self.table.insert(name.to_string()).as_str())
    }

    pub(crate) fn table(&self) -> Result<&str> {
        self.table.as_deref().ok_or(SqliteError::SetTable)
    }

    /// Stores `column`, replacing an earlier registration of the same name in place.
    ///
    /// Names compare ASCII case-insensitively, as the engine does.
    pub(crate) fn register(&mut self, column: ColumnDeclaration) -> Result<()> {
        self.table()?;
        validate_identifier(&column.name)?;

        match self
            .columns
            .iter_mut()
            .find(|c| c.name.eq_ignore_ascii_case(&column.name))
        {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub(crate) fn columns(&self) -> &[ColumnDeclaration] {
        &self.columns
    }

    pub(crate) fn indices(&self) -> Result<Vec<IndexDeclaration>> {
        let table = self.table()?;
        Ok(self
            .columns
            .iter()
            .filter_map(|column| column.index_on(table))
            .collect())
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Drops pending registrations; the table context is kept.
    pub(crate) fn clear(&mut self) {
        self.columns.clear();
    }
}
