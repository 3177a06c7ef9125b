//! DDL rendering and live schema introspection.
//!
//! Every table is created with an `id INTEGER PRIMARY KEY AUTOINCREMENT`
//! column ahead of the registered columns. Identifiers are always quoted,
//! which also keeps table names out of statement classification.

use litegate_core::{ColumnDeclaration, quote_identifier};
use serde::Serialize;

use crate::value::{Row, Value};

/// Renders `CREATE TABLE IF NOT EXISTS` for `table` with `columns` after the `id` column.
pub(crate) fn create_table_sql(table: &str, columns: &[ColumnDeclaration]) -> String {
    let mut definitions = vec!["\"id\" INTEGER PRIMARY KEY AUTOINCREMENT".to_string()];
    definitions.extend(columns.iter().map(ColumnDeclaration::definition));
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_identifier(table),
        definitions.join(", ")
    )
}

pub(crate) fn add_column_sql(table: &str, column: &ColumnDeclaration) -> String {
    format!(
        "ALTER TABLE {} ADD COLUMN {}",
        quote_identifier(table),
        column.definition()
    )
}

pub(crate) fn table_info_sql(table: &str) -> String {
    format!("PRAGMA table_info({})", quote_identifier(table))
}

pub(crate) fn index_list_sql(table: &str) -> String {
    format!("PRAGMA index_list({})", quote_identifier(table))
}

/// Table owning the index bound to `:name`, across the whole database file.
pub(crate) const INDEX_OWNER_SQL: &str =
    "SELECT tbl_name FROM sqlite_master WHERE type = 'index' AND name = :name COLLATE NOCASE";

/// A column as reported by the engine for an existing table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveColumn {
    /// Position in the table.
    pub cid: i64,
    pub name: String,
    /// Declared type as written in the DDL; may be empty.
    pub column_type: String,
    pub not_null: bool,
    /// Default value expression, if any.
    pub default_value: Option<String>,
    /// Position within the primary key, `0` if not part of it.
    pub primary_key: i64,
}

impl LiveColumn {
    /// Reads one `PRAGMA table_info` row. `None` if the row is not shaped like one.
    pub(crate) fn from_row(row: &Row) -> Option<Self> {
        Some(Self {
            cid: row.get("cid")?.as_i64()?,
            name: row.get("name")?.as_str()?.to_string(),
            column_type: row.get("type")?.as_str().unwrap_or_default().to_string(),
            not_null: row.get("notnull")?.as_i64()? != 0,
            default_value: row.get("dflt_value").and_then(text_of),
            primary_key: row.get("pk")?.as_i64()?,
        })
    }
}

/// An index as reported by the engine for an existing table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveIndex {
    pub seq: i64,
    pub name: String,
    pub unique: bool,
    /// `c` for `CREATE INDEX`, `u` for a UNIQUE constraint, `pk` for the primary key.
    pub origin: String,
    pub partial: bool,
}

impl LiveIndex {
    /// Reads one `PRAGMA index_list` row. `None` if the row is not shaped like one.
    pub(crate) fn from_row(row: &Row) -> Option<Self> {
        Some(Self {
            seq: row.get("seq")?.as_i64()?,
            name: row.get("name")?.as_str()?.to_string(),
            unique: row.get("unique")?.as_i64()? != 0,
            origin: row.get("origin").and_then(text_of).unwrap_or_default(),
            partial: row
                .get("partial")
                .and_then(Value::as_i64)
                .is_some_and(|p| p != 0),
        })
    }
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
