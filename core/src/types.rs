//! Column and index declarations for additive migrations.
//!
//! A [`ColumnDeclaration`] describes one column a caller wants to exist on
//! the selected table. Indexed columns derive an [`IndexDeclaration`] named
//! `idx_<column>`. Both render the SQL fragments the migration engine emits.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Prefix of every derived index name.
pub const INDEX_PREFIX: &str = "idx_";

/// Native column types understood by the engine.
///
/// # Examples
///
/// ```
/// use litegate_core::ColumnType;
///
/// let ty: ColumnType = "text".parse().unwrap();
/// assert_eq!(ty, ColumnType::Text);
/// assert_eq!(ty.sql_name(), "TEXT");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    /// UTF-8 text, collated case-insensitively.
    Text,
    /// Signed 64-bit integer.
    Integer,
    /// 64-bit float.
    Real,
    /// Raw bytes.
    Blob,
    /// Numeric affinity.
    Numeric,
}

impl ColumnType {
    /// All supported column types.
    pub const ALL: [ColumnType; 5] = [
        Self::Text,
        Self::Integer,
        Self::Real,
        Self::Blob,
        Self::Numeric,
    ];

    /// Returns the type name as written in DDL.
    pub fn sql_name(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Blob => "BLOB",
            Self::Numeric => "NUMERIC",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

impl FromStr for ColumnType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.sql_name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::UnknownColumnType(s.to_string()))
    }
}

/// Validates that an identifier contains only alphanumeric characters and underscores.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(CoreError::InvalidIdentifier(name.to_string()));
    }
    Ok(())
}

/// Wraps an identifier in double quotes, doubling any embedded quote.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// A pending column registration.
///
/// # Examples
///
/// ```
/// use litegate_core::{ColumnDeclaration, ColumnType};
///
/// let uuid = ColumnDeclaration::new("uuid", ColumnType::Text).not_null().indexed(true);
/// assert_eq!(uuid.definition(), r#""uuid" TEXT NOT NULL COLLATE NOCASE"#);
/// assert_eq!(uuid.index_name().as_deref(), Some("idx_uuid"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDeclaration {
    /// Column name.
    pub name: String,
    /// Declared type.
    pub column_type: ColumnType,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Caller metadata: the column must be supplied on insert.
    pub post_required: bool,
    /// Whether an `idx_<name>` index is derived.
    pub indexed: bool,
    /// Whether the derived index is unique.
    pub unique: bool,
}

impl ColumnDeclaration {
    /// Creates a nullable, non-indexed column that is required on insert.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
            post_required: true,
            indexed: false,
            unique: false,
        }
    }

    /// Marks the column `NOT NULL`.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Sets whether the column is required on insert.
    pub fn post_required(mut self, required: bool) -> Self {
        self.post_required = required;
        self
    }

    /// Requests a derived `idx_<name>` index.
    pub fn indexed(mut self, unique: bool) -> Self {
        self.indexed = true;
        self.unique = unique;
        self
    }

    /// Renders `<name> <TYPE> [NOT NULL] [COLLATE NOCASE]`.
    pub fn definition(&self) -> String {
        let mut sql = format!("{} {}", quote_identifier(&self.name), self.column_type);
        if !self.nullable {
            sql.push_str(" NOT NULL");
        }
        if self.column_type == ColumnType::Text {
            sql.push_str(" COLLATE NOCASE");
        }
        sql
    }

    /// Returns the derived index name, if the column is indexed.
    pub fn index_name(&self) -> Option<String> {
        self.indexed.then(|| format!("{INDEX_PREFIX}{}", self.name))
    }

    /// Derives the index declaration on `table`, if the column is indexed.
    pub fn index_on(&self, table: &str) -> Option<IndexDeclaration> {
        self.index_name().map(|name| IndexDeclaration {
            name,
            unique: self.unique,
            table: table.to_string(),
            column: self.name.clone(),
        })
    }
}

/// An index derived from an indexed [`ColumnDeclaration`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDeclaration {
    /// `idx_<column>`.
    pub name: String,
    /// Whether the index enforces uniqueness.
    pub unique: bool,
    /// Indexed table.
    pub table: String,
    /// Indexed column.
    pub column: String,
}

impl IndexDeclaration {
    /// Renders `CREATE [UNIQUE] INDEX IF NOT EXISTS ...`.
    pub fn create_sql(&self) -> String {
        let unique = if self.unique { "UNIQUE " } else { "" };
        format!(
            "CREATE {unique}INDEX IF NOT EXISTS {} ON {}({})",
            quote_identifier(&self.name),
            quote_identifier(&self.table),
            quote_identifier(&self.column)
        )
    }
}
