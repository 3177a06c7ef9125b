//! Statement execution with bind tuples.
//!
//! Every statement is classified first so the transaction coordinator can
//! open or commit the write batch before it runs.
//!
//! # Example
//!
//! ```no_run
//! use litegate_core::EngineConfig;
//! use litegate_sqlite::{Database, bind};
//!
//! let mut db = Database::new("/tmp/example", EngineConfig::default()).unwrap();
//! db.query(
//!     "INSERT INTO example (uuid) VALUES (:uuid)",
//!     false,
//!     &[bind(":uuid", "abc")],
//! )
//! .unwrap();
//!
//! let rows = db
//!     .query("SELECT * FROM example WHERE uuid = ?", true, &[bind(1, "abc")])
//!     .unwrap()
//!     .into_rows();
//! assert_eq!(rows.len(), 1);
//! ```

use litegate_core::classify;
use rusqlite::Connection;
use tracing::debug;

use crate::Database;
use crate::error::{Result, SqliteError, engine_message};
use crate::value::{BindParam, Placeholder, Row, Value};

/// Result of [`Database::query`].
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// Materialized result rows.
    Rows(Vec<Row>),
    /// The statement ran to completion without collecting rows.
    Executed {
        /// Rows changed by the statement; 0 for read-only statements.
        changes: u64,
        /// Rowid of the most recent successful INSERT on the connection.
        last_insert_rowid: i64,
    },
}

impl QueryOutcome {
    /// Returns the rows, or an empty slice for [`QueryOutcome::Executed`].
    pub fn rows(&self) -> &[Row] {
        match self {
            Self::Rows(rows) => rows,
            Self::Executed { .. } => &[],
        }
    }

    pub fn into_rows(self) -> Vec<Row> {
        match self {
            Self::Rows(rows) => rows,
            Self::Executed { .. } => Vec::new(),
        }
    }

    /// Returns the change count, if the statement was only executed.
    pub fn changes(&self) -> Option<u64> {
        match self {
            Self::Rows(_) => None,
            Self::Executed { changes, .. } => Some(*changes),
        }
    }
}

impl Database {
    /// Runs `sql` with the given bind tuples.
    ///
    /// Each tuple is `[target, value]` or `[target, value, hint]`, see
    /// [`bind`](crate::bind) and [`bind_as`](crate::bind_as). Writes are
    /// batched into the open write transaction; a read commits it first.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::QueryError`] if the statement fails to
    /// prepare, a tuple is malformed, or the engine rejects binding or
    /// execution. Transaction boundary failures are returned as
    /// [`SqliteError::BeginTransaction`] or
    /// [`SqliteError::CompleteTransaction`].
    pub fn query(&mut self, sql: &str, return_rows: bool, params: &[Vec<Value>]) -> Result<QueryOutcome> {
        let kind = classify(sql);
        let conn = self.handle.open()?;
        self.transactions.route(conn, kind)?;

        debug!(%kind, params = params.len(), sql, "executing statement");
        execute_statement(conn, sql, return_rows, params)
    }
}

fn execute_statement(
    conn: &Connection,
    sql: &str,
    return_rows: bool,
    params: &[Vec<Value>],
) -> Result<QueryOutcome> {
    let engine_error = |err: rusqlite::Error| SqliteError::query(engine_message(&err), sql);

    let mut stmt = conn.prepare(sql).map_err(|err| {
        SqliteError::query(
            format!("Unable to prepare statement: {}", engine_message(&err)),
            sql,
        )
    })?;

    for tuple in params {
        let param = BindParam::from_tuple(tuple).ok_or_else(|| SqliteError::params(sql))?;
        let index = match &param.target {
            Placeholder::Named(name) => stmt
                .parameter_index(name)
                .map_err(engine_error)?
                .ok_or_else(|| SqliteError::query(format!("Unknown placeholder {name}"), sql))?,
            Placeholder::Index(index) => *index,
        };
        stmt.raw_bind_parameter(index, &param.value)
            .map_err(engine_error)?;
    }

    let readonly = stmt.readonly();
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut collected = Vec::new();
    {
        let mut rows = stmt.raw_query();
        while let Some(row) = rows.next().map_err(engine_error)? {
            if !return_rows {
                continue;
            }
            let mut materialized = Row::with_capacity(columns.len());
            for (i, column) in columns.iter().enumerate() {
                let value = row.get_ref(i).map_err(engine_error)?;
                materialized.push(column.clone(), Value::from(value));
            }
            collected.push(materialized);
        }
    }

    if return_rows {
        Ok(QueryOutcome::Rows(collected))
    } else {
        Ok(QueryOutcome::Executed {
            changes: if readonly { 0 } else { conn.changes() },
            last_insert_rowid: conn.last_insert_rowid(),
        })
    }
}
