//! Lazily opened engine connection.
//!
//! The database file always lives at `<directory>/<file stem>.sqlite3`. The
//! parent directory is checked when the handle is created; the file itself
//! is created by the engine on first open.

use std::path::{Path, PathBuf};

use litegate_core::EngineConfig;
use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{Result, SqliteError};

/// Extension of every database file.
pub const DATABASE_EXTENSION: &str = "sqlite3";

/// Resolves the database file for `path`, checking that its directory exists.
///
/// # Errors
///
/// Returns [`SqliteError::DatabasePath`] if the parent directory does not
/// exist or the path has no file name.
pub fn resolve_location(path: &Path) -> Result<PathBuf> {
    let invalid = || SqliteError::DatabasePath(path.to_path_buf());

    let parent = match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Path::new("."),
        Some(parent) => parent,
        None => return Err(invalid()),
    };
    let stem = path.file_stem().ok_or_else(invalid)?;
    if !parent.is_dir() {
        return Err(invalid());
    }

    Ok(parent.join(format!("{}.{DATABASE_EXTENSION}", stem.to_string_lossy())))
}

/// Owns the connection and the configuration applied to it.
#[derive(Debug)]
pub(crate) struct EngineHandle {
    location: PathBuf,
    config: EngineConfig,
    conn: Option<Connection>,
}

impl EngineHandle {
    pub(crate) fn new(location: PathBuf, config: EngineConfig) -> Self {
        Self {
            location,
            config,
            conn: None,
        }
    }

    pub(crate) fn location(&self) -> &Path {
        &self.location
    }

    pub(crate) fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Returns the connection, opening it and applying pragmas on first use.
    pub(crate) fn open(&mut self) -> Result<&Connection> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => connect(&self.location, &self.config)?,
        };
        Ok(&*self.conn.insert(conn))
    }

    /// Closes the connection if it is open.
    pub(crate) fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, source)| SqliteError::ConnectError {
                path: self.location.clone(),
                source,
            })?;
            info!(path = %self.location.display(), "closed database");
        }
        Ok(())
    }
}

fn connect(location: &Path, config: &EngineConfig) -> Result<Connection> {
    let connect_error = |source: rusqlite::Error| SqliteError::ConnectError {
        path: location.to_path_buf(),
        source,
    };

    let conn = Connection::open(location).map_err(connect_error)?;
    for pragma in config.pragma_statements() {
        debug!(%pragma, "applying engine pragma");
        conn.execute_batch(&pragma).map_err(connect_error)?;
    }

    info!(path = %location.display(), journal_mode = config.journal_mode.pragma_value(), "opened database");
    Ok(conn)
}
