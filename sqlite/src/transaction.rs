//! Write-transaction boundary coordination.
//!
//! Consecutive writes are batched into one `BEGIN IMMEDIATE` transaction.
//! The first read after a batch commits it, so every read observes all
//! previously issued writes.
//!
//! | statement | state  | action                          |
//! |-----------|--------|---------------------------------|
//! | write     | idle   | begin, then execute inside       |
//! | write     | open   | execute inside                   |
//! | read      | open   | commit, then execute outside     |
//! | read      | idle   | execute                          |

use litegate_core::StatementKind;
use rusqlite::Connection;
use tracing::{debug, warn};

use crate::error::{CommitOutcome, Result, SqliteError};

/// Whether a write transaction is open on the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionState {
    /// No transaction; statements autocommit.
    #[default]
    Idle,
    /// A write transaction is open and collecting writes.
    Open,
}

/// Counters of transaction boundaries issued on one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransactionStats {
    /// Successful `BEGIN IMMEDIATE` statements.
    pub begun: u64,
    /// Successful `COMMIT` statements.
    pub committed: u64,
    /// Rejected `COMMIT` statements.
    pub failed_commits: u64,
}

#[derive(Debug, Default)]
pub(crate) struct TransactionCoordinator {
    state: TransactionState,
    stats: TransactionStats,
}

impl TransactionCoordinator {
    pub(crate) fn state(&self) -> TransactionState {
        self.state
    }

    pub(crate) fn stats(&self) -> TransactionStats {
        self.stats
    }

    /// Opens or commits the batch as required before running a statement of `kind`.
    pub(crate) fn route(&mut self, conn: &Connection, kind: StatementKind) -> Result<()> {
        // The engine can end a transaction on its own (e.g. a raw COMMIT).
        if self.state == TransactionState::Open && conn.is_autocommit() {
            debug!("engine left the write transaction; coordinator back to idle");
            self.state = TransactionState::Idle;
        }

        match (kind, self.state) {
            (StatementKind::Write, TransactionState::Idle) => self.begin(conn),
            (StatementKind::Read, TransactionState::Open) => self.complete(conn),
            (StatementKind::Write, TransactionState::Open)
            | (StatementKind::Read, TransactionState::Idle) => Ok(()),
        }
    }

    /// Issues `BEGIN IMMEDIATE TRANSACTION`.
    ///
    /// The statement is sent even when a transaction is already open, in
    /// which case the engine rejects it and the state stays open.
    pub(crate) fn begin(&mut self, conn: &Connection) -> Result<()> {
        conn.execute_batch("BEGIN IMMEDIATE TRANSACTION;")
            .map_err(SqliteError::BeginTransaction)?;
        self.state = TransactionState::Open;
        self.stats.begun += 1;
        debug!(begun = self.stats.begun, "began write transaction");
        Ok(())
    }

    /// Commits the open transaction. No-op when idle.
    ///
    /// On failure the coordinator is idle afterwards. If the engine still
    /// holds the transaction it is rolled back so both sides agree.
    pub(crate) fn complete(&mut self, conn: &Connection) -> Result<()> {
        if self.state == TransactionState::Idle {
            return Ok(());
        }
        self.state = TransactionState::Idle;

        match conn.execute_batch("COMMIT;") {
            Ok(()) => {
                self.stats.committed += 1;
                debug!(committed = self.stats.committed, "committed write transaction");
                Ok(())
            }
            Err(source) => {
                self.stats.failed_commits += 1;
                let outcome = if conn.is_autocommit() {
                    CommitOutcome::Indeterminate
                } else {
                    match conn.execute_batch("ROLLBACK;") {
                        Ok(()) => CommitOutcome::RolledBack,
                        Err(err) => {
                            warn!(error = %err, "rollback after failed commit also failed");
                            CommitOutcome::Indeterminate
                        }
                    }
                };
                warn!(error = %source, %outcome, "commit failed");
                Err(SqliteError::CompleteTransaction { outcome, source })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (x INTEGER);").unwrap();
        conn
    }

    #[test]
    fn test_write_opens_and_read_commits() {
        let conn = memory();
        let mut coordinator = TransactionCoordinator::default();

        coordinator.route(&conn, StatementKind::Write).unwrap();
        assert_eq!(coordinator.state(), TransactionState::Open);
        assert!(!conn.is_autocommit());

        coordinator.route(&conn, StatementKind::Write).unwrap();
        assert_eq!(coordinator.stats().begun, 1);

        coordinator.route(&conn, StatementKind::Read).unwrap();
        assert_eq!(coordinator.state(), TransactionState::Idle);
        assert!(conn.is_autocommit());
        assert_eq!(coordinator.stats().committed, 1);
    }

    #[test]
    fn test_read_while_idle_does_nothing() {
        let conn = memory();
        let mut coordinator = TransactionCoordinator::default();
        coordinator.route(&conn, StatementKind::Read).unwrap();
        assert_eq!(coordinator.state(), TransactionState::Idle);
        assert_eq!(coordinator.stats(), TransactionStats::default());
    }

    #[test]
    fn test_complete_when_idle_is_noop() {
        let conn = memory();
        let mut coordinator = TransactionCoordinator::default();
        coordinator.complete(&conn).unwrap();
        assert_eq!(coordinator.stats().committed, 0);
    }

    #[test]
    fn test_nested_begin_is_rejected_by_engine() {
        let conn = memory();
        let mut coordinator = TransactionCoordinator::default();
        coordinator.begin(&conn).unwrap();

        let err = coordinator.begin(&conn).unwrap_err();
        assert!(matches!(err, SqliteError::BeginTransaction(_)));
        assert_eq!(coordinator.state(), TransactionState::Open);

        coordinator.complete(&conn).unwrap();
        assert!(conn.is_autocommit());
    }

    #[test]
    fn test_external_commit_resyncs_state() {
        let conn = memory();
        let mut coordinator = TransactionCoordinator::default();
        coordinator.route(&conn, StatementKind::Write).unwrap();
        conn.execute_batch("COMMIT;").unwrap();

        coordinator.route(&conn, StatementKind::Read).unwrap();
        assert_eq!(coordinator.state(), TransactionState::Idle);
        assert_eq!(coordinator.stats().failed_commits, 0);
    }

    #[test]
    fn test_failed_commit_resets_to_idle() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             CREATE TABLE parent (id INTEGER PRIMARY KEY);
             CREATE TABLE child (
                 parent_id INTEGER REFERENCES parent(id) DEFERRABLE INITIALLY DEFERRED
             );",
        )
        .unwrap();
        let mut coordinator = TransactionCoordinator::default();

        coordinator.route(&conn, StatementKind::Write).unwrap();
        conn.execute("INSERT INTO child (parent_id) VALUES (42)", []).unwrap();

        let err = coordinator.complete(&conn).unwrap_err();
        assert!(matches!(
            err,
            SqliteError::CompleteTransaction {
                outcome: CommitOutcome::RolledBack,
                ..
            }
        ));
        assert_eq!(coordinator.state(), TransactionState::Idle);
        assert_eq!(coordinator.stats().failed_commits, 1);
        assert!(conn.is_autocommit());

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM child", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
