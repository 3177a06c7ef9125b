//! Integration tests for the litegate-sqlite crate.

use litegate_core::{ColumnType, EngineConfig};
use litegate_sqlite::{
    Database, QueryOutcome, SqliteError, TransactionState, TypeHint, Value, bind, bind_as,
};
use rusqlite::Connection;
use serde_json::json;
use tempfile::TempDir;

/// Opens a database named `name` inside a fresh temp dir.
fn fresh(name: &str) -> (TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(dir.path().join(name), EngineConfig::default()).unwrap();
    (dir, db)
}

/// Registers the example table used across the tests and migrates it.
fn example_table(db: &mut Database) {
    db.set_table_name("example").unwrap();
    db.register_column("uuid", ColumnType::Text, false, true, false, false)
        .unwrap();
    db.register_column("foo", ColumnType::Text, true, true, true, true)
        .unwrap();
    db.register_column("bar", ColumnType::Text, true, true, true, false)
        .unwrap();
    db.migrate().unwrap();
}

fn count(db: &mut Database, table: &str) -> i64 {
    let rows = db
        .query(&format!("SELECT COUNT(*) AS total FROM {table}"), true, &[])
        .unwrap()
        .into_rows();
    rows[0]["total"].as_i64().unwrap()
}

// ---------------------------------------------------------------------------
// Migration
// ---------------------------------------------------------------------------

#[test]
fn test_fresh_table_layout() {
    let (_dir, mut db) = fresh("layout");
    example_table(&mut db);

    let columns = db.columns().unwrap();
    assert_eq!(columns[0].name, "id");
    assert_eq!(columns[0].primary_key, 1);
    assert_eq!(columns[1].name, "uuid");
    assert!(columns[1].not_null);
    assert_eq!(columns[1].column_type, "TEXT");
    assert!(!columns[2].not_null);

    let indices = db.indices().unwrap();
    let foo = indices.iter().find(|i| i.name == "idx_foo").unwrap();
    let bar = indices.iter().find(|i| i.name == "idx_bar").unwrap();
    assert!(foo.unique);
    assert!(!bar.unique);
    assert_eq!(foo.origin, "c");
}

#[test]
fn test_migrate_is_idempotent() {
    let (_dir, mut db) = fresh("idempotent");
    example_table(&mut db);
    let columns = db.columns().unwrap();
    let indices = db.index_names().unwrap();

    example_table(&mut db);
    assert_eq!(db.columns().unwrap(), columns);
    assert_eq!(db.index_names().unwrap(), indices);
}

#[test]
fn test_empty_registry_migrates_nothing() {
    let (_dir, mut db) = fresh("empty");
    db.set_table_name("example").unwrap();
    let report = db.migrate().unwrap();
    assert_eq!(report.table, "example");
    assert!(!report.has_changes());
    assert!(db.columns().unwrap().is_empty());
}

#[test]
fn test_new_registration_adds_column_to_existing_table() {
    let (_dir, mut db) = fresh("additive");
    example_table(&mut db);
    db.query(
        "INSERT INTO example (uuid) VALUES (:uuid)",
        false,
        &[bind(":uuid", "kept")],
    )
    .unwrap();

    db.register_column("uuid", ColumnType::Integer, true, true, false, false)
        .unwrap();
    db.register_column("score", ColumnType::Real, true, false, true, false)
        .unwrap();
    let report = db.migrate().unwrap();

    assert!(!report.created_table);
    assert_eq!(report.columns_added, vec!["score"]);
    assert_eq!(report.indices_created, vec!["idx_score"]);

    // Existing columns are never altered.
    let columns = db.columns().unwrap();
    let uuid = columns.iter().find(|c| c.name == "uuid").unwrap();
    assert_eq!(uuid.column_type, "TEXT");
    assert_eq!(columns.last().unwrap().name, "score");
    assert_eq!(count(&mut db, "example"), 1);
}

#[test]
fn test_migration_only_adds_what_drifted_away() {
    let (dir, mut db) = fresh("drift");
    example_table(&mut db);
    db.close().unwrap();

    let external = Connection::open(dir.path().join("drift.sqlite3")).unwrap();
    external.execute_batch("DROP INDEX idx_bar;").unwrap();
    drop(external);

    db.register_column("foo", ColumnType::Text, true, true, true, true)
        .unwrap();
    db.register_column("bar", ColumnType::Text, true, true, true, false)
        .unwrap();
    let report = db.migrate().unwrap();
    assert!(report.columns_added.is_empty());
    assert_eq!(report.indices_created, vec!["idx_bar"]);
}

#[test]
fn test_index_name_taken_by_another_table_is_an_error() {
    let (_dir, mut db) = fresh("shared_index");
    db.set_table_name("a").unwrap();
    db.register_column("foo", ColumnType::Text, true, true, true, true)
        .unwrap();
    assert_eq!(db.migrate().unwrap().indices_created, vec!["idx_foo"]);

    db.set_table_name("b").unwrap();
    db.register_column("foo", ColumnType::Text, true, true, true, true)
        .unwrap();
    let err = db.migrate().unwrap_err();
    assert!(matches!(err, SqliteError::QueryError { .. }));
    assert!(err.to_string().contains("Index idx_foo already exists on table a"));

    // Nothing is reported as created and the registration stays for a retry.
    assert!(db.index_names().unwrap().is_empty());
    assert!(db.has_column("foo"));
    assert!(db.migrate().is_err());
}

#[test]
fn test_registration_differing_only_in_case_migrates_once() {
    let (_dir, mut db) = fresh("case_registration");
    db.set_table_name("example").unwrap();
    db.register_column("Email", ColumnType::Text, true, true, false, false)
        .unwrap();
    db.register_column("email", ColumnType::Text, true, true, false, false)
        .unwrap();
    assert_eq!(db.registered_columns().len(), 1);

    let report = db.migrate().unwrap();
    assert_eq!(report.columns_added, vec!["email"]);
    assert_eq!(db.column_names().unwrap(), vec!["id", "email"]);
}

#[test]
fn test_text_columns_compare_case_insensitively() {
    let (_dir, mut db) = fresh("nocase");
    example_table(&mut db);
    db.query(
        "INSERT INTO example (uuid) VALUES (:uuid)",
        false,
        &[bind(":uuid", "ABC-123")],
    )
    .unwrap();

    let rows = db
        .query(
            "SELECT id FROM example WHERE uuid = :uuid",
            true,
            &[bind(":uuid", "abc-123")],
        )
        .unwrap();
    assert_eq!(rows.rows().len(), 1);
}

#[test]
fn test_unique_index_rejects_duplicates() {
    let (_dir, mut db) = fresh("unique");
    example_table(&mut db);
    let insert = "INSERT INTO example (uuid, foo) VALUES (:uuid, :foo)";
    db.query(insert, false, &[bind(":uuid", "a"), bind(":foo", "same")])
        .unwrap();

    let err = db
        .query(insert, false, &[bind(":uuid", "b"), bind(":foo", "same")])
        .unwrap_err();
    match err {
        SqliteError::QueryError { message, sql } => {
            assert!(message.contains("UNIQUE"), "{message}");
            assert_eq!(sql, insert);
        }
        other => panic!("unexpected error: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Write batching
// ---------------------------------------------------------------------------

#[test]
fn test_thousand_named_inserts_share_one_transaction() {
    let (_dir, mut db) = fresh("batch_named");
    example_table(&mut db);
    let before = db.transaction_stats();

    for i in 0..1000 {
        db.query(
            "INSERT INTO example (uuid, foo) VALUES (:uuid, :foo)",
            false,
            &[
                bind_as(":uuid", format!("uuid-{i}"), TypeHint::Text),
                bind_as(":foo", i, TypeHint::Text),
            ],
        )
        .unwrap();
    }
    assert_eq!(db.transaction_state(), TransactionState::Open);

    assert_eq!(count(&mut db, "example"), 1000);
    let after = db.transaction_stats();
    assert_eq!(after.begun - before.begun, 1);
    assert_eq!(after.committed - before.committed, 1);
    assert_eq!(db.transaction_state(), TransactionState::Idle);
}

#[test]
fn test_thousand_positional_inserts_share_one_transaction() {
    let (_dir, mut db) = fresh("batch_positional");
    example_table(&mut db);
    let before = db.transaction_stats();

    for i in 0..1000 {
        db.query(
            "INSERT INTO example (uuid, bar) VALUES (?, ?)",
            false,
            &[bind(1, format!("uuid-{i}")), bind(2, "shared")],
        )
        .unwrap();
    }

    assert_eq!(count(&mut db, "example"), 1000);
    let after = db.transaction_stats();
    assert_eq!(after.begun - before.begun, 1);
    assert_eq!(after.committed - before.committed, 1);
}

#[test]
fn test_batched_writes_invisible_to_other_connections_until_read() {
    let (dir, mut db) = fresh("visibility");
    example_table(&mut db);
    db.query("INSERT INTO example (uuid) VALUES ('a')", false, &[])
        .unwrap();

    let other = Connection::open(dir.path().join("visibility.sqlite3")).unwrap();
    let seen: i64 = other
        .query_row("SELECT COUNT(*) FROM example", [], |row| row.get(0))
        .unwrap();
    assert_eq!(seen, 0);

    assert_eq!(count(&mut db, "example"), 1);
    let seen: i64 = other
        .query_row("SELECT COUNT(*) FROM example", [], |row| row.get(0))
        .unwrap();
    assert_eq!(seen, 1);
}

#[test]
fn test_drop_commits_pending_writes() {
    let (dir, mut db) = fresh("drop");
    example_table(&mut db);
    db.query("INSERT INTO example (uuid) VALUES ('a')", false, &[])
        .unwrap();
    drop(db);

    let mut reopened = Database::new(dir.path().join("drop"), EngineConfig::default()).unwrap();
    assert_eq!(count(&mut reopened, "example"), 1);
}

// ---------------------------------------------------------------------------
// Query errors
// ---------------------------------------------------------------------------

#[test]
fn test_param_arity_errors() {
    let (_dir, mut db) = fresh("arity");
    example_table(&mut db);
    let sql = "SELECT * FROM example WHERE id = ?";

    let err = db.query(sql, true, &[vec![Value::Integer(1)]]).unwrap_err();
    assert_eq!(err.to_string(), format!("Error Processing Params - {sql}"));

    let four = vec![
        Value::Integer(1),
        Value::Integer(1),
        Value::from("integer"),
        Value::from("extra"),
    ];
    let err = db.query(sql, true, &[four]).unwrap_err();
    assert_eq!(err.to_string(), format!("Error Processing Params - {sql}"));
}

#[test]
fn test_incomplete_sql_reports_prepare_error() {
    let (_dir, mut db) = fresh("prepare");
    let err = db.query("SELECT * FROM", true, &[]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Unable to prepare statement: incomplete input - SELECT * FROM"
    );
}

#[test]
fn test_missing_directory_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let err = Database::new(dir.path().join("absent").join("db"), EngineConfig::default())
        .unwrap_err();
    assert!(matches!(err, SqliteError::DatabasePath(_)));
}

#[test]
fn test_table_must_be_set() {
    let (_dir, mut db) = fresh("no_table");
    assert!(matches!(db.current_table_name(), Err(SqliteError::SetTable)));
    assert!(matches!(
        db.register_column("uuid", ColumnType::Text, true, true, false, false),
        Err(SqliteError::SetTable)
    ));
}

// ---------------------------------------------------------------------------
// Lifecycle and configuration
// ---------------------------------------------------------------------------

#[test]
fn test_tldr_flow() {
    let (_dir, mut db) = fresh("tldr");
    example_table(&mut db);

    db.query(
        "INSERT INTO example (uuid, foo, bar) VALUES (:uuid, :foo, :bar)",
        false,
        &[bind(":uuid", "1234"), bind(":foo", "hello"), bind(":bar", "world")],
    )
    .unwrap();

    let rows = db
        .query(
            "SELECT * FROM example WHERE uuid = ?",
            true,
            &[bind_as(1, "1234", TypeHint::Text)],
        )
        .unwrap()
        .into_rows();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.columns().collect::<Vec<_>>(), vec!["id", "uuid", "foo", "bar"]);
    assert_eq!(row["id"], Value::Integer(1));
    assert_eq!(row["bar"], Value::from("world"));
    assert_eq!(
        serde_json::to_value(row).unwrap(),
        json!({"id": 1, "uuid": "1234", "foo": "hello", "bar": "world"})
    );
}

#[test]
fn test_close_and_reopen_persists_data() {
    let (_dir, mut db) = fresh("reopen");
    example_table(&mut db);
    db.query("INSERT INTO example (uuid) VALUES ('a')", false, &[])
        .unwrap();
    db.close().unwrap();
    assert!(!db.is_open());

    assert_eq!(count(&mut db, "example"), 1);
    assert!(db.is_open());
}

#[test]
fn test_location_uses_fixed_extension() {
    let (dir, db) = fresh("users.db");
    assert_eq!(db.location(), dir.path().join("users.sqlite3"));
}

#[test]
fn test_overrides_reach_the_engine() {
    let dir = tempfile::tempdir().unwrap();
    let mut db = Database::with_overrides(
        dir.path().join("tuned"),
        [
            ("cache_size", json!(10_000)),
            ("journal_mode", json!("delete")),
            ("not_a_setting", json!(1)),
        ],
    )
    .unwrap();

    let rows = db.query("PRAGMA cache_size", true, &[]).unwrap().into_rows();
    assert_eq!(rows[0]["cache_size"], Value::Integer(10_000));
    let rows = db.query("PRAGMA journal_mode", true, &[]).unwrap().into_rows();
    assert_eq!(rows[0]["journal_mode"], Value::from("delete"));
    let rows = db.query("PRAGMA foreign_keys", true, &[]).unwrap().into_rows();
    assert_eq!(rows[0]["foreign_keys"], Value::Integer(1));
}

#[test]
fn test_executed_outcome_tracks_last_rowid() {
    let (_dir, mut db) = fresh("rowid");
    example_table(&mut db);
    for expected in 1..=3 {
        let outcome = db
            .query("INSERT INTO example (uuid) VALUES ('x')", false, &[])
            .unwrap();
        assert_eq!(
            outcome,
            QueryOutcome::Executed {
                changes: 1,
                last_insert_rowid: expected
            }
        );
    }
}
