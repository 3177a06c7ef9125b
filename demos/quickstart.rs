//! End-to-end walkthrough: register columns, migrate, write, read.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p litegate-demos --example quickstart
//! ```

use litegate_core::{ColumnType, EngineConfig};
use litegate_sqlite::{Database, TypeHint, bind, bind_as};

fn main() {
    let dir = tempfile::tempdir().unwrap();

    // === Step 1: Open a handle; the file is created lazily ===
    let mut db = Database::new(dir.path().join("example"), EngineConfig::default()).unwrap();
    println!("Database file: {}", db.location().display());

    // === Step 2: Describe the table and migrate ===
    db.set_table_name("example").unwrap();
    db.register_column("uuid", ColumnType::Text, false, true, false, false)
        .unwrap();
    db.register_column("foo", ColumnType::Text, true, true, true, true)
        .unwrap();
    db.register_column("bar", ColumnType::Text, true, true, true, false)
        .unwrap();

    let report = db.migrate().unwrap();
    println!("\n=== Migration ===");
    println!("  Table created: {}", report.created_table);
    println!("  Columns added: {}", report.columns_added.join(", "));
    println!("  Indices created: {}", report.indices_created.join(", "));

    for column in db.columns().unwrap() {
        println!(
            "  {:>2} {:<5} {:<8} not_null={}",
            column.cid, column.name, column.column_type, column.not_null
        );
    }

    // === Step 3: Insert with named placeholders ===
    db.query(
        "INSERT INTO example (uuid, foo, bar) VALUES (:uuid, :foo, :bar)",
        false,
        &[
            bind(":uuid", "1234"),
            bind(":foo", "hello"),
            bind_as(":bar", "world", TypeHint::Text),
        ],
    )
    .unwrap();

    // === Step 4: Read with a positional placeholder ===
    let rows = db
        .query(
            "SELECT * FROM example WHERE uuid = ?",
            true,
            &[bind(1, "1234")],
        )
        .unwrap()
        .into_rows();

    println!("\n=== Rows ===");
    for row in &rows {
        println!("{}", serde_json::to_string(row).unwrap());
    }

    // === Step 5: Adding a column later is additive ===
    db.register_column("visits", ColumnType::Integer, true, false, false, false)
        .unwrap();
    let report = db.migrate().unwrap();
    println!("\nSecond migration added: {}", report.columns_added.join(", "));
    println!("Columns now: {}", db.column_names().unwrap().join(", "));

    db.close().unwrap();
    println!("\nDone!");
}
