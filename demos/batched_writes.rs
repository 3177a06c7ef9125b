//! Shows how consecutive writes share one transaction until the next read.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p litegate-demos --example batched_writes
//! ```

use std::time::Instant;

use litegate_core::{ColumnType, EngineConfig};
use litegate_sqlite::{Database, bind};
use serde_json::json;

const ROWS: usize = 1000;

fn main() {
    let dir = tempfile::tempdir().unwrap();
    let mut db = Database::with_overrides(
        dir.path().join("batched"),
        [("cache_size", json!(10_000)), ("synchronous", json!("normal"))],
    )
    .unwrap();
    println!("Engine config: {:?}", db.config());

    db.set_table_name("events").unwrap();
    db.register_column("name", ColumnType::Text, false, true, true, false)
        .unwrap();
    db.register_column("seq", ColumnType::Integer, false, true, true, true)
        .unwrap();
    db.migrate().unwrap();

    let before = db.transaction_stats();
    let started = Instant::now();
    for seq in 0..ROWS {
        db.query(
            "INSERT INTO events (name, seq) VALUES (?, ?)",
            false,
            &[bind(1, format!("event-{seq}")), bind(2, seq as i64)],
        )
        .unwrap();
    }
    println!(
        "Queued {ROWS} inserts in {:?} (transaction state: {:?})",
        started.elapsed(),
        db.transaction_state()
    );

    // The read commits the whole batch first.
    let rows = db
        .query("SELECT COUNT(*) AS total FROM events", true, &[])
        .unwrap()
        .into_rows();
    let after = db.transaction_stats();

    println!("Rows visible after read: {}", rows[0]["total"]);
    println!(
        "Transactions begun: {}, committed: {}",
        after.begun - before.begun,
        after.committed - before.committed
    );

    // Classification is purely textual.
    for sql in [
        "SELECT created_at FROM events",
        "SELECT 'DELETE' FROM events",
        "UPDATE events SET name = 'x'",
    ] {
        println!("{sql:<35} -> write={}", db.is_write_statement(sql));
    }
}
