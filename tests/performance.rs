//! Timing comparisons between unindexed and indexed selects, with SQLite as
//! a reference point.
//!
//! Run with: `cargo test --test performance -- --nocapture`

use rusqlite::Connection;
use std::time::Instant;
use tabledb::{Comparator, Record, Table};

/// Helper to time a closure execution
fn time_it<F>(f: F) -> (f64, String)
where
    F: FnOnce() -> Result<String, Box<dyn std::error::Error>>,
{
    let start = Instant::now();
    let result = f();
    let elapsed = start.elapsed();
    let result_str = result.unwrap_or_else(|e| format!("ERROR: {}", e));
    (elapsed.as_secs_f64(), result_str)
}

fn format_result(name: &str, tabledb_time: f64, reference_time: f64, reference: &str) {
    let ratio = if reference_time > 0.0 {
        tabledb_time / reference_time
    } else {
        f64::INFINITY
    };
    println!(
        "  {}: tabledb={:.4}s, {}={:.4}s, ratio={:.2}x",
        name, tabledb_time, reference, reference_time, ratio
    );
}

fn table_with_rows(size: usize) -> Result<Table, Box<dyn std::error::Error>> {
    let columns = ["lastname", "firstname", "id"];
    let mut table = Table::new(&columns)?;
    for i in 0..size {
        let id = i.to_string();
        table.insert(Record::new(&columns, &["Gap", "Mark", id.as_str()])?)?;
    }
    Ok(table)
}

#[test]
fn test_indexed_vs_scan_lookup() {
    println!("\n=== Equality lookup: scan vs index ===");
    let lookups = 200;

    for size in [100, 1000, 5000] {
        let mut table = table_with_rows(size).expect("build table");

        let (scan_time, scan_result) = time_it(|| {
            for i in 0..lookups {
                let key = (i * 31 % size).to_string();
                let found = table.select(&["id"], &[key.as_str()], &[Comparator::Equal])?;
                if found.len() != 1 {
                    return Err(format!("expected one record for id {}", key).into());
                }
            }
            Ok(format!("{} lookups", lookups))
        });
        assert!(!scan_result.starts_with("ERROR"), "{}", scan_result);

        table.create_index("id").expect("create index");
        let (index_time, index_result) = time_it(|| {
            for i in 0..lookups {
                let key = (i * 31 % size).to_string();
                let found = table.select(&["id"], &[key.as_str()], &[Comparator::Equal])?;
                if found.len() != 1 {
                    return Err(format!("expected one record for id {}", key).into());
                }
            }
            Ok(format!("{} lookups", lookups))
        });
        assert!(!index_result.starts_with("ERROR"), "{}", index_result);

        format_result(&format!("{} rows", size), index_time, scan_time, "scan");
    }
}

#[test]
fn test_range_select_against_sqlite() {
    println!("\n=== Range select vs SQLite ===");
    let size = 5000;

    let mut table = table_with_rows(size).expect("build table");
    table.create_index("id").expect("create index");
    let (tabledb_time, tabledb_count) = time_it(|| {
        let found = table.select(&["id"], &["4"], &[Comparator::GreaterEq])?;
        Ok(found.len().to_string())
    });

    let conn = Connection::open_in_memory().expect("create sqlite");
    conn.execute("CREATE TABLE t1(lastname TEXT, firstname TEXT, id TEXT)", [])
        .expect("create sqlite table");
    conn.execute("CREATE INDEX t1_id ON t1(id)", [])
        .expect("create sqlite index");
    for i in 0..size {
        conn.execute(
            "INSERT INTO t1 VALUES ('Gap', 'Mark', ?1)",
            [i.to_string()],
        )
        .expect("insert sqlite row");
    }
    let (sqlite_time, sqlite_count) = time_it(|| {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM t1 WHERE id >= '4'", [], |row| {
            row.get(0)
        })?;
        Ok(count.to_string())
    });

    assert_eq!(tabledb_count, sqlite_count);
    format_result("id >= '4'", tabledb_time, sqlite_time, "rusqlite");
}
