//! Demo of the DataFrame API over the in-memory catalog.
//!
//! This example demonstrates:
//! - Creating tables and inserting rows
//! - Filtering with the time functions
//! - Multi-key ORDER BY
//! - Projections, limits and offsets

use query_engine::{call, col, lit, Column, Database, SType, SValue, Schema, SortExpr};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🌹 Rose-DB DataFrame API Demo\n");

    let db = Database::new();

    println!("📋 Creating 'requests' table...");
    let requests = db.create_table(
        "requests",
        Schema::new(vec![
            Column::new("path", SType::String),
            Column::new("status", SType::Int64),
            Column::new("ts", SType::Timestamp64),
            Column::new("latency_ms", SType::Float64),
        ]),
    )?;

    let now = db.transaction().now();
    let minute = 60_000_000;
    requests.insert_all(vec![
        vec![SValue::from("/"), SValue::Int64(200), SValue::Timestamp64(now - 2 * minute), SValue::Float64(12.0)],
        vec![SValue::from("/login"), SValue::Int64(500), SValue::Timestamp64(now - 9 * minute), SValue::Float64(230.5)],
        vec![SValue::from("/"), SValue::Int64(200), SValue::Timestamp64(now - 31 * minute), SValue::Float64(8.25)],
        vec![SValue::from("/search"), SValue::Int64(200), SValue::Timestamp64(now - 3 * minute), SValue::Null],
        vec![SValue::from("/login"), SValue::Int64(200), SValue::Timestamp64(now - 90 * minute), SValue::Float64(41.0)],
    ])?;
    println!("✓ Inserted {} rows\n", requests.row_count()?);

    println!("🔍 Query 1: SELECT * FROM requests");
    db.table("requests")?.show()?;
    println!();

    println!("🔍 Query 2: requests from the last 30 minutes, newest first");
    db.table("requests")?
        .filter(col("ts").gt(call("time_at", vec![lit("30 minutes ago")])))
        .order_by(vec![SortExpr::desc(col("ts"))])
        .select(&["path", "ts"])
        .show()?;
    println!();

    println!("🔍 Query 3: ORDER BY status DESC, latency_ms ASC LIMIT 3 OFFSET 1");
    db.table("requests")?
        .order_by(vec![SortExpr::desc(col("status")), SortExpr::asc(col("latency_ms"))])
        .select(&["path", "status", "latency_ms"])
        .limit(3)
        .offset(1)
        .show()?;
    println!();

    println!("🔍 Query 4: 15-minute buckets and an hour later");
    let result = db
        .table("requests")?
        .order_by(vec![SortExpr::asc(col("ts"))])
        .select_exprs(&[
            (col("path"), "path"),
            (call("date_trunc", vec![lit("15min"), col("ts")]), "bucket"),
            (call("date_add", vec![col("ts"), lit("1"), lit("hour")]), "plus_one_hour"),
        ])
        .collect()?;
    println!("{}", result);
    println!(
        "progress: {}/{} tasks completed",
        result.progress.completed, result.progress.registered
    );
    println!();

    println!("🔍 Query 5: a malformed literal");
    match db
        .table("requests")?
        .select_exprs(&[(call("date_add", vec![col("ts"), lit("1:2:3"), lit("minute_second")]), "bad")])
        .collect()
    {
        Ok(result) => println!("unexpected success: {}", result),
        Err(err) => println!("✗ {}", err),
    }

    println!("\n🎉 DataFrame API Demo Complete!");
    Ok(())
}
