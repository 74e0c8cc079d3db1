use std::sync::Arc;

use common::time::{FixedClock, MICROS_PER_HOUR, MICROS_PER_MINUTE};
use query_engine::{
    call, col, lit, Column, Database, ExecutionConfig, QueryError, SType, SValue, Schema, SortExpr,
};

// 2023-11-14 22:13:20 UTC
const NOW: u64 = 1_700_000_000_000_000;

fn events_db() -> Database {
    let db = Database::new().with_clock(Arc::new(FixedClock(NOW)));
    let events = db
        .create_table(
            "events",
            Schema::new(vec![
                Column::new("name", SType::String),
                Column::new("ts", SType::Timestamp64),
                Column::new("latency", SType::Float64),
            ]),
        )
        .unwrap();

    events
        .insert_all(vec![
            vec![SValue::from("login"), SValue::Timestamp64(NOW - 3 * MICROS_PER_HOUR), SValue::Float64(12.5)],
            vec![SValue::from("search"), SValue::Timestamp64(NOW - 20 * MICROS_PER_MINUTE), SValue::Float64(40.0)],
            vec![SValue::from("logout"), SValue::Timestamp64(NOW - 2 * MICROS_PER_MINUTE), SValue::Float64(3.0)],
            vec![SValue::from("search"), SValue::Timestamp64(NOW - 7 * MICROS_PER_MINUTE), SValue::Null],
        ])
        .unwrap();
    db
}

#[test]
fn test_recent_events_bucketed_and_sorted() {
    let db = events_db();

    // SELECT name, date_trunc('5min', ts) AS bucket FROM events
    // WHERE ts > time_at('1 hour ago') ORDER BY ts ASC
    let result = db
        .table("events")
        .unwrap()
        .filter(col("ts").gt(call("time_at", vec![lit("1 hour ago")])))
        .order_by(vec![SortExpr::asc(col("ts"))])
        .select_exprs(&[
            (col("name"), "name"),
            (call("date_trunc", vec![lit("5min"), col("ts")]), "bucket"),
        ])
        .collect()
        .unwrap();

    assert_eq!(result.columns, vec!["name", "bucket"]);
    assert_eq!(
        result.column("name").unwrap(),
        vec![&SValue::from("search"), &SValue::from("search"), &SValue::from("logout")]
    );

    let five_minutes = 5 * MICROS_PER_MINUTE;
    for row in &result.rows {
        match row[1] {
            SValue::Timestamp64(bucket) => assert_eq!(bucket % five_minutes, 0),
            ref other => panic!("unexpected bucket {:?}", other),
        }
    }
    assert_eq!(result.progress.completed, 1);
}

#[test]
fn test_multi_key_order_with_nulls() {
    let db = events_db();

    // ORDER BY name DESC, latency ASC
    let result = db
        .table("events")
        .unwrap()
        .order_by(vec![SortExpr::desc(col("name")), SortExpr::asc(col("latency"))])
        .select(&["name", "latency"])
        .collect()
        .unwrap();

    assert_eq!(
        result.rows,
        vec![
            vec![SValue::from("search"), SValue::Null],
            vec![SValue::from("search"), SValue::Float64(40.0)],
            vec![SValue::from("logout"), SValue::Float64(3.0)],
            vec![SValue::from("login"), SValue::Float64(12.5)],
        ]
    );
}

#[test]
fn test_date_add_in_projection() {
    let db = events_db();
    let result = db
        .table("events")
        .unwrap()
        .filter(col("name").eq(lit("login")))
        .select_exprs(&[(
            call("date_add", vec![col("ts"), lit("1:30"), lit("hour_minute")]),
            "shifted",
        )])
        .collect()
        .unwrap();

    assert_eq!(
        result.rows,
        vec![vec![SValue::Timestamp64(NOW - 90 * MICROS_PER_MINUTE)]]
    );
}

#[test]
fn test_query_errors_surface_the_offending_literal() {
    let db = events_db();

    let err = db
        .table("events")
        .unwrap()
        .order_by(vec![SortExpr::asc(call("date_trunc", vec![lit("7parsecs"), col("ts")]))])
        .collect()
        .unwrap_err();
    assert_eq!(err, QueryError::Parse("unknown time window 7parsecs".to_string()));

    let err = db
        .table("events")
        .unwrap()
        .filter(col("ts").lt(call("time_at", vec![lit("whenever")])))
        .collect()
        .unwrap_err();
    assert_eq!(
        err,
        QueryError::Type("can't convert 'whenever' to TIMESTAMP64".to_string())
    );

    let err = db.table("events").unwrap().order_by(Vec::new()).collect().unwrap_err();
    assert!(matches!(err, QueryError::IllegalArgument(_)));

    assert!(matches!(db.table("missing"), Err(QueryError::TableNotFound(_))));
}

#[test]
fn test_cancelled_query() {
    let db = events_db()
        .with_config(ExecutionConfig::default().with_heartbeat_interval(2))
        .with_heartbeat(Arc::new(|| Err(QueryError::Cancelled("killed by user".to_string()))));

    let err = db
        .table("events")
        .unwrap()
        .order_by(vec![SortExpr::asc(col("latency"))])
        .collect()
        .unwrap_err();
    assert_eq!(err, QueryError::Cancelled("killed by user".to_string()));

    // plans without a sort never poll the heartbeat
    let result = db.table("events").unwrap().limit(2).collect().unwrap();
    assert_eq!(result.len(), 2);
}
