use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;
use tracing_subscriber::EnvFilter;

use common::time::MICROS_PER_DAY;
use query_engine::executor::{OrderByExecutor, ValuesScanExecutor};
use query_engine::{
    col, Column, ExecutionConfig, ExecutionContext, Executor, FunctionRegistry, Result, Row, SType,
    SValue, Schema, SortExpr, Transaction,
};

#[derive(Parser, Debug)]
#[command(version, about = "Times the ORDER BY operator on generated rows", long_about = None)]
struct Args {
    /// Number of rows to sort
    #[arg(short, long, default_value_t = 100_000)]
    rows: usize,

    /// Number of sort keys, taken from (bucket, ts, label)
    #[arg(short, long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(1..=3))]
    keys: u8,

    /// Seed for the row generator
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Comparisons between heartbeat polls
    #[arg(long, default_value_t = 4096)]
    heartbeat_interval: u64,

    /// Sort every key descending
    #[arg(short, long)]
    descending: bool,

    /// Timed runs per configuration
    #[arg(long, default_value_t = 3)]
    runs: usize,
}

struct BenchmarkResult {
    execute: Duration,
    drain: Duration,
    comparisons: u64,
    heartbeats: u64,
}

const KEY_COLUMNS: [&str; 3] = ["bucket", "ts", "label"];

fn schema() -> Schema {
    Schema::new(vec![
        Column::new("bucket", SType::Int64),
        Column::new("ts", SType::Timestamp64),
        Column::new("label", SType::String),
        Column::new("score", SType::Float64),
    ])
}

fn generate_rows(n: usize, seed: u64) -> Vec<Row> {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = 1_700_000_000_000_000u64;
    (0..n)
        .map(|_| {
            let bucket = if rng.gen_bool(0.05) {
                SValue::Null
            } else {
                SValue::Int64(rng.gen_range(0..64))
            };
            vec![
                bucket,
                SValue::Timestamp64(start + rng.gen_range(0..30 * MICROS_PER_DAY)),
                SValue::String(format!("label-{:02}", rng.gen_range(0..32))),
                SValue::Float64(rng.gen_range(0.0..1.0)),
            ]
        })
        .collect()
}

fn run_benchmark(args: &Args, rows: Vec<Row>) -> Result<BenchmarkResult> {
    let heartbeats = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&heartbeats);
    let txn = Arc::new(
        Transaction::new(Arc::new(FunctionRegistry::with_builtins()))
            .with_config(ExecutionConfig::default().with_heartbeat_interval(args.heartbeat_interval))
            .with_heartbeat(Arc::new(move || {
                counter.fetch_add(1, Ordering::Relaxed);
                Ok(())
            })),
    );

    let specs = KEY_COLUMNS[..args.keys as usize]
        .iter()
        .map(|name| {
            if args.descending {
                SortExpr::desc(col(name))
            } else {
                SortExpr::asc(col(name))
            }
        })
        .collect();

    let mut executor = OrderByExecutor::new(
        Box::new(ValuesScanExecutor::new(schema(), rows)),
        specs,
        txn,
        Arc::new(ExecutionContext::new()),
    )?;

    let start = Instant::now();
    executor.execute()?;
    let execute = start.elapsed();

    let mut row = schema().empty_row();
    let start = Instant::now();
    while executor.next(&mut row)? {}
    let drain = start.elapsed();

    Ok(BenchmarkResult {
        execute,
        drain,
        comparisons: executor.comparisons(),
        heartbeats: heartbeats.load(Ordering::Relaxed),
    })
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    println!("Setting up ORDER BY benchmark.");
    info!(?args, "benchmark configuration");

    let rows = generate_rows(args.rows, args.seed);

    let mut results = Vec::with_capacity(args.runs);
    for _ in 0..args.runs {
        match run_benchmark(&args, rows.clone()) {
            Ok(result) => results.push(result),
            Err(e) => {
                eprintln!("Benchmark failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    println!("\n--- Benchmark Results ({} rows, {} keys) ---", args.rows, args.keys);
    println!("| Run | Sort Time       | Drain Time      | Comparisons  | Heartbeats |");
    println!("|-----|-----------------|-----------------|--------------|------------|");
    for (i, result) in results.iter().enumerate() {
        println!(
            "| {:<3} | {:<15?} | {:<15?} | {:<12} | {:<10} |",
            i + 1,
            result.execute,
            result.drain,
            result.comparisons,
            result.heartbeats
        );
    }
}
