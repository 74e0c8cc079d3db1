//! Query execution core for rose-db.
//!
//! Queries run as trees of pull-based executors exchanging typed rows.
//! Scalar expressions inside the executors are evaluated on a value stack and
//! call native functions looked up in a [`FunctionRegistry`]. The DataFrame
//! facade assembles executor trees without a SQL planner.
//!
//! # Example
//!
//! ```no_run
//! use query_engine::{call, col, lit, Column, Database, SType, Schema, SortExpr};
//!
//! let db = Database::new();
//! db.create_table("events", Schema::new(vec![
//!     Column::new("name", SType::String),
//!     Column::new("ts", SType::Timestamp64),
//! ]))?;
//!
//! let result = db.table("events")?
//!     .filter(col("ts").gt(call("time_at", vec![lit("-1h")])))
//!     .order_by(vec![SortExpr::desc(col("ts"))])
//!     .select_exprs(&[
//!         (col("name"), "name"),
//!         (call("date_trunc", vec![lit("5min"), col("ts")]), "bucket"),
//!     ])
//!     .collect()?;
//! # Ok::<(), query_engine::QueryError>(())
//! ```

pub mod catalog;
pub mod config;
pub mod context;
pub mod executor;
pub mod expression;
pub mod function;
pub mod transaction;
pub mod vm;
mod database;
mod dataframe;

pub use config::ExecutionConfig;
pub use context::{ExecutionContext, ExecutionProgress};
pub use database::Database;
pub use dataframe::{DataFrame, QueryResult};
pub use executor::{BoxedExecutor, Executor, SortExpr, SortOrder};
pub use expression::{call, col, lit, Expression};
pub use function::{FunctionRegistry, SFunction};
pub use transaction::{HeartbeatCallback, Transaction};
pub use vm::{Evaluator, VmStack};

pub use common::{Column, QueryError, Result, Row, SType, SVector, SValue, Schema};
