//! Shared types for the rose-db execution core.
//!
//! Everything that crosses a crate boundary lives here: the typed value model,
//! row schemas, the error taxonomy and the wall clock.

pub mod error;
pub mod time;
pub mod tuple;
pub mod value;

pub use error::{QueryError, Result};
pub use tuple::{Column, Row, SVector, Schema};
pub use value::{SType, SValue};
