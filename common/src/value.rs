//! The typed value model.
//!
//! `SValue` is a closed tagged union; its runtime tag is an `SType`. The tag
//! always matches the payload and conversions between tags only happen through
//! `SValue::convert_to`.

use crate::error::{QueryError, Result};
use crate::time::format_timestamp;
use std::cmp::Ordering;
use std::fmt;

/// Runtime type tag of an `SValue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SType {
    Null,
    Bool,
    Int64,
    Float64,
    String,
    Timestamp64,
}

impl SType {
    pub fn name(&self) -> &'static str {
        match self {
            SType::Null => "NULL",
            SType::Bool => "BOOL",
            SType::Int64 => "INT64",
            SType::Float64 => "FLOAT64",
            SType::String => "STRING",
            SType::Timestamp64 => "TIMESTAMP64",
        }
    }
}

impl fmt::Display for SType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single SQL scalar.
///
/// `Timestamp64` holds microseconds since the Unix epoch, always UTC.
#[derive(Debug, Clone, PartialEq)]
pub enum SValue {
    Null,
    Bool(bool),
    Int64(i64),
    Float64(f64),
    String(String),
    Timestamp64(u64),
}

impl SValue {
    /// Returns the default value for a type. Used to pre-size row buffers.
    pub fn new(stype: SType) -> Self {
        match stype {
            SType::Null => SValue::Null,
            SType::Bool => SValue::Bool(false),
            SType::Int64 => SValue::Int64(0),
            SType::Float64 => SValue::Float64(0.0),
            SType::String => SValue::String(String::new()),
            SType::Timestamp64 => SValue::Timestamp64(0),
        }
    }

    pub fn get_type(&self) -> SType {
        match self {
            SValue::Null => SType::Null,
            SValue::Bool(_) => SType::Bool,
            SValue::Int64(_) => SType::Int64,
            SValue::Float64(_) => SType::Float64,
            SValue::String(_) => SType::String,
            SValue::Timestamp64(_) => SType::Timestamp64,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SValue::Null)
    }

    /// Compares two values.
    ///
    /// NULL equals NULL and sorts before everything else. INT64 and FLOAT64
    /// compare numerically with each other; floats use their total order so
    /// the result is usable as a sort key. Any other pair of distinct tags is
    /// a type error.
    pub fn compare(&self, other: &SValue) -> Result<Ordering> {
        match (self, other) {
            (SValue::Null, SValue::Null) => Ok(Ordering::Equal),
            (SValue::Null, _) => Ok(Ordering::Less),
            (_, SValue::Null) => Ok(Ordering::Greater),
            (SValue::Bool(a), SValue::Bool(b)) => Ok(a.cmp(b)),
            (SValue::Int64(a), SValue::Int64(b)) => Ok(a.cmp(b)),
            (SValue::Float64(a), SValue::Float64(b)) => Ok(a.total_cmp(b)),
            (SValue::Int64(a), SValue::Float64(b)) => Ok((*a as f64).total_cmp(b)),
            (SValue::Float64(a), SValue::Int64(b)) => Ok(a.total_cmp(&(*b as f64))),
            (SValue::String(a), SValue::String(b)) => Ok(a.cmp(b)),
            (SValue::Timestamp64(a), SValue::Timestamp64(b)) => Ok(a.cmp(b)),
            _ => Err(QueryError::Type(format!(
                "can't compare {} with {}",
                self.get_type(),
                other.get_type()
            ))),
        }
    }

    /// Explicitly converts this value to another type.
    pub fn convert_to(&self, target: SType) -> Result<SValue> {
        if self.get_type() == target {
            return Ok(self.clone());
        }

        let converted = match (self, target) {
            (SValue::Null, _) | (_, SType::Null) => None,
            (_, SType::String) => Some(SValue::String(self.to_string())),

            (SValue::Bool(b), SType::Int64) => Some(SValue::Int64(i64::from(*b))),
            (SValue::Float64(f), SType::Int64) => float_to_i64(*f).map(SValue::Int64),
            (SValue::String(s), SType::Int64) => s.trim().parse::<i64>().ok().map(SValue::Int64),
            (SValue::Timestamp64(t), SType::Int64) => i64::try_from(*t).ok().map(SValue::Int64),

            (SValue::Bool(b), SType::Float64) => Some(SValue::Float64(if *b { 1.0 } else { 0.0 })),
            (SValue::Int64(i), SType::Float64) => Some(SValue::Float64(*i as f64)),
            (SValue::String(s), SType::Float64) => s.trim().parse::<f64>().ok().map(SValue::Float64),
            (SValue::Timestamp64(t), SType::Float64) => Some(SValue::Float64(*t as f64)),

            (SValue::Int64(i), SType::Bool) => Some(SValue::Bool(*i != 0)),
            (SValue::Float64(f), SType::Bool) => Some(SValue::Bool(*f != 0.0)),
            (SValue::String(s), SType::Bool) => parse_bool(s).map(SValue::Bool),

            (SValue::Int64(i), SType::Timestamp64) => u64::try_from(*i).ok().map(SValue::Timestamp64),
            (SValue::Float64(f), SType::Timestamp64) => {
                float_to_i64(*f).and_then(|i| u64::try_from(i).ok()).map(SValue::Timestamp64)
            }
            (SValue::String(s), SType::Timestamp64) => s.trim().parse::<u64>().ok().map(SValue::Timestamp64),

            _ => None,
        };

        converted.ok_or_else(|| {
            QueryError::Type(format!("can't convert {} '{}' to {}", self.get_type(), self, target))
        })
    }
}

fn float_to_i64(f: f64) -> Option<i64> {
    if f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f.trunc() as i64)
    } else {
        None
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

impl fmt::Display for SValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SValue::Null => write!(f, "NULL"),
            SValue::Bool(b) => write!(f, "{}", b),
            SValue::Int64(i) => write!(f, "{}", i),
            SValue::Float64(v) => write!(f, "{}", v),
            SValue::String(s) => write!(f, "{}", s),
            SValue::Timestamp64(t) => write!(f, "{}", format_timestamp(*t)),
        }
    }
}

impl From<i64> for SValue {
    fn from(value: i64) -> Self {
        SValue::Int64(value)
    }
}

impl From<i32> for SValue {
    fn from(value: i32) -> Self {
        SValue::Int64(i64::from(value))
    }
}

impl From<f64> for SValue {
    fn from(value: f64) -> Self {
        SValue::Float64(value)
    }
}

impl From<bool> for SValue {
    fn from(value: bool) -> Self {
        SValue::Bool(value)
    }
}

impl From<&str> for SValue {
    fn from(value: &str) -> Self {
        SValue::String(value.to_string())
    }
}

impl From<String> for SValue {
    fn from(value: String) -> Self {
        SValue::String(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_matches_payload() {
        for stype in [
            SType::Null,
            SType::Bool,
            SType::Int64,
            SType::Float64,
            SType::String,
            SType::Timestamp64,
        ] {
            assert_eq!(SValue::new(stype).get_type(), stype);
        }
    }

    #[test]
    fn test_compare() {
        assert_eq!(SValue::Int64(1).compare(&SValue::Int64(2)).unwrap(), Ordering::Less);
        assert_eq!(SValue::Int64(2).compare(&SValue::Float64(1.5)).unwrap(), Ordering::Greater);
        assert_eq!(SValue::Null.compare(&SValue::Int64(-5)).unwrap(), Ordering::Less);
        assert_eq!(SValue::Null.compare(&SValue::Null).unwrap(), Ordering::Equal);
        assert_eq!(
            SValue::from("abc").compare(&SValue::from("abd")).unwrap(),
            Ordering::Less
        );

        let err = SValue::Int64(1).compare(&SValue::from("1")).unwrap_err();
        assert!(matches!(err, QueryError::Type(_)));
    }

    #[test]
    fn test_explicit_conversions() {
        assert_eq!(SValue::from("42").convert_to(SType::Int64).unwrap(), SValue::Int64(42));
        assert_eq!(SValue::Float64(2.9).convert_to(SType::Int64).unwrap(), SValue::Int64(2));
        assert_eq!(SValue::Int64(7).convert_to(SType::String).unwrap(), SValue::from("7"));
        assert_eq!(
            SValue::Int64(1_000).convert_to(SType::Timestamp64).unwrap(),
            SValue::Timestamp64(1_000)
        );

        let err = SValue::from("forty-two").convert_to(SType::Int64).unwrap_err();
        assert_eq!(err, QueryError::Type("can't convert STRING 'forty-two' to INT64".to_string()));

        assert!(SValue::Int64(-1).convert_to(SType::Timestamp64).is_err());
        assert!(SValue::Null.convert_to(SType::Int64).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(SValue::Null.to_string(), "NULL");
        assert_eq!(SValue::Bool(true).to_string(), "true");
        assert_eq!(SValue::Timestamp64(0).to_string(), "1970-01-01 00:00:00");
    }
}
