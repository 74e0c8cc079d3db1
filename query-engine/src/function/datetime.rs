//! Date and time functions.
//!
//! | function | signature |
//! |---|---|
//! | `now` | `() -> TIMESTAMP64` |
//! | `from_timestamp` | `(INT64) -> TIMESTAMP64`, `(FLOAT64) -> TIMESTAMP64` |
//! | `date_trunc` | `(STRING window, TIMESTAMP64) -> TIMESTAMP64` |
//! | `date_add` | `(TIMESTAMP64, STRING amount, STRING unit) -> TIMESTAMP64` |
//! | `time_at` | `(STRING) -> TIMESTAMP64` |
//!
//! Months and years are fixed-length (30 and 365 days); none of the
//! arithmetic here is calendar aware.

use super::{human, register_builtin, FunctionRegistry};
use crate::transaction::Transaction;
use crate::vm::VmStack;
use common::time::{
    MICROS_PER_DAY, MICROS_PER_HOUR, MICROS_PER_MILLI, MICROS_PER_MINUTE, MICROS_PER_MONTH,
    MICROS_PER_SECOND, MICROS_PER_WEEK, MICROS_PER_YEAR,
};
use common::{QueryError, Result, SType};

/// Simple units and their length in microseconds.
const TIME_WINDOWS: [(&str, u64); 25] = [
    ("ms", MICROS_PER_MILLI),
    ("msec", MICROS_PER_MILLI),
    ("millisecond", MICROS_PER_MILLI),
    ("milliseconds", MICROS_PER_MILLI),
    ("s", MICROS_PER_SECOND),
    ("sec", MICROS_PER_SECOND),
    ("second", MICROS_PER_SECOND),
    ("seconds", MICROS_PER_SECOND),
    ("min", MICROS_PER_MINUTE),
    ("minute", MICROS_PER_MINUTE),
    ("minutes", MICROS_PER_MINUTE),
    ("h", MICROS_PER_HOUR),
    ("hour", MICROS_PER_HOUR),
    ("hours", MICROS_PER_HOUR),
    ("d", MICROS_PER_DAY),
    ("day", MICROS_PER_DAY),
    ("days", MICROS_PER_DAY),
    ("w", MICROS_PER_WEEK),
    ("week", MICROS_PER_WEEK),
    ("weeks", MICROS_PER_WEEK),
    ("month", MICROS_PER_MONTH),
    ("months", MICROS_PER_MONTH),
    ("y", MICROS_PER_YEAR),
    ("year", MICROS_PER_YEAR),
    ("years", MICROS_PER_YEAR),
];

/// Length of a simple unit in microseconds. `unit` must already be lower case.
pub fn unit_micros(unit: &str) -> Option<u64> {
    TIME_WINDOWS
        .iter()
        .find(|(name, _)| *name == unit)
        .map(|(_, micros)| *micros)
}

enum Layout {
    /// Components joined by a single separator.
    Separated(char),
    /// `<days> <h>:<m>[:<s>]`
    DayPrefixed,
}

/// A multi-component duration such as `HOUR_SECOND` (`"1:20:30"`).
struct CompositeUnit {
    name: &'static str,
    shape: &'static str,
    layout: Layout,
    weights: &'static [u64],
}

const COMPOSITE_UNITS: [CompositeUnit; 7] = [
    CompositeUnit {
        name: "minute_second",
        shape: "minutes:seconds",
        layout: Layout::Separated(':'),
        weights: &[MICROS_PER_MINUTE, MICROS_PER_SECOND],
    },
    CompositeUnit {
        name: "hour_second",
        shape: "hours:minutes:seconds",
        layout: Layout::Separated(':'),
        weights: &[MICROS_PER_HOUR, MICROS_PER_MINUTE, MICROS_PER_SECOND],
    },
    CompositeUnit {
        name: "hour_minute",
        shape: "hours:minutes",
        layout: Layout::Separated(':'),
        weights: &[MICROS_PER_HOUR, MICROS_PER_MINUTE],
    },
    CompositeUnit {
        name: "day_second",
        shape: "days hours:minutes:seconds",
        layout: Layout::DayPrefixed,
        weights: &[MICROS_PER_DAY, MICROS_PER_HOUR, MICROS_PER_MINUTE, MICROS_PER_SECOND],
    },
    CompositeUnit {
        name: "day_minute",
        shape: "days hours:minutes",
        layout: Layout::DayPrefixed,
        weights: &[MICROS_PER_DAY, MICROS_PER_HOUR, MICROS_PER_MINUTE],
    },
    CompositeUnit {
        name: "day_hour",
        shape: "days hours",
        layout: Layout::Separated(' '),
        weights: &[MICROS_PER_DAY, MICROS_PER_HOUR],
    },
    CompositeUnit {
        name: "year_month",
        shape: "years-months",
        layout: Layout::Separated('-'),
        weights: &[MICROS_PER_YEAR, MICROS_PER_MONTH],
    },
];

impl CompositeUnit {
    fn find(unit: &str) -> Option<&'static CompositeUnit> {
        COMPOSITE_UNITS.iter().find(|composite| composite.name == unit)
    }

    fn components<'a>(&self, expr: &'a str) -> Option<Vec<&'a str>> {
        match self.layout {
            Layout::Separated(separator) => Some(expr.split(separator).collect()),
            Layout::DayPrefixed => {
                let (days, time) = expr.split_once(' ')?;
                if time.contains(' ') {
                    return None;
                }
                Some(std::iter::once(days).chain(time.split(':')).collect())
            }
        }
    }

    /// Sums `component * weight` over the components of `expr`.
    fn parse(&self, expr: &str) -> Result<u64> {
        let malformed = || {
            QueryError::Parse(format!(
                "expected expr of type {} for unit {}, got: {}",
                self.shape, self.name, expr
            ))
        };

        let components = self
            .components(expr)
            .filter(|components| components.len() == self.weights.len())
            .ok_or_else(malformed)?;

        let bad_component = |component: &str, reason: &str| {
            QueryError::Parse(format!(
                "expected expr of type {} for unit {}, got: {} (component '{}' {})",
                self.shape, self.name, expr, component, reason
            ))
        };

        let mut total = 0u64;
        for (component, weight) in components.iter().zip(self.weights) {
            if !is_number(component) {
                return Err(bad_component(component, "is not a number"));
            }
            let value: u64 = component
                .parse()
                .map_err(|_| bad_component(component, "is out of range"))?;
            let micros = value
                .checked_mul(*weight)
                .ok_or_else(|| bad_component(component, "is out of range"))?;
            total = total.wrapping_add(micros);
        }
        Ok(total)
    }
}

fn is_number(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

/// Splits `text` into its leading unsigned integer and the rest.
fn split_leading_number(text: &str) -> (&str, &str) {
    let end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    text.split_at(end)
}

/// Parses a `[multiplier]unit` window such as `"5min"` into microseconds.
pub fn parse_window(window: &str) -> Result<u64> {
    let normalized = window.trim().to_ascii_lowercase();
    let (multiplier, unit) = split_leading_number(&normalized);

    let micros = unit_micros(unit.trim())
        .ok_or_else(|| QueryError::Parse(format!("unknown time window {}", window)))?;

    let multiplier = if multiplier.is_empty() {
        1
    } else {
        multiplier
            .parse::<u64>()
            .map_err(|_| QueryError::Parse(format!("invalid time window {}", window)))?
    };

    if multiplier == 0 {
        return Err(QueryError::Parse(format!(
            "invalid time window {}: multiplier must be positive",
            window
        )));
    }

    micros
        .checked_mul(multiplier)
        .ok_or_else(|| QueryError::Parse(format!("time window {} is too large", window)))
}

/// Truncates `timestamp` down to a multiple of `window`.
pub fn date_trunc(window: &str, timestamp: u64) -> Result<u64> {
    let window_micros = parse_window(window)?;
    Ok((timestamp / window_micros) * window_micros)
}

/// Adds the duration `expr` in `unit` to `timestamp`, wrapping on overflow.
///
/// Simple units take a (possibly negative, possibly fractional) number;
/// composite units take their fixed component layout.
pub fn date_add(timestamp: u64, expr: &str, unit: &str) -> Result<u64> {
    let unit = unit.trim().to_ascii_lowercase();

    if let Some(weight) = unit_micros(&unit) {
        let amount = expr
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|amount| amount.is_finite())
            .ok_or_else(|| QueryError::Parse(format!("can't parse expr {} for unit {}", expr, unit)))?;

        let delta = amount * weight as f64;
        if delta.abs() >= i64::MAX as f64 {
            return Err(QueryError::Parse(format!(
                "interval {} {} is out of range",
                expr, unit
            )));
        }
        return Ok(timestamp.wrapping_add_signed(delta as i64));
    }

    let composite = CompositeUnit::find(&unit).ok_or_else(|| {
        QueryError::Parse(format!("unknown unit {} for expr {}", unit, expr))
    })?;

    Ok(timestamp.wrapping_add(composite.parse(expr)?))
}

/// Parses `<n><unit>` (whitespace allowed between them) into microseconds.
fn parse_interval(text: &str) -> Option<u64> {
    let (count, unit) = split_leading_number(text.trim());
    if count.is_empty() {
        return None;
    }
    let count: u64 = count.parse().ok()?;
    unit_micros(unit.trim())?.checked_mul(count)
}

/// Resolves a relative (`now`, `-5min`, `2 hours ago`) or absolute time
/// expression against `now`.
///
/// Relative times before the epoch clamp to the epoch.
pub fn time_at(now: u64, text: &str) -> Result<u64> {
    let trimmed = text.trim();
    let lowered = trimmed.to_ascii_lowercase();

    if lowered == "now" {
        return Ok(now);
    }

    let relative = lowered
        .strip_prefix('-')
        .and_then(parse_interval)
        .or_else(|| lowered.strip_suffix("ago").and_then(parse_interval));
    if let Some(interval) = relative {
        return Ok(now.saturating_sub(interval));
    }

    human::parse_time(trimmed)
        .ok_or_else(|| QueryError::Type(format!("can't convert '{}' to TIMESTAMP64", text)))
}

fn now_call(txn: &Transaction, stack: &mut VmStack) -> Result<()> {
    stack.push_timestamp64(txn.now());
    Ok(())
}

fn from_timestamp_int64_call(_txn: &Transaction, stack: &mut VmStack) -> Result<()> {
    let seconds = stack.pop_int64()?;
    let micros = u64::try_from(seconds)
        .ok()
        .and_then(|seconds| seconds.checked_mul(MICROS_PER_SECOND))
        .ok_or_else(|| {
            QueryError::Runtime(format!("from_timestamp: {} is out of range", seconds))
        })?;
    stack.push_timestamp64(micros);
    Ok(())
}

fn from_timestamp_float64_call(_txn: &Transaction, stack: &mut VmStack) -> Result<()> {
    let seconds = stack.pop_float64()?;
    let micros = seconds * MICROS_PER_SECOND as f64;
    if !micros.is_finite() || micros < 0.0 || micros >= u64::MAX as f64 {
        return Err(QueryError::Runtime(format!(
            "from_timestamp: {} is out of range",
            seconds
        )));
    }
    stack.push_timestamp64(micros as u64);
    Ok(())
}

fn date_trunc_call(_txn: &Transaction, stack: &mut VmStack) -> Result<()> {
    let timestamp = stack.pop_timestamp64()?;
    let window = stack.pop_string()?;
    stack.push_timestamp64(date_trunc(&window, timestamp)?);
    Ok(())
}

fn date_add_call(_txn: &Transaction, stack: &mut VmStack) -> Result<()> {
    let unit = stack.pop_string()?;
    let expr = stack.pop_string()?;
    let timestamp = stack.pop_timestamp64()?;
    stack.push_timestamp64(date_add(timestamp, &expr, &unit)?);
    Ok(())
}

fn time_at_call(txn: &Transaction, stack: &mut VmStack) -> Result<()> {
    let text = stack.pop_string()?;
    stack.push_timestamp64(time_at(txn.now(), &text)?);
    Ok(())
}

pub(crate) fn register(registry: &mut FunctionRegistry) {
    register_builtin(registry, "now", &[], SType::Timestamp64, now_call);
    register_builtin(
        registry,
        "from_timestamp",
        &[SType::Int64],
        SType::Timestamp64,
        from_timestamp_int64_call,
    );
    register_builtin(
        registry,
        "from_timestamp",
        &[SType::Float64],
        SType::Timestamp64,
        from_timestamp_float64_call,
    );
    register_builtin(
        registry,
        "date_trunc",
        &[SType::String, SType::Timestamp64],
        SType::Timestamp64,
        date_trunc_call,
    );
    register_builtin(
        registry,
        "date_add",
        &[SType::Timestamp64, SType::String, SType::String],
        SType::Timestamp64,
        date_add_call,
    );
    register_builtin(registry, "time_at", &[SType::String], SType::Timestamp64, time_at_call);
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::time::FixedClock;
    use common::SValue;
    use std::sync::Arc;

    const T: u64 = 1_500_000_123_456_789;

    fn txn_at(now: u64) -> (Arc<FunctionRegistry>, Transaction) {
        let registry = Arc::new(FunctionRegistry::with_builtins());
        let txn = Transaction::new(Arc::clone(&registry)).with_clock(Arc::new(FixedClock(now)));
        (registry, txn)
    }

    fn call(name: &str, args: Vec<SValue>) -> Result<u64> {
        let (registry, txn) = txn_at(T);
        let types: Vec<_> = args.iter().map(SValue::get_type).collect();
        let function = registry.lookup(name, &types)?;

        let mut stack = VmStack::new();
        for arg in args {
            stack.push(arg);
        }
        function.invoke(&txn, &mut stack)?;
        let result = stack.pop_timestamp64()?;
        assert!(stack.is_empty());
        Ok(result)
    }

    #[test]
    fn test_parse_window() {
        assert_eq!(parse_window("min").unwrap(), MICROS_PER_MINUTE);
        assert_eq!(parse_window("5min").unwrap(), 5 * MICROS_PER_MINUTE);
        assert_eq!(parse_window("15 Seconds").unwrap(), 15 * MICROS_PER_SECOND);
        assert_eq!(parse_window("2months").unwrap(), 60 * MICROS_PER_DAY);

        assert_eq!(
            parse_window("5parsecs").unwrap_err(),
            QueryError::Parse("unknown time window 5parsecs".to_string())
        );
        assert!(matches!(parse_window("0h"), Err(QueryError::Parse(_))));
        assert!(matches!(
            parse_window("99999999999999999999y"),
            Err(QueryError::Parse(_))
        ));
    }

    #[test]
    fn test_now_and_from_timestamp() {
        assert_eq!(call("now", vec![]).unwrap(), T);
        assert_eq!(
            call("from_timestamp", vec![SValue::Int64(1_500_000_000)]).unwrap(),
            1_500_000_000_000_000
        );
        assert_eq!(
            call("from_timestamp", vec![SValue::Float64(1.5)]).unwrap(),
            1_500_000
        );
        assert!(matches!(
            call("from_timestamp", vec![SValue::Int64(-1)]),
            Err(QueryError::Runtime(_))
        ));
        assert!(matches!(
            call("from_timestamp", vec![SValue::Float64(f64::NAN)]),
            Err(QueryError::Runtime(_))
        ));
    }

    #[test]
    fn test_date_trunc_through_stack() {
        let truncated = call(
            "date_trunc",
            vec![SValue::from("1h"), SValue::Timestamp64(T)],
        )
        .unwrap();
        assert_eq!(truncated % MICROS_PER_HOUR, 0);
        assert!(T - truncated < MICROS_PER_HOUR);
    }

    #[test]
    fn test_date_add_simple_units() {
        assert_eq!(date_add(T, "0", "second").unwrap(), T);
        assert_eq!(date_add(T, "1.5", "SECONDS").unwrap(), T + 1_500_000);
        assert_eq!(date_add(T, "-2", "ms").unwrap(), T - 2_000);
        assert_eq!(date_add(T, "1", "year").unwrap(), T + MICROS_PER_YEAR);

        assert_eq!(
            date_add(T, "soon", "minute").unwrap_err(),
            QueryError::Parse("can't parse expr soon for unit minute".to_string())
        );
    }

    #[test]
    fn test_date_add_composite_units() {
        assert_eq!(date_add(T, "1:30", "minute_second").unwrap(), T + 90_000_000);
        assert_eq!(
            date_add(T, "1:20:30", "HOUR_SECOND").unwrap(),
            T + MICROS_PER_HOUR + 20 * MICROS_PER_MINUTE + 30 * MICROS_PER_SECOND
        );
        assert_eq!(
            date_add(T, "2:05", "hour_minute").unwrap(),
            T + 2 * MICROS_PER_HOUR + 5 * MICROS_PER_MINUTE
        );
        assert_eq!(
            date_add(T, "1 10:20:30", "day_second").unwrap(),
            T + MICROS_PER_DAY + 10 * MICROS_PER_HOUR + 20 * MICROS_PER_MINUTE + 30 * MICROS_PER_SECOND
        );
        assert_eq!(
            date_add(T, "3 4:05", "day_minute").unwrap(),
            T + 3 * MICROS_PER_DAY + 4 * MICROS_PER_HOUR + 5 * MICROS_PER_MINUTE
        );
        assert_eq!(
            date_add(T, "1 12", "day_hour").unwrap(),
            T + MICROS_PER_DAY + 12 * MICROS_PER_HOUR
        );
        assert_eq!(
            date_add(T, "1-2", "year_month").unwrap(),
            T + 365 * MICROS_PER_DAY + 60 * MICROS_PER_DAY
        );
    }

    #[test]
    fn test_date_add_composite_errors_name_the_bad_component() {
        // wrong component count carries no component detail
        let count = date_add(T, "90", "minute_second").unwrap_err();
        assert_eq!(
            count,
            QueryError::Parse(
                "expected expr of type minutes:seconds for unit minute_second, got: 90".to_string()
            )
        );
        assert_eq!(
            date_add(T, "1:x", "minute_second").unwrap_err(),
            QueryError::Parse(
                "expected expr of type minutes:seconds for unit minute_second, got: 1:x (component 'x' is not a number)"
                    .to_string()
            )
        );
        assert!(matches!(
            date_add(T, "99999999999999999999:0", "minute_second"),
            Err(QueryError::Parse(msg)) if msg.ends_with("(component '99999999999999999999' is out of range)")
        ));
    }

    #[test]
    fn test_date_add_composite_errors() {
        assert_eq!(
            date_add(T, "1:2:3", "minute_second").unwrap_err(),
            QueryError::Parse(
                "expected expr of type minutes:seconds for unit minute_second, got: 1:2:3".to_string()
            )
        );
        assert!(matches!(
            date_add(T, "1:x", "minute_second"),
            Err(QueryError::Parse(msg)) if msg.contains("1:x")
        ));
        assert!(matches!(
            date_add(T, "-1:30", "minute_second"),
            Err(QueryError::Parse(_))
        ));
        assert!(matches!(
            date_add(T, "1 2 3 4", "day_second"),
            Err(QueryError::Parse(_))
        ));
        assert_eq!(
            date_add(T, "5", "fortnight").unwrap_err(),
            QueryError::Parse("unknown unit fortnight for expr 5".to_string())
        );
    }

    #[test]
    fn test_time_at() {
        assert_eq!(time_at(T, "now").unwrap(), T);
        assert_eq!(time_at(T, " NOW ").unwrap(), T);
        assert_eq!(time_at(T, "-5minutes").unwrap(), T - 5 * MICROS_PER_MINUTE);
        assert_eq!(time_at(T, "5 minutes ago").unwrap(), T - 300_000_000);
        assert_eq!(time_at(T, "2h ago").unwrap(), T - 2 * MICROS_PER_HOUR);
        assert_eq!(time_at(T, "2017-07-14 02:40:00").unwrap(), 1_500_000_000_000_000);
        assert_eq!(time_at(10, "-1d").unwrap(), 0);

        assert_eq!(
            time_at(T, "the day after tomorrow").unwrap_err(),
            QueryError::Type("can't convert 'the day after tomorrow' to TIMESTAMP64".to_string())
        );
        assert!(matches!(time_at(T, "-5fortnights"), Err(QueryError::Type(_))));
    }

    #[test]
    fn test_time_at_through_stack_uses_transaction_clock() {
        let (registry, txn) = txn_at(T);
        let function = registry.lookup("time_at", &[SType::String]).unwrap();

        let mut stack = VmStack::new();
        stack.push_string("1 hour ago".to_string());
        function.invoke(&txn, &mut stack).unwrap();

        assert_eq!(stack.pop_timestamp64().unwrap(), T - MICROS_PER_HOUR);
    }
}
