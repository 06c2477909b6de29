//! Typed SQL values carried by dataset rows.
//!
//! Values come out of query results, get copied along foreign keys and are
//! finally rendered as dialect-specific SQL literals (see [`format`]).

pub mod format;

pub use format::{LiteralFormatter, OracleFormatter, StandardFormatter};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// A single column value.
///
/// `Null` doubles as the "unknown" marker: a row column holding `Null` may be
/// filled in later by a merge or a backfill.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Exact numeric kept in its textual form to preserve scale (`7.00`)
    Decimal(String),
    Text(String),
    Date(NaiveDate),
    Time(NaiveTime),
    /// Time with zone, kept as reported by the driver
    TimeTz(String),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<FixedOffset>),
    Blob(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Integer payload, if this is an integer value
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// True for values rendered inside single quotes in every dialect
    pub fn is_quoted(&self) -> bool {
        matches!(
            self,
            Value::Text(_)
                | Value::Date(_)
                | Value::Time(_)
                | Value::TimeTz(_)
                | Value::Timestamp(_)
                | Value::TimestampTz(_)
        )
    }

    /// Canonical textual form, without SQL quoting.
    ///
    /// `Null` renders as the empty string so that primary-key concatenation
    /// treats it as the smallest value.
    pub fn to_plain_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Decimal(s) | Value::Text(s) | Value::TimeTz(s) => s.clone(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::Time(t) => format!("{}{}", t.format("%H:%M:%S"), fraction(t.nanosecond())),
            Value::Timestamp(ts) => format_timestamp(ts),
            Value::TimestampTz(ts) => format!(
                "{}{}",
                format_timestamp(&ts.naive_local()),
                ts.format("%:z")
            ),
            Value::Blob(bytes) => hex::encode(bytes),
        }
    }

    /// Ordering used for primary keys whose columns are all integers.
    pub(crate) fn cmp_int(&self, other: &Value) -> Option<Ordering> {
        Some(self.as_i64()?.cmp(&other.as_i64()?))
    }
}

/// `yyyy-mm-dd hh:mm:ss[.fff]`, trailing zeros of the fraction dropped
pub(crate) fn format_timestamp(ts: &NaiveDateTime) -> String {
    format!(
        "{}{}",
        ts.format("%Y-%m-%d %H:%M:%S"),
        fraction(ts.nanosecond())
    )
}

fn fraction(nanos: u32) -> String {
    // Leap seconds are reported past 1_000_000_000
    let nanos = nanos % 1_000_000_000;
    if nanos == 0 {
        return String::new();
    }
    let digits = format!("{nanos:09}");
    format!(".{}", digits.trim_end_matches('0'))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            other => write!(f, "{}", other.to_plain_string()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Float(x) => serializer.serialize_f64(*x),
            other => serializer.serialize_str(&other.to_plain_string()),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(ts: NaiveDateTime) -> Self {
        Value::Timestamp(ts)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
