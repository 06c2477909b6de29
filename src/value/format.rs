//! SQL literal rendering, one strategy per dialect family.

use super::{format_timestamp, Value};
use chrono::{NaiveDateTime, Timelike};

/// How binary values are written as literals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobStyle {
    /// `X'CAFE'` (SQL standard, DuckDB, MySQL, H2, HSQLDB)
    XQuoted,
    /// `'\xcafe'` (PostgreSQL bytea hex format)
    Bytea,
    /// `0xCAFE` (SQL Server)
    HexPrefix,
}

/// Renders a [`Value`] as a SQL literal.
///
/// Implementations only override what their dialect does differently;
/// the provided [`format`](LiteralFormatter::format) dispatches per variant.
pub trait LiteralFormatter: Send + Sync {
    fn format(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => self.format_bool(*b),
            Value::Float(x) => self.format_float(*x),
            Value::Blob(bytes) => self.format_blob(bytes),
            Value::Timestamp(ts) => self.format_timestamp(ts),
            v if v.is_quoted() => quote(&v.to_plain_string()),
            v => v.to_plain_string(),
        }
    }

    fn format_bool(&self, b: bool) -> String {
        b.to_string()
    }

    /// Non-finite floats have no bare literal; the quoted names cast to
    /// floating point on insert.
    fn format_float(&self, x: f64) -> String {
        if x.is_nan() {
            quote("NaN")
        } else if x.is_infinite() {
            quote(if x > 0.0 { "Infinity" } else { "-Infinity" })
        } else {
            x.to_string()
        }
    }

    fn format_blob(&self, bytes: &[u8]) -> String {
        format!("X'{}'", hex::encode_upper(bytes))
    }

    fn format_timestamp(&self, ts: &NaiveDateTime) -> String {
        quote(&format_timestamp(ts))
    }
}

/// Single-quote a string literal, doubling embedded quotes
pub fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Formatter shared by every dialect without special temporal handling.
#[derive(Debug, Clone, Copy)]
pub struct StandardFormatter {
    pub bool_as_int: bool,
    pub blob_style: BlobStyle,
}

impl StandardFormatter {
    pub const fn new(blob_style: BlobStyle) -> Self {
        Self {
            bool_as_int: false,
            blob_style,
        }
    }

    pub const fn with_bool_as_int(mut self) -> Self {
        self.bool_as_int = true;
        self
    }
}

impl LiteralFormatter for StandardFormatter {
    fn format_bool(&self, b: bool) -> String {
        if self.bool_as_int {
            u8::from(b).to_string()
        } else {
            b.to_string()
        }
    }

    fn format_blob(&self, bytes: &[u8]) -> String {
        match self.blob_style {
            BlobStyle::XQuoted => format!("X'{}'", hex::encode_upper(bytes)),
            BlobStyle::Bytea => format!("'\\x{}'", hex::encode(bytes)),
            BlobStyle::HexPrefix => format!("0x{}", hex::encode_upper(bytes)),
        }
    }
}

/// Oracle has no bare timestamp literal; timestamps go through
/// `TO_DATE` (second precision) or `TO_TIMESTAMP` (fractional seconds).
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleFormatter;

impl LiteralFormatter for OracleFormatter {
    fn format_bool(&self, b: bool) -> String {
        u8::from(b).to_string()
    }

    fn format_blob(&self, bytes: &[u8]) -> String {
        format!("HEXTORAW('{}')", hex::encode_upper(bytes))
    }

    fn format_timestamp(&self, ts: &NaiveDateTime) -> String {
        if ts.nanosecond() % 1_000_000_000 == 0 {
            return format!(
                "TO_DATE('{}', 'yyyy-mm-dd-HH24-mi-ss')",
                ts.format("%Y-%m-%d-%H-%M-%S")
            );
        }

        let text = format_timestamp(ts);
        let padded = match text.rsplit_once('.') {
            Some((_, frac)) if frac.len() < 3 => format!("{text}{}", "0".repeat(3 - frac.len())),
            _ => text,
        };
        format!("TO_TIMESTAMP('{padded}', 'YYYY-MM-DD HH24:MI:SS.FF')")
    }
}
