//! Conversions between DuckDB values and [`Value`].

use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveTime};
use duckdb::types::{TimeUnit, ToSql, ToSqlOutput, Value as DuckValue, ValueRef};

/// Days from 0001-01-01 to 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn to_micros(unit: TimeUnit, amount: i64) -> i64 {
    match unit {
        TimeUnit::Second => amount.saturating_mul(1_000_000),
        TimeUnit::Millisecond => amount.saturating_mul(1_000),
        TimeUnit::Microsecond => amount,
        TimeUnit::Nanosecond => amount / 1_000,
    }
}

/// True when the native conversion of this cell may lose information.
///
/// Time and timestamp cells may carry a zone DuckDB strips from the native
/// form; intervals, lists, structs and other nested types have no native
/// counterpart at all. Such columns are re-read through their text form.
pub fn needs_text_form(value: &ValueRef<'_>) -> bool {
    !matches!(
        value,
        ValueRef::Null
            | ValueRef::Boolean(_)
            | ValueRef::TinyInt(_)
            | ValueRef::SmallInt(_)
            | ValueRef::Int(_)
            | ValueRef::BigInt(_)
            | ValueRef::UTinyInt(_)
            | ValueRef::USmallInt(_)
            | ValueRef::UInt(_)
            | ValueRef::UBigInt(_)
            | ValueRef::HugeInt(_)
            | ValueRef::Float(_)
            | ValueRef::Double(_)
            | ValueRef::Decimal(_)
            | ValueRef::Text(_)
            | ValueRef::Blob(_)
            | ValueRef::Date32(_)
    )
}

/// Value of a cell from its DuckDB type name and text form, or `None` when
/// the native conversion of that type is exact.
pub fn from_text_form(type_name: &str, text: String) -> Option<Value> {
    match type_name {
        "TIME WITH TIME ZONE" => Some(Value::TimeTz(text)),
        "TIMESTAMP WITH TIME ZONE" => Some(
            DateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S%.f%#z")
                .map(Value::TimestampTz)
                .unwrap_or(Value::Text(text)),
        ),
        "TIME" | "TIMESTAMP" | "TIMESTAMP_S" | "TIMESTAMP_MS" | "TIMESTAMP_NS" => None,
        _ => Some(Value::Text(text)),
    }
}

/// Convert one result cell. Cells for which [`needs_text_form`] holds and
/// that have no native counterpart become `Null` here; [`Database::query`]
/// replaces them with their text form.
///
/// [`Database::query`]: super::Database::query
pub fn from_value_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Boolean(b) => Value::Bool(b),
        ValueRef::TinyInt(n) => Value::Int(n.into()),
        ValueRef::SmallInt(n) => Value::Int(n.into()),
        ValueRef::Int(n) => Value::Int(n.into()),
        ValueRef::BigInt(n) => Value::Int(n),
        ValueRef::UTinyInt(n) => Value::Int(n.into()),
        ValueRef::USmallInt(n) => Value::Int(n.into()),
        ValueRef::UInt(n) => Value::Int(n.into()),
        ValueRef::UBigInt(n) => i64::try_from(n)
            .map(Value::Int)
            .unwrap_or_else(|_| Value::Decimal(n.to_string())),
        ValueRef::HugeInt(n) => i64::try_from(n)
            .map(Value::Int)
            .unwrap_or_else(|_| Value::Decimal(n.to_string())),
        ValueRef::Float(f) => Value::Float(f.into()),
        ValueRef::Double(f) => Value::Float(f),
        ValueRef::Decimal(d) => Value::Decimal(d.to_string()),
        ValueRef::Text(s) => Value::Text(String::from_utf8_lossy(s).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
        ValueRef::Date32(days) => {
            NaiveDate::from_num_days_from_ce_opt(UNIX_EPOCH_DAYS_FROM_CE + days)
                .map(Value::Date)
                .unwrap_or_else(|| Value::Text(days.to_string()))
        }
        ValueRef::Time64(unit, amount) => {
            let micros = to_micros(unit, amount);
            let secs = (micros / 1_000_000) as u32;
            let nanos = ((micros % 1_000_000) * 1_000) as u32;
            NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
                .map(Value::Time)
                .unwrap_or_else(|| Value::Text(amount.to_string()))
        }
        ValueRef::Timestamp(unit, amount) => DateTime::from_timestamp_micros(to_micros(unit, amount))
            .map(|dt| Value::Timestamp(dt.naive_utc()))
            .unwrap_or_else(|| Value::Text(amount.to_string())),
        _ => Value::Null,
    }
}

/// Bind parameters. Exact numerics and temporal values travel as text and
/// are cast by DuckDB against the compared column.
impl ToSql for Value {
    fn to_sql(&self) -> duckdb::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(DuckValue::Null),
            Value::Bool(b) => ToSqlOutput::Owned(DuckValue::Boolean(*b)),
            Value::Int(n) => ToSqlOutput::Owned(DuckValue::BigInt(*n)),
            Value::Float(f) => ToSqlOutput::Owned(DuckValue::Double(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
            other => ToSqlOutput::Owned(DuckValue::Text(other.to_plain_string())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_units() {
        let expected = NaiveDate::from_ymd_opt(2021, 3, 4)
            .unwrap()
            .and_hms_opt(5, 6, 7)
            .unwrap();
        let secs = expected.and_utc().timestamp();
        assert_eq!(
            from_value_ref(ValueRef::Timestamp(TimeUnit::Second, secs)),
            Value::Timestamp(expected)
        );
        assert_eq!(
            from_value_ref(ValueRef::Timestamp(TimeUnit::Microsecond, secs * 1_000_000)),
            Value::Timestamp(expected)
        );
    }

    #[test]
    fn test_text_form_by_type_name() {
        assert_eq!(
            from_text_form("TIME WITH TIME ZONE", "10:00:00+02".into()),
            Some(Value::TimeTz("10:00:00+02".into()))
        );
        assert_eq!(
            from_text_form("INTERVAL", "3 days".into()),
            Some(Value::Text("3 days".into()))
        );
        assert_eq!(from_text_form("TIMESTAMP", "2021-03-04 05:06:07".into()), None);

        let Some(Value::TimestampTz(ts)) =
            from_text_form("TIMESTAMP WITH TIME ZONE", "2021-03-04 05:06:07+02".into())
        else {
            panic!("expected a zoned timestamp");
        };
        assert_eq!(ts.offset().local_minus_utc(), 7200);
    }

    #[test]
    fn test_only_exact_natives_skip_text_form() {
        assert!(!needs_text_form(&ValueRef::Int(1)));
        assert!(!needs_text_form(&ValueRef::Null));
        assert!(needs_text_form(&ValueRef::Time64(TimeUnit::Microsecond, 0)));
        assert!(needs_text_form(&ValueRef::Timestamp(TimeUnit::Microsecond, 0)));
    }

    #[test]
    fn test_wide_integers_degrade_to_decimal() {
        assert_eq!(
            from_value_ref(ValueRef::UBigInt(u64::MAX)),
            Value::Decimal(u64::MAX.to_string())
        );
        assert_eq!(from_value_ref(ValueRef::HugeInt(42)), Value::Int(42));
    }
}
