//! Row and value conversion helpers shared by the repositories
//!
//! Timestamps are stored as Unix milliseconds; ids and enums as their
//! stable text forms. Conversion failures surface as `Error::Store` so a
//! corrupt row reads as a store fault, not a panic.

#![allow(clippy::cast_precision_loss)] // SQLite may return INTEGER where REAL is expected

use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use libsql::Value;

use crate::error::{Error, Result};

pub(super) fn ms(instant: DateTime<Utc>) -> i64 {
    instant.timestamp_millis()
}

pub(super) fn instant(raw_ms: i64, column: &str) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(raw_ms)
        .ok_or_else(|| Error::Store(format!("column {column}: out-of-range timestamp {raw_ms}")))
}

pub(super) fn parse<T>(raw: &str, column: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse()
        .map_err(|error| Error::Store(format!("column {column}: {error}")))
}

pub(super) fn opt_text(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |text| Value::Text(text.to_string()))
}

pub(super) fn opt_real(value: Option<f64>) -> Value {
    value.map_or(Value::Null, Value::Real)
}

pub(super) fn opt_ms(value: Option<DateTime<Utc>>) -> Value {
    value.map_or(Value::Null, |instant| Value::Integer(ms(instant)))
}

pub(super) fn get_opt_text(row: &libsql::Row, idx: i32, column: &str) -> Result<Option<String>> {
    match row.get_value(idx)? {
        Value::Null => Ok(None),
        Value::Text(text) => Ok(Some(text)),
        other => Err(Error::Store(format!(
            "column {column}: expected text, got {other:?}"
        ))),
    }
}

pub(super) fn get_opt_real(row: &libsql::Row, idx: i32, column: &str) -> Result<Option<f64>> {
    match row.get_value(idx)? {
        Value::Null => Ok(None),
        Value::Real(real) => Ok(Some(real)),
        Value::Integer(int) => Ok(Some(int as f64)),
        other => Err(Error::Store(format!(
            "column {column}: expected real, got {other:?}"
        ))),
    }
}

pub(super) fn get_opt_instant(
    row: &libsql::Row,
    idx: i32,
    column: &str,
) -> Result<Option<DateTime<Utc>>> {
    match row.get_value(idx)? {
        Value::Null => Ok(None),
        Value::Integer(raw_ms) => instant(raw_ms, column).map(Some),
        other => Err(Error::Store(format!(
            "column {column}: expected integer, got {other:?}"
        ))),
    }
}
