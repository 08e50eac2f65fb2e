//! Typed value inference for raw cell text.
//!
//! Every cell of a delimited file arrives as text. [`infer`] turns it into a
//! [`TypedValue`] by trying, in order:
//!
//! ```text
//! ""            -> Null
//! true / false  -> Boolean
//! -42           -> Integer   (no fractional part, no exponent)
//! 3.5, 1e3      -> Real
//! 2024-01-05    -> Date      (ISO-8601, UTC)
//! anything else -> Text
//! ```
//!
//! Inference is total: a value that is not recognised as anything more
//! specific is kept as text.

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use regex::Regex;
use rusqlite::types::{ToSqlOutput, Value};
use rusqlite::ToSql;
use serde::Serialize;

static INTEGER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d+$").expect("valid integer pattern"));

static REAL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").expect("valid real pattern")
});

/// Storage class of a column in the working store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StorageType {
    Integer,
    Real,
    Text,
}

impl StorageType {
    /// SQL spelling used in CREATE statements.
    pub fn as_sql(&self) -> &'static str {
        match self {
            StorageType::Integer => "INTEGER",
            StorageType::Real => "REAL",
            StorageType::Text => "TEXT",
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A cell value with its inferred semantic type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Null,
    Integer(i64),
    Real(f64),
    Boolean(bool),
    Date(DateTime<Utc>),
    Text(String),
}

impl TypedValue {
    pub fn is_null(&self) -> bool {
        matches!(self, TypedValue::Null)
    }

    /// Storage class this value implies for a column, or `None` for null.
    pub fn storage_type(&self) -> Option<StorageType> {
        match self {
            TypedValue::Null => None,
            TypedValue::Integer(_) | TypedValue::Boolean(_) => Some(StorageType::Integer),
            TypedValue::Real(_) => Some(StorageType::Real),
            TypedValue::Date(_) | TypedValue::Text(_) => Some(StorageType::Text),
        }
    }

    /// Representation bound into the store.
    pub fn to_value(&self) -> Value {
        match self {
            TypedValue::Null => Value::Null,
            TypedValue::Integer(i) => Value::Integer(*i),
            TypedValue::Real(r) => Value::Real(*r),
            TypedValue::Boolean(b) => Value::Integer(i64::from(*b)),
            TypedValue::Date(d) => Value::Text(format_iso8601(d)),
            TypedValue::Text(s) => Value::Text(s.clone()),
        }
    }
}

impl ToSql for TypedValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::Owned(self.to_value()))
    }
}

/// ISO-8601 with millisecond precision and a `Z` suffix.
pub fn format_iso8601(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Infer the typed value of a raw cell.
pub fn infer(raw: &str) -> TypedValue {
    let value = raw.trim();
    if value.is_empty() {
        return TypedValue::Null;
    }

    match value {
        "true" => return TypedValue::Boolean(true),
        "false" => return TypedValue::Boolean(false),
        _ => {}
    }

    if INTEGER_PATTERN.is_match(value) {
        if let Ok(i) = value.parse::<i64>() {
            return TypedValue::Integer(i);
        }
        // Out of i64 range: still a number.
        if let Ok(r) = value.parse::<f64>() {
            return TypedValue::Real(r);
        }
    }

    if REAL_PATTERN.is_match(value) {
        if let Ok(r) = value.parse::<f64>() {
            if r.is_finite() {
                return TypedValue::Real(r);
            }
        }
    }

    if let Some(date) = parse_date(value) {
        return TypedValue::Date(date);
    }

    // Trimming only decides the type; text keeps its padding.
    TypedValue::Text(raw.to_string())
}

/// Parse the ISO-8601 shapes recognised as dates. Zone-less values are UTC.
fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    // Cheap rejection before trying chrono formats.
    let bytes = value.as_bytes();
    if bytes.len() < 7 || !bytes[..4].iter().all(u8::is_ascii_digit) || bytes[4] != b'-' {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M%:z", "%Y-%m-%dT%H:%M%z"] {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%dT%H:%MZ",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    let date = if bytes.len() == 7 {
        NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d").ok()?
    } else {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?
    };
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}
