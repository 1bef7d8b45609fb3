//! Loosely typed attribute values shared by both stores.
//!
//! Relational rows and graph records are both plain maps from column (or
//! field) name to [`Value`]. Typed models are built from them through
//! [`RowReader`], which reports every missing or mistyped column as
//! [`Error::MalformedRow`] instead of panicking.

use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL `NULL` / absent property.
    Null,
    /// 64-bit signed integer.
    Integer(i64),
    /// Floating point number.
    Real(f64),
    /// UTF-8 text.
    Text(String),
    /// Calendar date without a time zone.
    Date(NaiveDate),
    /// Point in time, always UTC.
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Returns the text payload, if this is [`Value::Text`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer payload, if this is [`Value::Integer`].
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short type name used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::Text(_) => "text",
            Self::Date(_) => "date",
            Self::Timestamp(_) => "timestamp",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Real(r) => write!(f, "{r}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// A row (or parameter map): column name to value.
pub type Row = BTreeMap<String, Value>;

/// One result record from a graph statement.
///
/// Records only expose lookup by field name, so nothing driver-specific
/// leaks out of a graph store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Row,
}

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Looks up a field by name. `None` means the field was not returned.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

impl From<Row> for Record {
    fn from(fields: Row) -> Self {
        Self { fields }
    }
}

/// Collects the text values of one field across records.
///
/// Records that lack the field, or carry a non-text value there, are skipped.
#[must_use]
pub fn strings_from_records(records: &[Record], field: &str) -> Vec<String> {
    records
        .iter()
        .filter_map(|record| record.get(field).and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

/// Typed, validating access to a loosely typed row.
pub struct RowReader<'a> {
    row: &'a Row,
    table: &'a str,
}

impl<'a> RowReader<'a> {
    /// Wraps a row read from `table`.
    #[must_use]
    pub const fn new(row: &'a Row, table: &'a str) -> Self {
        Self { row, table }
    }

    fn malformed(&self, column: &str, reason: impl Into<String>) -> Error {
        Error::MalformedRow {
            table: self.table.to_string(),
            column: column.to_string(),
            reason: reason.into(),
        }
    }

    fn present(&self, column: &str) -> Result<&'a Value> {
        self.row
            .get(column)
            .ok_or_else(|| self.malformed(column, "is missing"))
    }

    fn optional(&self, column: &str) -> Option<&'a Value> {
        self.row.get(column).filter(|value| !value.is_null())
    }

    /// Reads a required text column.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedRow`] if the column is missing or not text.
    pub fn text(&self, column: &str) -> Result<String> {
        match self.present(column)? {
            Value::Text(s) => Ok(s.clone()),
            other => Err(self.malformed(column, format!("expected text, got {}", other.type_name()))),
        }
    }

    /// Reads a text column that may be null or absent (read as empty).
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedRow`] if the column holds a non-text value.
    pub fn text_or_empty(&self, column: &str) -> Result<String> {
        match self.optional(column) {
            None => Ok(String::new()),
            Some(Value::Text(s)) => Ok(s.clone()),
            Some(other) => Err(self.malformed(
                column,
                format!("expected text, got {}", other.type_name()),
            )),
        }
    }

    /// Reads a required integer column.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedRow`] if the column is missing or not an integer.
    pub fn integer(&self, column: &str) -> Result<i64> {
        match self.present(column)? {
            Value::Integer(i) => Ok(*i),
            other => Err(self.malformed(
                column,
                format!("expected integer, got {}", other.type_name()),
            )),
        }
    }

    /// Reads an integer column that may be null or absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedRow`] if the column holds a non-integer value.
    pub fn optional_integer(&self, column: &str) -> Result<Option<i64>> {
        match self.optional(column) {
            None => Ok(None),
            Some(Value::Integer(i)) => Ok(Some(*i)),
            Some(other) => Err(self.malformed(
                column,
                format!("expected integer, got {}", other.type_name()),
            )),
        }
    }

    /// Reads a required timestamp. Text in RFC 3339 or `YYYY-MM-DD HH:MM:SS`
    /// form is accepted, since `SQLite` has no native timestamp type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedRow`] if the column is missing or unparsable.
    pub fn timestamp(&self, column: &str) -> Result<DateTime<Utc>> {
        match self.present(column)? {
            Value::Timestamp(t) => Ok(*t),
            Value::Text(s) => parse_timestamp(s)
                .ok_or_else(|| self.malformed(column, format!("unparsable timestamp '{s}'"))),
            other => Err(self.malformed(
                column,
                format!("expected timestamp, got {}", other.type_name()),
            )),
        }
    }

    /// Reads a date column that may be null or absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedRow`] if the column is unparsable.
    pub fn optional_date(&self, column: &str) -> Result<Option<NaiveDate>> {
        match self.optional(column) {
            None => Ok(None),
            Some(Value::Date(d)) => Ok(Some(*d)),
            Some(Value::Timestamp(t)) => Ok(Some(t.date_naive())),
            Some(Value::Text(s)) => parse_date(s)
                .map(Some)
                .ok_or_else(|| self.malformed(column, format!("unparsable date '{s}'"))),
            Some(other) => Err(self.malformed(
                column,
                format!("expected date, got {}", other.type_name()),
            )),
        }
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(s).map(|t| t.date_naive()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::from("jazz"), Value::Text("jazz".to_string()));
        assert_eq!(Value::from(7_i64), Value::Integer(7));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(3_i64)).as_i64(), Some(3));
        assert_eq!(Value::Text("x".into()).as_i64(), None);
    }

    #[test]
    fn test_record_get() {
        let record = Record::new().with("friend", "bob");
        assert_eq!(record.get("friend").and_then(Value::as_str), Some("bob"));
        assert!(record.get("genre").is_none());
    }

    #[test]
    fn test_strings_from_records_skips_missing_and_non_text() {
        let records = vec![
            Record::new().with("genre", "jazz"),
            Record::new().with("other", "rock"),
            Record::new().with("genre", 4_i64),
            Record::new().with("genre", "blues"),
        ];
        assert_eq!(strings_from_records(&records, "genre"), vec!["jazz", "blues"]);
    }

    #[test]
    fn test_reader_reports_missing_column() {
        let r = row(&[("username", Value::from("alice"))]);
        let reader = RowReader::new(&r, "USERS");
        let err = reader.text("email").unwrap_err();
        assert!(matches!(err, Error::MalformedRow { ref column, .. } if column == "email"));
    }

    #[test]
    fn test_reader_reports_wrong_type() {
        let r = row(&[("id", Value::from("one"))]);
        let reader = RowReader::new(&r, "USERS");
        let err = reader.integer("id").unwrap_err();
        assert!(err.to_string().contains("expected integer, got text"));
    }

    #[test]
    fn test_reader_parses_text_timestamps_and_dates() {
        let r = row(&[
            ("register_date", Value::from("2024-03-01T10:00:00+00:00")),
            ("created_at", Value::from("2024-03-01 10:00:00")),
            ("birth_date", Value::from("1990-05-10")),
            ("blank", Value::Null),
        ]);
        let reader = RowReader::new(&r, "USERS");

        let registered = reader.timestamp("register_date").unwrap();
        assert_eq!(registered, reader.timestamp("created_at").unwrap());
        assert_eq!(
            reader.optional_date("birth_date").unwrap(),
            NaiveDate::from_ymd_opt(1990, 5, 10)
        );
        assert_eq!(reader.optional_date("blank").unwrap(), None);
        assert_eq!(reader.optional_integer("absent").unwrap(), None);
        assert_eq!(reader.text_or_empty("blank").unwrap(), "");
    }

    #[test]
    fn test_reader_rejects_garbage_timestamp() {
        let r = row(&[("register_date", Value::from("yesterday"))]);
        let reader = RowReader::new(&r, "USERS");
        assert!(reader.timestamp("register_date").is_err());
    }
}
