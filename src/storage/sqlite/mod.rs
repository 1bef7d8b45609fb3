//! Shared `SQLite` helpers for the relational and graph stores.

mod connection;

pub use connection::{acquire_lock, configure_connection, open_connection, open_in_memory};

use crate::models::{Row, Value};
use rusqlite::Row as SqlRow;
use rusqlite::ToSql;
use rusqlite::types::{ToSqlOutput, Value as SqlValue, ValueRef};

/// Dates are stored as `YYYY-MM-DD` text and timestamps as RFC 3339 text;
/// [`crate::models::RowReader`] parses both back.
impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Self::Null => ToSqlOutput::Owned(SqlValue::Null),
            Self::Integer(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            Self::Real(r) => ToSqlOutput::Owned(SqlValue::Real(*r)),
            Self::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Self::Date(d) => ToSqlOutput::Owned(SqlValue::Text(d.format("%Y-%m-%d").to_string())),
            Self::Timestamp(t) => ToSqlOutput::Owned(SqlValue::Text(t.to_rfc3339())),
        })
    }
}

/// Converts a borrowed `SQLite` value into a [`Value`].
#[must_use]
pub fn value_from_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(r) => Value::Real(r),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::Text(String::from_utf8_lossy(bytes).into_owned())
        },
    }
}

/// Reads every column of a result row into a [`Row`] keyed by column name.
///
/// # Errors
///
/// Returns the underlying `rusqlite` error if a column cannot be read.
pub fn read_row(row: &SqlRow<'_>, columns: &[String]) -> rusqlite::Result<Row> {
    let mut map = Row::new();
    for (index, name) in columns.iter().enumerate() {
        map.insert(name.clone(), value_from_ref(row.get_ref(index)?));
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    #[test]
    fn test_values_survive_a_sqlite_roundtrip() {
        let conn = open_in_memory("test").unwrap();
        conn.execute("CREATE TABLE t (a, b, c, d, e)", []).unwrap();

        let timestamp = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let date = NaiveDate::from_ymd_opt(1990, 5, 10).unwrap();
        conn.execute(
            "INSERT INTO t VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                Value::Integer(7),
                Value::from("jazz"),
                Value::Timestamp(timestamp),
                Value::Date(date),
                Value::Null,
            ],
        )
        .unwrap();

        let columns: Vec<String> = ["a", "b", "c", "d", "e"].map(String::from).to_vec();
        let row = conn
            .query_row("SELECT a, b, c, d, e FROM t", [], |r| read_row(r, &columns))
            .unwrap();

        assert_eq!(row["a"], Value::Integer(7));
        assert_eq!(row["b"], Value::from("jazz"));
        assert_eq!(row["c"], Value::Text(timestamp.to_rfc3339()));
        assert_eq!(row["d"], Value::from("1990-05-10"));
        assert!(row["e"].is_null());
    }
}
