//! In-memory relational store for testing.
//!
//! Supports plain tables only; join expressions are rejected. Rows get an
//! `id` column assigned on insert when they do not carry one.

use super::{is_plain_table, validate_column, validate_table};
use crate::models::{COMMUNITY_TABLE, Row, USER_COMMUNITY_TABLE, USER_TABLE, Value};
use crate::storage::traits::RelationalStore;
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug, Default)]
struct Table {
    rows: Vec<Row>,
    last_id: i64,
}

/// Column sets that must be unique per table, mirroring the `SQLite` schema.
fn unique_keys(table: &str) -> &'static [&'static [&'static str]] {
    match table {
        USER_TABLE => &[&["id"], &["username"]],
        COMMUNITY_TABLE => &[&["id"], &["community_name"]],
        USER_COMMUNITY_TABLE => &[&["user_id", "community_id"]],
        _ => &[&["id"]],
    }
}

fn matches(row: &Row, constraints: &Row) -> bool {
    constraints
        .iter()
        .all(|(column, value)| row.get(column) == Some(value))
}

/// In-memory relational store.
#[derive(Debug, Default)]
pub struct InMemoryRelationalStore {
    tables: RwLock<HashMap<String, Table>>,
}

impl InMemoryRelationalStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows in `table`.
    #[must_use]
    pub fn row_count(&self, table: &str) -> usize {
        self.tables
            .read()
            .map(|t| t.get(table).map_or(0, |table| table.rows.len()))
            .unwrap_or(0)
    }
}

fn require_plain(table: &str) -> Result<()> {
    validate_table(table)?;
    if is_plain_table(table) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "in-memory store does not support joins: '{table}'"
        )))
    }
}

impl RelationalStore for InMemoryRelationalStore {
    fn put(&self, columns: &Row, table: &str) -> Result<i64> {
        require_plain(table)?;
        for column in columns.keys() {
            validate_column(column)?;
        }

        let mut tables = self
            .tables
            .write()
            .map_err(|e| Error::operation("relational_write_lock", e))?;
        let entry = tables.entry(table.to_string()).or_default();

        let mut row = columns.clone();
        let id = match row.get("id").and_then(Value::as_i64) {
            Some(id) => id,
            None => entry.last_id + 1,
        };
        row.insert("id".to_string(), Value::Integer(id));

        for key in unique_keys(table) {
            let probe: Row = key
                .iter()
                .filter_map(|column| row.get(*column).map(|v| ((*column).to_string(), v.clone())))
                .collect();
            if probe.len() == key.len() && entry.rows.iter().any(|existing| matches(existing, &probe)) {
                return Err(Error::operation(
                    format!("insert_{}", table.to_lowercase()),
                    format!("UNIQUE constraint failed: {table}.{}", key.join(", ")),
                ));
            }
        }

        entry.last_id = entry.last_id.max(id);
        entry.rows.push(row);
        Ok(id)
    }

    fn get(&self, constraints: &Row, table: &str) -> Result<Vec<Row>> {
        require_plain(table)?;
        for column in constraints.keys() {
            validate_column(column)?;
        }

        let tables = self
            .tables
            .read()
            .map_err(|e| Error::operation("relational_read_lock", e))?;
        Ok(tables
            .get(table)
            .map(|t| {
                t.rows
                    .iter()
                    .filter(|row| matches(row, constraints))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
