//! `SQLite` relational store.
//!
//! Holds the `USERS`, `COMMUNITY` and `USER_COMMUNITY` tables. Inserts and
//! lookups are built from validated identifiers with every value bound as a
//! parameter.

use super::{validate_column, validate_table};
use crate::models::{COMMUNITY_TABLE, Row, USER_COMMUNITY_TABLE, USER_TABLE};
use crate::storage::sqlite::{acquire_lock, open_connection, open_in_memory, read_row};
use crate::storage::traits::RelationalStore;
use crate::{Error, Result};
use rusqlite::{Connection, params_from_iter};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::instrument;

/// Builds the schema. Table names come from the model constants.
fn schema() -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {USER_TABLE} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            fullname TEXT NOT NULL DEFAULT '',
            email TEXT NOT NULL DEFAULT '',
            register_date TEXT NOT NULL,
            birth_date TEXT,
            telephone TEXT NOT NULL DEFAULT ''
        );
        CREATE TABLE IF NOT EXISTS {COMMUNITY_TABLE} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            community_name TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS {USER_COMMUNITY_TABLE} (
            user_id INTEGER NOT NULL REFERENCES {USER_TABLE}(id),
            community_id INTEGER NOT NULL REFERENCES {COMMUNITY_TABLE}(id),
            PRIMARY KEY (user_id, community_id)
        );
        CREATE INDEX IF NOT EXISTS idx_user_community_community
            ON {USER_COMMUNITY_TABLE}(community_id);"
    )
}

/// `SQLite`-backed relational store.
pub struct SqliteRelationalStore {
    /// Connection to the `SQLite` database.
    conn: Mutex<Connection>,
    /// Path to the database (None for in-memory).
    db_path: Option<PathBuf>,
}

impl SqliteRelationalStore {
    /// Opens (or creates) the relational database at `db_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        let conn = open_connection(&db_path, "open_relational_sqlite")?;
        let store = Self {
            conn: Mutex::new(conn),
            db_path: Some(db_path),
        };
        store.initialize()?;
        Ok(store)
    }

    /// Creates an in-memory database (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn in_memory() -> Result<Self> {
        let conn = open_in_memory("open_relational_sqlite_memory")?;
        let store = Self {
            conn: Mutex::new(conn),
            db_path: None,
        };
        store.initialize()?;
        Ok(store)
    }

    /// Returns the database path.
    #[must_use]
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn initialize(&self) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        conn.execute_batch(&schema())
            .map_err(|e| Error::operation("create_relational_tables", e))
    }
}

/// `a = ?1 AND b = ?2 ...`, or `1 = 1` with no constraints.
fn where_clause(constraints: &Row) -> Result<String> {
    if constraints.is_empty() {
        return Ok("1 = 1".to_string());
    }
    let mut parts = Vec::with_capacity(constraints.len());
    for (index, column) in constraints.keys().enumerate() {
        validate_column(column)?;
        parts.push(format!("{column} = ?{}", index + 1));
    }
    Ok(parts.join(" AND "))
}

impl RelationalStore for SqliteRelationalStore {
    #[instrument(skip(self, columns), fields(backend = "sqlite_relational", columns = columns.len()))]
    fn put(&self, columns: &Row, table: &str) -> Result<i64> {
        validate_table(table)?;
        if !super::is_plain_table(table) {
            return Err(Error::InvalidInput(format!(
                "cannot insert into a join: '{table}'"
            )));
        }
        for column in columns.keys() {
            validate_column(column)?;
        }

        let sql = if columns.is_empty() {
            format!("INSERT INTO {table} DEFAULT VALUES")
        } else {
            let names: Vec<&str> = columns.keys().map(String::as_str).collect();
            let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
            format!(
                "INSERT INTO {table} ({}) VALUES ({})",
                names.join(", "),
                placeholders.join(", ")
            )
        };

        let conn = acquire_lock(&self.conn);
        conn.execute(&sql, params_from_iter(columns.values()))
            .map_err(|e| Error::operation(format!("insert_{}", table.to_lowercase()), e))?;
        Ok(conn.last_insert_rowid())
    }

    #[instrument(skip(self, constraints), fields(backend = "sqlite_relational", constraints = constraints.len()))]
    fn get(&self, constraints: &Row, table: &str) -> Result<Vec<Row>> {
        validate_table(table)?;
        let sql = format!("SELECT * FROM {table} WHERE {}", where_clause(constraints)?);
        let operation = "select_rows";

        let conn = acquire_lock(&self.conn);
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| Error::operation(operation, e))?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let rows = stmt
            .query_map(params_from_iter(constraints.values()), |row| read_row(row, &names))
            .map_err(|e| Error::operation(operation, e))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::operation(operation, e))
    }
}
