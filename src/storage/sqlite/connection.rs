//! Shared connection handling for `SQLite` stores.
//!
//! This module provides utilities for managing `SQLite` connections with proper
//! mutex handling, poison recovery, and consistent pragma configuration.

use crate::{Error, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Helper to acquire mutex lock with poison recovery.
///
/// If the mutex is poisoned (due to a panic in a previous critical section),
/// we recover the inner value and log a warning. The connection itself stays
/// usable; only the panicking statement was lost.
pub fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("SQLite mutex was poisoned, recovering");
            metrics::counter!("sqlite_mutex_poison_recovery_total").increment(1);
            poisoned.into_inner()
        },
    }
}

/// Opens a file-backed connection and applies [`configure_connection`].
///
/// Parent directories are created when missing.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if the directory or database cannot be
/// opened.
pub fn open_connection(path: &Path, operation: &str) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::operation(operation, e))?;
    }
    let conn = Connection::open(path).map_err(|e| Error::operation(operation, e))?;
    configure_connection(&conn)?;
    Ok(conn)
}

/// Opens a private in-memory connection (useful for testing).
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if `SQLite` cannot allocate the database.
pub fn open_in_memory(operation: &str) -> Result<Connection> {
    let conn = Connection::open_in_memory().map_err(|e| Error::operation(operation, e))?;
    configure_connection(&conn)?;
    Ok(conn)
}

/// Configures a `SQLite` connection.
///
/// - **WAL mode**: concurrent readers with a single writer
/// - **NORMAL synchronous**: balances durability with performance
/// - **`busy_timeout`**: waits up to 5 seconds for locks instead of failing
/// - **`foreign_keys`**: edge tables reference their nodes
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if foreign keys cannot be enabled.
pub fn configure_connection(conn: &Connection) -> Result<()> {
    // journal_mode returns a row ("wal"), and in-memory databases answer
    // "memory", so the result is ignored rather than checked.
    let _ = conn.pragma_update(None, "journal_mode", "WAL");
    let _ = conn.pragma_update(None, "synchronous", "NORMAL");
    let _ = conn.pragma_update(None, "busy_timeout", "5000");
    conn.pragma_update(None, "foreign_keys", "ON")
        .map_err(|e| Error::operation("configure_sqlite", e))?;
    Ok(())
}
