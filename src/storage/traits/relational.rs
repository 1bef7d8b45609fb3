//! Relational store trait.
//!
//! The relational store is the source of truth for user and community
//! attributes. It is deliberately narrow: single-row inserts and
//! equality-constrained scans over named tables.
//!
//! # Available Implementations
//!
//! | Backend | Use Case | Features |
//! |---------|----------|----------|
//! | `SqliteRelationalStore` | Default; embedded | Join expressions, unique constraints |
//! | `InMemoryRelationalStore` | Testing | Plain tables only |

use crate::Result;
use crate::models::Row;

/// Trait for relational store backends.
///
/// # Implementor Notes
///
/// - Methods use `&self` to enable sharing via `Arc<dyn RelationalStore>`
/// - Use interior mutability (e.g., `Mutex<Connection>`) for mutable state
/// - Unique columns (`USERS.username`, `COMMUNITY.community_name`) must be enforced
pub trait RelationalStore: Send + Sync {
    /// Inserts one row into `table` and returns the generated id.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails, including unique-constraint
    /// violations.
    fn put(&self, columns: &Row, table: &str) -> Result<i64>;

    /// Returns every row of `table` whose columns equal all `constraints`.
    ///
    /// `table` may be a pre-joined table expression; constraint keys may then
    /// be alias-qualified (`uc.user_id`). Empty constraints return every row.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the table expression is not
    /// supported by the backend.
    fn get(&self, constraints: &Row, table: &str) -> Result<Vec<Row>>;
}
