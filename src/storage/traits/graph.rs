//! Graph store trait for the social relationship layer.
//!
//! The graph layer owns the relationship topology: `User` nodes keyed by
//! username, `Genre` nodes keyed by name, `FRIENDS_WITH` edges between users
//! and `LIKES` edges from users to genres.
//!
//! # Available Implementations
//!
//! | Backend | Use Case | Features |
//! |---------|----------|----------|
//! | `SqliteGraphStore` | Default; embedded | Node and edge tables, SQL joins |
//! | `InMemoryGraphStore` | Testing | Fast, no persistence |
//! | `Neo4jGraphStore` | `neo4j` feature | Sends the Cypher text to a server |
//!
//! # Guarantees
//!
//! | Statement | Semantics |
//! |-----------|-----------|
//! | `CreateUser` | Fails with `AlreadyExists` if a node with the username exists |
//! | `MergeUser` | Creates the node if absent |
//! | `MergeFriendship` | At most one edge per unordered pair; no-op if a node is missing |
//! | `LikeGenre` | Genre created if absent; at most one `LIKES` edge; no-op if the user is missing |
//! | `RecommendByGenre` | Distinct, excludes subject and friends, capped at `limit` |
//!
//! Each statement is committed independently; nothing spans two calls.

use crate::Result;
use crate::models::Record;
use crate::storage::graph::GraphStatement;

/// Trait for graph store backends.
///
/// # Implementor Notes
///
/// - Methods use `&self` to enable sharing via `Arc<dyn GraphStore>`
/// - `execute` must reject read statements and `execute_returning` must
///   accept every statement (writes return no records)
/// - Record field names are given by [`GraphStatement::result_field`]
pub trait GraphStore: Send + Sync {
    /// Executes a write statement.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails or is a read statement.
    fn execute(&self, statement: &GraphStatement) -> Result<()>;

    /// Executes a statement and returns its result records.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails.
    fn execute_returning(&self, statement: &GraphStatement) -> Result<Vec<Record>>;

    /// Short backend name for logs and metrics.
    fn backend_name(&self) -> &'static str;
}
