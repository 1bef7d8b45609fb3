//! # Symphony
//!
//! Social graph layer for the Symphony music network.
//!
//! Symphony keeps user records in a relational store and mirrors every user
//! into a property graph, where friendships and genre affinities live. On top
//! of that graph it answers "who else likes what I like and is not my friend
//! yet" recommendation queries.
//!
//! ## Features
//!
//! - Dual-write user creation (graph node first, relational row second)
//! - Idempotent friendships and genre likes (`MERGE` semantics)
//! - Genre-based friend recommendations, capped at ten candidates
//! - Pluggable stores (`SQLite`, in-memory, Neo4j behind the `neo4j` feature)
//! - Community membership built on the same user directory
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use symphony::models::User;
//! use symphony::services::{SocialGraphService, UserDirectory};
//! use symphony::storage::graph::InMemoryGraphStore;
//! use symphony::storage::relational::InMemoryRelationalStore;
//!
//! let directory = UserDirectory::new(Arc::new(InMemoryRelationalStore::new()));
//! let service = SocialGraphService::new(directory, Arc::new(InMemoryGraphStore::new()));
//!
//! service.create_user(&User::new("alice", "Alice Liddell", "alice@example.com"))?;
//! service.create_user(&User::new("bob", "Bob Marley", "bob@example.com"))?;
//! service.like_genre("alice", "reggae")?;
//! service.like_genre("bob", "reggae")?;
//!
//! let picks = service.get_recommendations_by_genre("alice")?;
//! assert_eq!(picks[0].username, "bob");
//! # Ok::<(), symphony::Error>(())
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod cli;
pub mod config;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;

pub use config::SymphonyConfig;
pub use models::{Community, Record, Row, User, Value};
pub use services::{CommunityService, SocialGraphService, StoreFactory, UserDirectory};
pub use storage::{GraphStatement, GraphStore, RelationalStore};

/// Error type for symphony operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `NotFound` | A username, id or community name matches zero relational rows |
/// | `AlreadyExists` | A user node or user with the username is already stored |
/// | `InvalidInput` | Empty usernames, self-friendship, unsafe SQL identifiers |
/// | `MalformedRow` | A stored row is missing a column or holds the wrong type |
/// | `OperationFailed` | A relational or graph store call fails |
/// | `Inconsistent` | The graph node was written but the relational row was not |
#[derive(Debug, ThisError)]
pub enum Error {
    /// The requested record does not exist.
    ///
    /// Surfaced to callers as a user-facing "does not exist" condition.
    #[error("{entity} does not exist: {key}")]
    NotFound {
        /// Kind of record that was looked up ("user", "community").
        entity: &'static str,
        /// The key that was looked up.
        key: String,
    },

    /// A record with the same natural key is already stored.
    #[error("{entity} already exists: {key}")]
    AlreadyExists {
        /// Kind of record ("user node", "user").
        entity: &'static str,
        /// The duplicated key.
        key: String,
    },

    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A stored row could not be converted into a typed model.
    #[error("malformed row in {table}: column '{column}' {reason}")]
    MalformedRow {
        /// Table (or table expression) the row came from.
        table: String,
        /// Offending column.
        column: String,
        /// What was wrong with it.
        reason: String,
    },

    /// An operation failed.
    ///
    /// Raised when:
    /// - `SQLite` or Neo4j calls fail (connectivity, constraint violations)
    /// - A store lock cannot be acquired
    /// - Configuration files cannot be read or parsed
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// The two stores disagree after a partially applied dual write.
    ///
    /// The user node exists in the graph but the relational insert failed.
    /// `SocialGraphService::repair_user_node` is the idempotent way back.
    #[error("user '{username}' was written to the graph but not to the relational store: {cause}")]
    Inconsistent {
        /// Username of the orphaned graph node.
        username: String,
        /// The relational failure.
        cause: String,
    },
}

impl Error {
    /// Builds an [`Error::OperationFailed`] from any displayable cause.
    pub fn operation(operation: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::OperationFailed {
            operation: operation.into(),
            cause: cause.to_string(),
        }
    }

    /// Returns `true` for [`Error::NotFound`].
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type alias for symphony operations.
pub type Result<T> = std::result::Result<T, Error>;
