//! Storage layer abstraction.
//!
//! Symphony keeps two stores side by side:
//! - **Relational**: authoritative user and community attributes (`SQLite`, in-memory)
//! - **Graph**: user nodes, genre nodes and the edges between them (`SQLite`,
//!   in-memory, Neo4j)
//!
//! The username is the only key shared by both.

// Allow significant_drop_tightening - dropping database connections slightly early
// provides no meaningful benefit.
#![allow(clippy::significant_drop_tightening)]

pub mod graph;
pub mod relational;
pub mod sqlite;
pub mod traits;

pub use graph::{GraphStatement, InMemoryGraphStore, SqliteGraphStore};
pub use relational::{InMemoryRelationalStore, SqliteRelationalStore};
pub use traits::{GraphStore, RelationalStore};

/// Returns the default data directory for Symphony databases.
///
/// Uses the platform data directory (`~/.local/share/symphony` on Linux) and
/// falls back to `./.symphony` when no home directory is known.
#[must_use]
pub fn default_data_dir() -> std::path::PathBuf {
    directories::ProjectDirs::from("", "", "symphony").map_or_else(
        || std::path::PathBuf::from(".symphony"),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}
