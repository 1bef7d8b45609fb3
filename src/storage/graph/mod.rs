//! Graph store implementations.
//!
//! | Backend | Persistence | Notes |
//! |---------|-------------|-------|
//! | [`SqliteGraphStore`] | File | Default |
//! | [`InMemoryGraphStore`] | None | Tests |
//! | `Neo4jGraphStore` | Server | `neo4j` feature |

mod memory;
#[cfg(feature = "neo4j")]
mod neo4j;
mod sqlite;
mod statement;

pub use memory::InMemoryGraphStore;
#[cfg(feature = "neo4j")]
pub use neo4j::Neo4jGraphStore;
pub use sqlite::SqliteGraphStore;
pub use statement::{GraphStatement, RECOMMENDATION_LIMIT};
