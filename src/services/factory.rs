//! Store factory.
//!
//! Centralizes backend creation so the binary and tests build stores the
//! same way from a [`SymphonyConfig`].
//!
//! ```text
//! StoreFactory
//!   ├── create_relational() → Arc<dyn RelationalStore>
//!   ├── create_graph()      → Arc<dyn GraphStore>
//!   └── create_services()   → Services
//! ```

use super::{CommunityService, SocialGraphService, UserDirectory};
use crate::config::{GraphBackendType, RelationalBackendType, SymphonyConfig};
use crate::storage::graph::{InMemoryGraphStore, SqliteGraphStore};
use crate::storage::relational::{InMemoryRelationalStore, SqliteRelationalStore};
use crate::storage::traits::{GraphStore, RelationalStore};
use crate::Result;
use std::sync::Arc;

/// Services wired over one pair of stores.
#[derive(Clone)]
pub struct Services {
    /// Social graph operations.
    pub social: SocialGraphService,
    /// Community operations.
    pub communities: CommunityService,
}

/// Factory for creating stores and services.
pub struct StoreFactory;

impl StoreFactory {
    /// Creates the relational store selected by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn create_relational(config: &SymphonyConfig) -> Result<Arc<dyn RelationalStore>> {
        match config.relational.backend {
            RelationalBackendType::Memory => {
                tracing::debug!("Created in-memory relational store");
                Ok(Arc::new(InMemoryRelationalStore::new()))
            },
            RelationalBackendType::Sqlite => {
                let path = config.relational_path();
                let store = SqliteRelationalStore::new(&path)?;
                tracing::debug!(path = %path.display(), "Created SQLite relational store");
                Ok(Arc::new(store))
            },
        }
    }

    /// Creates the graph store selected by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened, or Neo4j is selected
    /// in a build without the `neo4j` feature.
    pub fn create_graph(config: &SymphonyConfig) -> Result<Arc<dyn GraphStore>> {
        match config.graph.backend {
            GraphBackendType::Memory => {
                tracing::debug!("Created in-memory graph store");
                Ok(Arc::new(InMemoryGraphStore::new()))
            },
            GraphBackendType::Sqlite => {
                let path = config.graph_path();
                let store = SqliteGraphStore::new(&path)?;
                tracing::debug!(path = %path.display(), "Created SQLite graph store");
                Ok(Arc::new(store))
            },
            GraphBackendType::Neo4j => Self::create_neo4j(config),
        }
    }

    #[cfg(feature = "neo4j")]
    fn create_neo4j(config: &SymphonyConfig) -> Result<Arc<dyn GraphStore>> {
        let graph = &config.graph;
        let store =
            crate::storage::graph::Neo4jGraphStore::connect(&graph.uri, &graph.user, &graph.password)?;
        Ok(Arc::new(store))
    }

    #[cfg(not(feature = "neo4j"))]
    fn create_neo4j(_config: &SymphonyConfig) -> Result<Arc<dyn GraphStore>> {
        Err(crate::Error::InvalidInput(
            "graph backend 'neo4j' requires building with the `neo4j` feature".to_string(),
        ))
    }

    /// Creates both stores and wires the services over them.
    ///
    /// # Errors
    ///
    /// Returns an error if either store cannot be created.
    pub fn create_services(config: &SymphonyConfig) -> Result<Services> {
        let relational = Self::create_relational(config)?;
        let graph = Self::create_graph(config)?;
        tracing::info!(
            graph_backend = graph.backend_name(),
            verify_users = config.social.verify_users,
            "Stores ready"
        );
        Ok(Services {
            social: SocialGraphService::with_config(
                UserDirectory::new(Arc::clone(&relational)),
                graph,
                config.social,
            ),
            communities: CommunityService::over(&relational),
        })
    }
}
