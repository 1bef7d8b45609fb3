//! Social graph service.
//!
//! Coordinates the relational user directory with the graph store:
//! user creation writes to both, friendships and genre likes live only in
//! the graph, and every username the graph returns is resolved back into a
//! full [`User`] through the directory.
//!
//! # Dual write
//!
//! `create_user` writes the graph node first and the relational row second.
//! There is no transaction spanning the two stores. When the relational
//! insert fails the node stays behind, the failure is logged and counted
//! (`social_graph_dual_write_orphans_total`), and the caller gets
//! [`Error::Inconsistent`]. Calling `create_user` again for the same username
//! reuses the orphaned node and retries the insert.
//! [`SocialGraphService::repair_user_node`] covers the opposite case and
//! brings a relational user back into the graph idempotently.

use super::UserDirectory;
use crate::config::SocialConfig;
use crate::models::{User, strings_from_records};
use crate::storage::graph::GraphStatement;
use crate::storage::traits::GraphStore;
use crate::{Error, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// High-level social graph operations.
///
/// # Thread Safety
///
/// The service holds no mutable state. It is safe to share whenever the
/// stores are, which every bundled store is.
#[derive(Clone)]
pub struct SocialGraphService {
    directory: UserDirectory,
    graph: Arc<dyn GraphStore>,
    config: SocialConfig,
}

impl SocialGraphService {
    /// Creates a service with default settings (user verification on).
    #[must_use]
    pub fn new(directory: UserDirectory, graph: Arc<dyn GraphStore>) -> Self {
        Self::with_config(directory, graph, SocialConfig::default())
    }

    /// Creates a service with explicit settings.
    #[must_use]
    pub fn with_config(
        directory: UserDirectory,
        graph: Arc<dyn GraphStore>,
        config: SocialConfig,
    ) -> Self {
        Self {
            directory,
            graph,
            config,
        }
    }

    /// Returns the user directory.
    #[must_use]
    pub const fn directory(&self) -> &UserDirectory {
        &self.directory
    }

    /// Creates a user in the graph, then in the relational store.
    ///
    /// Returns the user with its generated id.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] for an empty username
    /// - [`Error::AlreadyExists`] if the username is already taken
    /// - [`Error::OperationFailed`] if the graph write fails (nothing written)
    /// - [`Error::Inconsistent`] if the graph write succeeded but the
    ///   relational insert failed
    #[instrument(skip(self, user), fields(operation = "create_user", username = %user.username))]
    pub fn create_user(&self, user: &User) -> Result<User> {
        observe("create_user", || {
            require_name("username", &user.username)?;
            match self.graph.execute(&GraphStatement::create_user(user)) {
                Ok(()) => {},
                Err(Error::AlreadyExists { .. }) => self.adopt_orphan_node(&user.username)?,
                Err(err) => return Err(context("create_user", "could not create user node")(err)),
            }

            match self.directory.create(user) {
                Ok(id) => Ok(user.clone().with_id(id)),
                Err(err) => {
                    tracing::warn!(
                        username = %user.username,
                        error = %err,
                        "User node written to graph but relational insert failed"
                    );
                    metrics::counter!("social_graph_dual_write_orphans_total").increment(1);
                    Err(Error::Inconsistent {
                        username: user.username.clone(),
                        cause: err.to_string(),
                    })
                },
            }
        })
    }

    /// Looks a user up by username.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the user does not exist.
    pub fn get_user(&self, username: &str) -> Result<User> {
        require_name("username", username)?;
        self.directory.resolve_by_username(username)
    }

    /// Makes two users friends. Repeating the call, in either order, keeps a
    /// single friendship.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] for empty usernames or a self-friendship
    /// - [`Error::NotFound`] if user verification is on and a user is missing
    /// - [`Error::OperationFailed`] if the graph write fails
    #[instrument(skip(self), fields(operation = "add_friendship"))]
    pub fn add_friendship(&self, username1: &str, username2: &str) -> Result<()> {
        observe("add_friendship", || {
            require_name("username", username1)?;
            require_name("username", username2)?;
            if username1 == username2 {
                return Err(Error::InvalidInput(format!(
                    "user '{username1}' cannot befriend themselves"
                )));
            }
            self.verify(&[username1, username2])?;
            self.graph
                .execute(&GraphStatement::merge_friendship(username1, username2))
                .map_err(context("add_friendship", "could not add friendship"))
        })
    }

    /// Lists a user's friends as full user records.
    ///
    /// # Errors
    ///
    /// Fails as a whole if the graph read fails or any friend cannot be
    /// resolved relationally.
    #[instrument(skip(self), fields(operation = "list_friendships"))]
    pub fn list_friendships(&self, username: &str) -> Result<Vec<User>> {
        observe("list_friendships", || {
            require_name("username", username)?;
            let usernames = self
                .read(&GraphStatement::list_friends(username))
                .map_err(context("list_friendships", "could not list friendships"))?;
            self.resolve_all(&usernames)
        })
    }

    /// Records that a user likes a genre. The genre name is trimmed and the
    /// genre is created on first use.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] for an empty username or genre
    /// - [`Error::NotFound`] if user verification is on and the user is missing
    /// - [`Error::OperationFailed`] if the graph write fails
    #[instrument(skip(self), fields(operation = "like_genre"))]
    pub fn like_genre(&self, username: &str, genre_name: &str) -> Result<()> {
        observe("like_genre", || {
            require_name("username", username)?;
            let genre_name = genre_name.trim();
            require_name("genre name", genre_name)?;
            self.verify(&[username])?;
            self.graph
                .execute(&GraphStatement::like_genre(username, genre_name))
                .map_err(context("like_genre", "could not like genre"))
        })
    }

    /// Lists the genres a user likes.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph read fails.
    #[instrument(skip(self), fields(operation = "list_liked_genres"))]
    pub fn list_liked_genres(&self, username: &str) -> Result<Vec<String>> {
        observe("list_liked_genres", || {
            require_name("username", username)?;
            self.read(&GraphStatement::list_liked_genres(username))
                .map_err(context("list_liked_genres", "could not list liked genres"))
        })
    }

    /// Up to ten users who share a liked genre with `username` and are not
    /// already their friend. Never contains the user themselves.
    ///
    /// # Errors
    ///
    /// Fails as a whole if the graph read fails or any candidate cannot be
    /// resolved relationally.
    #[instrument(skip(self), fields(operation = "get_recommendations_by_genre"))]
    pub fn get_recommendations_by_genre(&self, username: &str) -> Result<Vec<User>> {
        observe("get_recommendations_by_genre", || {
            require_name("username", username)?;
            let usernames = self
                .read(&GraphStatement::recommend_by_genre(username))
                .map_err(context(
                    "get_recommendations_by_genre",
                    "could not get recommendations",
                ))?;
            self.resolve_all(&usernames)
        })
    }

    /// Ensures a relational user has its graph node. Safe to repeat.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the user has no relational row, or the
    /// graph error.
    #[instrument(skip(self), fields(operation = "repair_user_node"))]
    pub fn repair_user_node(&self, username: &str) -> Result<User> {
        observe("repair_user_node", || {
            require_name("username", username)?;
            let user = self.directory.resolve_by_username(username)?;
            self.graph
                .execute(&GraphStatement::merge_user(username))
                .map_err(context("repair_user_node", "could not repair user node"))?;
            tracing::info!(username, "User node repaired");
            Ok(user)
        })
    }

    /// Accepts an existing user node whose relational row is missing, left
    /// behind by an earlier failed insert. A node backed by a row is a
    /// duplicate username.
    fn adopt_orphan_node(&self, username: &str) -> Result<()> {
        match self.directory.resolve_by_username(username) {
            Ok(_) => Err(Error::AlreadyExists {
                entity: "user",
                key: username.to_string(),
            }),
            Err(err) if err.is_not_found() => {
                tracing::info!(username, "Reusing orphaned user node");
                metrics::counter!("social_graph_orphans_adopted_total").increment(1);
                Ok(())
            },
            Err(err) => Err(err),
        }
    }

    fn verify(&self, usernames: &[&str]) -> Result<()> {
        if !self.config.verify_users {
            return Ok(());
        }
        for username in usernames {
            self.directory.resolve_by_username(username)?;
        }
        Ok(())
    }

    fn read(&self, statement: &GraphStatement) -> Result<Vec<String>> {
        let records = self.graph.execute_returning(statement)?;
        let field = statement.result_field().unwrap_or("username");
        tracing::debug!(
            statement = statement.kind(),
            records = records.len(),
            "Graph read complete"
        );
        Ok(strings_from_records(&records, field))
    }

    fn resolve_all(&self, usernames: &[String]) -> Result<Vec<User>> {
        usernames
            .iter()
            .map(|username| self.directory.resolve_by_username(username))
            .collect()
    }
}

fn require_name(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{what} cannot be empty")));
    }
    Ok(())
}

/// Rewrites store failures with an operation-specific message; lookup and
/// input errors pass through unchanged.
fn context(operation: &'static str, message: &'static str) -> impl FnOnce(Error) -> Error {
    move |err| match err {
        Error::OperationFailed { cause, .. } => Error::OperationFailed {
            operation: operation.to_string(),
            cause: format!("{message}: {cause}"),
        },
        other => other,
    }
}

/// Runs one service operation and records its outcome and duration.
fn observe<T>(operation: &'static str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let start = Instant::now();
    let result = f();
    let status = if result.is_ok() { "success" } else { "error" };
    metrics::counter!(
        "social_graph_operations_total",
        "operation" => operation,
        "status" => status
    )
    .increment(1);
    metrics::histogram!("social_graph_operation_duration_ms", "operation" => operation)
        .record(start.elapsed().as_secs_f64() * 1000.0);
    result
}
