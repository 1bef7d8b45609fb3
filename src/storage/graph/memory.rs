//! In-memory graph store for testing.
//!
//! Interprets [`GraphStatement`] variants directly over ordered sets, so
//! results come back in a stable (alphabetical) order.

use super::GraphStatement;
use crate::models::Record;
use crate::storage::traits::GraphStore;
use crate::{Error, Result};
use std::collections::BTreeSet;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct GraphState {
    users: BTreeSet<String>,
    genres: BTreeSet<String>,
    /// Undirected edges, stored as `(min, max)`.
    friendships: BTreeSet<(String, String)>,
    /// `(username, genre_name)`.
    likes: BTreeSet<(String, String)>,
}

impl GraphState {
    fn friends_of(&self, username: &str) -> BTreeSet<String> {
        self.friendships
            .iter()
            .filter_map(|(a, b)| {
                if a == username {
                    Some(b.clone())
                } else if b == username {
                    Some(a.clone())
                } else {
                    None
                }
            })
            .collect()
    }

    fn genres_of(&self, username: &str) -> BTreeSet<String> {
        self.likes
            .iter()
            .filter(|(user, _)| user == username)
            .map(|(_, genre)| genre.clone())
            .collect()
    }

    fn recommend(&self, username: &str, limit: usize) -> Vec<String> {
        let genres = self.genres_of(username);
        let friends = self.friends_of(username);
        let candidates: BTreeSet<&String> = self
            .likes
            .iter()
            .filter(|(other, genre)| {
                other != username && genres.contains(genre) && !friends.contains(other)
            })
            .map(|(other, _)| other)
            .collect();
        candidates.into_iter().take(limit).cloned().collect()
    }
}

/// In-memory graph store for testing.
///
/// Uses `RwLock` for thread-safe access with reader-writer semantics.
/// Data is not persisted between runs.
#[derive(Debug, Default)]
pub struct InMemoryGraphStore {
    state: RwLock<GraphState>,
}

impl InMemoryGraphStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `User` nodes.
    #[must_use]
    pub fn user_node_count(&self) -> usize {
        self.state.read().map(|s| s.users.len()).unwrap_or(0)
    }

    /// Number of `Genre` nodes.
    #[must_use]
    pub fn genre_count(&self) -> usize {
        self.state.read().map(|s| s.genres.len()).unwrap_or(0)
    }

    /// Number of `FRIENDS_WITH` edges.
    #[must_use]
    pub fn friendship_count(&self) -> usize {
        self.state.read().map(|s| s.friendships.len()).unwrap_or(0)
    }

    /// Number of `LIKES` edges.
    #[must_use]
    pub fn like_count(&self) -> usize {
        self.state.read().map(|s| s.likes.len()).unwrap_or(0)
    }

    /// Whether a `User` node exists for the username.
    #[must_use]
    pub fn has_user_node(&self, username: &str) -> bool {
        self.state
            .read()
            .map(|s| s.users.contains(username))
            .unwrap_or(false)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, GraphState>> {
        self.state
            .read()
            .map_err(|e| Error::operation("graph_read_lock", e))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, GraphState>> {
        self.state
            .write()
            .map_err(|e| Error::operation("graph_write_lock", e))
    }

    fn apply_write(&self, statement: &GraphStatement) -> Result<()> {
        let mut state = self.write()?;
        match statement {
            GraphStatement::CreateUser { username, .. } => {
                if !state.users.insert(username.clone()) {
                    return Err(Error::AlreadyExists {
                        entity: "user node",
                        key: username.clone(),
                    });
                }
            },
            GraphStatement::MergeUser { username } => {
                state.users.insert(username.clone());
            },
            GraphStatement::MergeFriendship {
                username1,
                username2,
            } => {
                if state.users.contains(username1) && state.users.contains(username2) {
                    let edge = if username1 <= username2 {
                        (username1.clone(), username2.clone())
                    } else {
                        (username2.clone(), username1.clone())
                    };
                    state.friendships.insert(edge);
                }
            },
            GraphStatement::LikeGenre {
                username,
                genre_name,
            } => {
                state.genres.insert(genre_name.clone());
                if state.users.contains(username) {
                    state.likes.insert((username.clone(), genre_name.clone()));
                }
            },
            GraphStatement::ListFriends { .. }
            | GraphStatement::ListLikedGenres { .. }
            | GraphStatement::RecommendByGenre { .. } => return Err(read_via_execute(statement)),
        }
        Ok(())
    }

    fn run_read(&self, statement: &GraphStatement) -> Result<Vec<String>> {
        let state = self.read()?;
        Ok(match statement {
            GraphStatement::ListFriends { username } => {
                state.friends_of(username).into_iter().collect()
            },
            GraphStatement::ListLikedGenres { username } => {
                state.genres_of(username).into_iter().collect()
            },
            GraphStatement::RecommendByGenre { username, limit } => {
                state.recommend(username, *limit)
            },
            _ => Vec::new(),
        })
    }
}

/// Error for a read statement passed to [`GraphStore::execute`].
pub(crate) fn read_via_execute(statement: &GraphStatement) -> Error {
    Error::InvalidInput(format!(
        "'{}' returns records; use execute_returning",
        statement.kind()
    ))
}

impl GraphStore for InMemoryGraphStore {
    fn execute(&self, statement: &GraphStatement) -> Result<()> {
        self.apply_write(statement)
    }

    fn execute_returning(&self, statement: &GraphStatement) -> Result<Vec<Record>> {
        if statement.is_write() {
            self.apply_write(statement)?;
            return Ok(Vec::new());
        }
        let Some(field) = statement.result_field() else {
            return Ok(Vec::new());
        };
        Ok(self
            .run_read(statement)?
            .into_iter()
            .map(|value| Record::new().with(field, value))
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{User, strings_from_records};

    fn store_with(users: &[&str]) -> InMemoryGraphStore {
        let store = InMemoryGraphStore::new();
        for user in users {
            store.execute(&GraphStatement::merge_user(*user)).unwrap();
        }
        store
    }

    fn read(store: &InMemoryGraphStore, statement: &GraphStatement) -> Vec<String> {
        let records = store.execute_returning(statement).unwrap();
        strings_from_records(&records, statement.result_field().unwrap())
    }

    #[test]
    fn test_create_user_rejects_duplicate_username() {
        let store = InMemoryGraphStore::new();
        let user = User::new("alice", "Alice", "a@example.com");
        store.execute(&GraphStatement::create_user(&user)).unwrap();

        let err = store.execute(&GraphStatement::create_user(&user)).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists { ref key, .. } if key == "alice"), "{err}");
        assert_eq!(store.user_node_count(), 1);
    }

    #[test]
    fn test_merge_user_is_idempotent() {
        let store = store_with(&["alice", "alice"]);
        assert_eq!(store.user_node_count(), 1);
        assert!(store.has_user_node("alice"));
    }

    #[test]
    fn test_friendship_is_undirected_and_deduplicated() {
        let store = store_with(&["alice", "bob"]);
        store.execute(&GraphStatement::merge_friendship("alice", "bob")).unwrap();
        store.execute(&GraphStatement::merge_friendship("bob", "alice")).unwrap();

        assert_eq!(store.friendship_count(), 1);
        assert_eq!(read(&store, &GraphStatement::list_friends("alice")), vec!["bob"]);
        assert_eq!(read(&store, &GraphStatement::list_friends("bob")), vec!["alice"]);
    }

    #[test]
    fn test_friendship_with_missing_node_is_noop() {
        let store = store_with(&["alice"]);
        store.execute(&GraphStatement::merge_friendship("alice", "ghost")).unwrap();
        assert_eq!(store.friendship_count(), 0);
    }

    #[test]
    fn test_like_genre_creates_genre_even_without_user() {
        let store = store_with(&["alice"]);
        store.execute(&GraphStatement::like_genre("ghost", "jazz")).unwrap();
        assert_eq!(store.genre_count(), 1);
        assert_eq!(store.like_count(), 0);

        store.execute(&GraphStatement::like_genre("alice", "jazz")).unwrap();
        store.execute(&GraphStatement::like_genre("alice", "jazz")).unwrap();
        assert_eq!(store.genre_count(), 1);
        assert_eq!(store.like_count(), 1);
        assert_eq!(read(&store, &GraphStatement::list_liked_genres("alice")), vec!["jazz"]);
    }

    #[test]
    fn test_recommendation_excludes_self_and_friends() {
        let store = store_with(&["alice", "bob", "carol", "dave"]);
        for user in ["alice", "bob", "carol"] {
            store.execute(&GraphStatement::like_genre(user, "jazz")).unwrap();
        }
        store.execute(&GraphStatement::like_genre("bob", "rock")).unwrap();
        store.execute(&GraphStatement::like_genre("alice", "rock")).unwrap();
        store.execute(&GraphStatement::like_genre("dave", "metal")).unwrap();
        store.execute(&GraphStatement::merge_friendship("alice", "carol")).unwrap();

        let picks = read(&store, &GraphStatement::recommend_by_genre("alice"));
        assert_eq!(picks, vec!["bob"]);
    }

    #[test]
    fn test_recommendation_is_capped() {
        let names: Vec<String> = (0..15).map(|i| format!("user{i:02}")).collect();
        let store = store_with(&["alice"]);
        store.execute(&GraphStatement::like_genre("alice", "jazz")).unwrap();
        for name in &names {
            store.execute(&GraphStatement::merge_user(name)).unwrap();
            store.execute(&GraphStatement::like_genre(name, "jazz")).unwrap();
        }

        let picks = read(&store, &GraphStatement::recommend_by_genre("alice"));
        assert_eq!(picks.len(), 10);
        assert!(!picks.contains(&"alice".to_string()));
    }

    #[test]
    fn test_execute_rejects_reads() {
        let store = InMemoryGraphStore::new();
        let err = store.execute(&GraphStatement::list_friends("alice")).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_reads_for_unknown_user_are_empty() {
        let store = InMemoryGraphStore::new();
        assert!(read(&store, &GraphStatement::list_friends("ghost")).is_empty());
        assert!(read(&store, &GraphStatement::recommend_by_genre("ghost")).is_empty());
    }
}
