//! `SQLite` graph store.
//!
//! Keeps the social graph in four tables and answers the read statements with
//! SQL joins:
//! - `graph_user_nodes`: one row per `User` node, with its creation properties
//! - `graph_genre_nodes`: one row per `Genre` node
//! - `graph_friendships`: undirected edges, stored once as `(min, max)`
//! - `graph_likes`: `LIKES` edges from users to genres

use super::GraphStatement;
use super::memory::read_via_execute;
use crate::models::Record;
use crate::storage::sqlite::{acquire_lock, open_connection, open_in_memory};
use crate::storage::traits::GraphStore;
use crate::{Error, Result};
use rusqlite::{Connection, ToSql, params};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::instrument;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS graph_user_nodes (
    username TEXT PRIMARY KEY,
    properties TEXT NOT NULL DEFAULT '{}'
);
CREATE TABLE IF NOT EXISTS graph_genre_nodes (
    genre_name TEXT PRIMARY KEY
);
CREATE TABLE IF NOT EXISTS graph_friendships (
    user_a TEXT NOT NULL REFERENCES graph_user_nodes(username),
    user_b TEXT NOT NULL REFERENCES graph_user_nodes(username),
    PRIMARY KEY (user_a, user_b)
);
CREATE TABLE IF NOT EXISTS graph_likes (
    username TEXT NOT NULL REFERENCES graph_user_nodes(username),
    genre_name TEXT NOT NULL REFERENCES graph_genre_nodes(genre_name),
    PRIMARY KEY (username, genre_name)
);
CREATE INDEX IF NOT EXISTS idx_graph_friendships_b ON graph_friendships(user_b);
CREATE INDEX IF NOT EXISTS idx_graph_likes_genre ON graph_likes(genre_name);
";

/// Friends in either direction of the edge.
const SELECT_FRIENDS: &str = "
SELECT user_b FROM graph_friendships WHERE user_a = ?1
UNION
SELECT user_a FROM graph_friendships WHERE user_b = ?1
ORDER BY 1
";

const SELECT_LIKED_GENRES: &str =
    "SELECT genre_name FROM graph_likes WHERE username = ?1 ORDER BY genre_name";

const SELECT_RECOMMENDATIONS: &str = "
SELECT DISTINCT other.username
FROM graph_likes mine
JOIN graph_likes other ON other.genre_name = mine.genre_name
WHERE mine.username = ?1
  AND other.username <> ?1
  AND NOT EXISTS (
      SELECT 1 FROM graph_friendships f
      WHERE (f.user_a = ?1 AND f.user_b = other.username)
         OR (f.user_b = ?1 AND f.user_a = other.username)
  )
ORDER BY other.username
LIMIT ?2
";

/// `SQLite`-backed graph store.
///
/// # Concurrency Model
///
/// Uses a `Mutex<Connection>` for thread-safe access. WAL mode and
/// `busy_timeout` handle concurrent processes.
pub struct SqliteGraphStore {
    /// Connection to the `SQLite` database.
    conn: Mutex<Connection>,
    /// Path to the database (None for in-memory).
    db_path: Option<PathBuf>,
}

impl SqliteGraphStore {
    /// Opens (or creates) a graph database at `db_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        let conn = open_connection(&db_path, "open_graph_sqlite")?;
        let store = Self {
            conn: Mutex::new(conn),
            db_path: Some(db_path),
        };
        store.initialize()?;
        Ok(store)
    }

    /// Creates an in-memory graph database (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn in_memory() -> Result<Self> {
        let conn = open_in_memory("open_graph_sqlite_memory")?;
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
        conn.execute_batch(SCHEMA)
            .map_err(|e| Error::operation("create_graph_tables", e))
    }

    fn apply_write(conn: &Connection, statement: &GraphStatement) -> Result<()> {
        let kind = statement.kind();
        let result = match statement {
            GraphStatement::CreateUser {
                username,
                properties,
            } => {
                let json = serde_json::to_string(properties)
                    .map_err(|e| Error::operation(kind, e))?;
                conn.execute(
                    "INSERT INTO graph_user_nodes (username, properties) VALUES (?1, ?2)",
                    params![username, json],
                )
                .map_err(|e| match e.sqlite_error_code() {
                    Some(rusqlite::ErrorCode::ConstraintViolation) => Error::AlreadyExists {
                        entity: "user node",
                        key: username.clone(),
                    },
                    _ => Error::operation(kind, e),
                })?;
                return Ok(());
            },
            GraphStatement::MergeUser { username } => conn.execute(
                "INSERT OR IGNORE INTO graph_user_nodes (username) VALUES (?1)",
                params![username],
            ),
            GraphStatement::MergeFriendship {
                username1,
                username2,
            } => {
                let (a, b) = if username1 <= username2 {
                    (username1, username2)
                } else {
                    (username2, username1)
                };
                // Selecting through the node table makes a missing node a no-op.
                conn.execute(
                    "INSERT OR IGNORE INTO graph_friendships (user_a, user_b)
                     SELECT u1.username, u2.username
                     FROM graph_user_nodes u1, graph_user_nodes u2
                     WHERE u1.username = ?1 AND u2.username = ?2",
                    params![a, b],
                )
            },
            GraphStatement::LikeGenre {
                username,
                genre_name,
            } => conn
                .execute(
                    "INSERT OR IGNORE INTO graph_genre_nodes (genre_name) VALUES (?1)",
                    params![genre_name],
                )
                .and_then(|_| {
                    conn.execute(
                        "INSERT OR IGNORE INTO graph_likes (username, genre_name)
                         SELECT username, ?2 FROM graph_user_nodes WHERE username = ?1",
                        params![username, genre_name],
                    )
                }),
            GraphStatement::ListFriends { .. }
            | GraphStatement::ListLikedGenres { .. }
            | GraphStatement::RecommendByGenre { .. } => return Err(read_via_execute(statement)),
        };
        result.map(|_| ()).map_err(|e| Error::operation(kind, e))
    }

    fn run_read(conn: &Connection, statement: &GraphStatement) -> Result<Vec<String>> {
        let kind = statement.kind();
        match statement {
            GraphStatement::ListFriends { username } => {
                query_strings(conn, kind, SELECT_FRIENDS, params![username])
            },
            GraphStatement::ListLikedGenres { username } => {
                query_strings(conn, kind, SELECT_LIKED_GENRES, params![username])
            },
            GraphStatement::RecommendByGenre { username, limit } => {
                let limit = i64::try_from(*limit).unwrap_or(i64::MAX);
                query_strings(conn, kind, SELECT_RECOMMENDATIONS, params![username, limit])
            },
            _ => Ok(Vec::new()),
        }
    }
}

/// Runs a query whose first column is text and collects it.
fn query_strings(
    conn: &Connection,
    kind: &'static str,
    sql: &str,
    params: &[&dyn ToSql],
) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(sql).map_err(|e| Error::operation(kind, e))?;
    let rows = stmt
        .query_map(params, |row| row.get::<_, String>(0))
        .map_err(|e| Error::operation(kind, e))?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| Error::operation(kind, e))
}

impl GraphStore for SqliteGraphStore {
    #[instrument(skip(self, statement), fields(backend = "sqlite_graph", statement = statement.kind()))]
    fn execute(&self, statement: &GraphStatement) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        Self::apply_write(&conn, statement)
    }

    #[instrument(skip(self, statement), fields(backend = "sqlite_graph", statement = statement.kind()))]
    fn execute_returning(&self, statement: &GraphStatement) -> Result<Vec<Record>> {
        let conn = acquire_lock(&self.conn);
        if statement.is_write() {
            Self::apply_write(&conn, statement)?;
            return Ok(Vec::new());
        }
        let Some(field) = statement.result_field() else {
            return Ok(Vec::new());
        };
        Ok(Self::run_read(&conn, statement)?
            .into_iter()
            .map(|value| Record::new().with(field, value))
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{User, strings_from_records};

    fn store_with(users: &[&str]) -> SqliteGraphStore {
        let store = SqliteGraphStore::in_memory().unwrap();
        for user in users {
            store.execute(&GraphStatement::merge_user(*user)).unwrap();
        }
        store
    }

    fn read(store: &SqliteGraphStore, statement: &GraphStatement) -> Vec<String> {
        let records = store.execute_returning(statement).unwrap();
        strings_from_records(&records, statement.result_field().unwrap())
    }

    fn count(store: &SqliteGraphStore, table: &str) -> i64 {
        let conn = acquire_lock(&store.conn);
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn test_create_user_stores_properties_and_rejects_duplicates() {
        let store = SqliteGraphStore::in_memory().unwrap();
        let user = User::new("alice", "Alice", "a@example.com");
        store.execute(&GraphStatement::create_user(&user)).unwrap();

        let err = store.execute(&GraphStatement::create_user(&user)).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists { ref key, .. } if key == "alice"), "{err}");

        let conn = acquire_lock(&store.conn);
        let json: String = conn
            .query_row(
                "SELECT properties FROM graph_user_nodes WHERE username = 'alice'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert!(json.contains("a@example.com"));
    }

    #[test]
    fn test_friendship_is_stored_once() {
        let store = store_with(&["bob", "alice"]);
        store.execute(&GraphStatement::merge_friendship("bob", "alice")).unwrap();
        store.execute(&GraphStatement::merge_friendship("alice", "bob")).unwrap();

        assert_eq!(count(&store, "graph_friendships"), 1);
        assert_eq!(read(&store, &GraphStatement::list_friends("alice")), vec!["bob"]);
        assert_eq!(read(&store, &GraphStatement::list_friends("bob")), vec!["alice"]);
    }

    #[test]
    fn test_missing_nodes_make_edges_noops() {
        let store = store_with(&["alice"]);
        store.execute(&GraphStatement::merge_friendship("alice", "ghost")).unwrap();
        store.execute(&GraphStatement::like_genre("ghost", "jazz")).unwrap();

        assert_eq!(count(&store, "graph_friendships"), 0);
        assert_eq!(count(&store, "graph_likes"), 0);
        assert_eq!(count(&store, "graph_genre_nodes"), 1);
    }

    #[test]
    fn test_recommendations_match_in_memory_semantics() {
        let store = store_with(&["alice", "bob", "carol", "dave"]);
        for (user, genre) in [
            ("alice", "jazz"),
            ("alice", "rock"),
            ("bob", "jazz"),
            ("bob", "rock"),
            ("carol", "jazz"),
            ("dave", "metal"),
        ] {
            store.execute(&GraphStatement::like_genre(user, genre)).unwrap();
        }
        store.execute(&GraphStatement::merge_friendship("carol", "alice")).unwrap();

        assert_eq!(read(&store, &GraphStatement::recommend_by_genre("alice")), vec!["bob"]);
        assert_eq!(
            read(&store, &GraphStatement::recommend_by_genre("dave")),
            Vec::<String>::new()
        );
    }

    #[test]
    fn test_recommendations_respect_limit() {
        let store = store_with(&["alice"]);
        store.execute(&GraphStatement::like_genre("alice", "jazz")).unwrap();
        for i in 0..12 {
            let name = format!("fan{i:02}");
            store.execute(&GraphStatement::merge_user(&name)).unwrap();
            store.execute(&GraphStatement::like_genre(&name, "jazz")).unwrap();
        }
        let statement = GraphStatement::RecommendByGenre {
            username: "alice".to_string(),
            limit: 3,
        };
        assert_eq!(read(&store, &statement), vec!["fan00", "fan01", "fan02"]);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.db");
        {
            let store = SqliteGraphStore::new(&path).unwrap();
            store.execute(&GraphStatement::merge_user("alice")).unwrap();
            store.execute(&GraphStatement::like_genre("alice", "jazz")).unwrap();
        }
        let store = SqliteGraphStore::new(&path).unwrap();
        assert_eq!(store.db_path(), Some(path.as_path()));
        assert_eq!(read(&store, &GraphStatement::list_liked_genres("alice")), vec!["jazz"]);
    }
}
