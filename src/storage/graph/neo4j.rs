//! Neo4j graph store.
//!
//! Sends each statement's Cypher text and parameters to a Neo4j server over
//! Bolt. The driver is async; the store owns a small runtime and blocks on
//! each call so it fits the synchronous [`GraphStore`] trait.

use super::GraphStatement;
use super::memory::read_via_execute;
use crate::models::{Record, Value};
use crate::storage::traits::GraphStore;
use crate::{Error, Result};
use neo4rs::{BoltNull, BoltType, Graph, Query, query};
use tokio::runtime::Runtime;
use tracing::instrument;

/// Uniqueness constraints the other backends get from their primary keys.
const CONSTRAINTS: [&str; 2] = [
    "CREATE CONSTRAINT user_username IF NOT EXISTS FOR (u:User) REQUIRE u.username IS UNIQUE",
    "CREATE CONSTRAINT genre_name IF NOT EXISTS FOR (g:Genre) REQUIRE g.genre_name IS UNIQUE",
];

const COUNT_USER_NODES: &str = "MATCH (p:User {username: $username}) RETURN count(p) AS n";

/// Neo4j-backed graph store.
pub struct Neo4jGraphStore {
    graph: Graph,
    runtime: Runtime,
}

impl Neo4jGraphStore {
    /// Connects to a Neo4j server.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot start or the server refuses
    /// the connection.
    pub fn connect(uri: &str, user: &str, password: &str) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .map_err(|e| Error::operation("neo4j_runtime", e))?;
        let graph = runtime
            .block_on(Graph::new(uri, user, password))
            .map_err(|e| Error::operation("neo4j_connect", e))?;
        for constraint in CONSTRAINTS {
            runtime
                .block_on(graph.run(query(constraint)))
                .map_err(|e| Error::operation("neo4j_create_constraints", e))?;
        }
        tracing::info!(uri, "Connected to Neo4j");
        Ok(Self { graph, runtime })
    }

    fn user_node_exists(&self, username: &str) -> Result<bool> {
        let kind = "create_user";
        self.runtime.block_on(async {
            let mut stream = self
                .graph
                .execute(query(COUNT_USER_NODES).param("username", username))
                .await
                .map_err(|e| Error::operation(kind, e))?;
            let Some(row) = stream.next().await.map_err(|e| Error::operation(kind, e))? else {
                return Ok(false);
            };
            let count: i64 = row.get("n").map_err(|e| Error::operation(kind, e))?;
            Ok(count > 0)
        })
    }

    fn build_query(statement: &GraphStatement) -> Query {
        statement
            .parameters()
            .into_iter()
            .fold(query(statement.cypher()), |q, (name, value)| {
                q.param(&name, to_bolt(value))
            })
    }
}

fn already_exists(username: &str) -> Error {
    Error::AlreadyExists {
        entity: "user node",
        key: username.to_string(),
    }
}

fn to_bolt(value: Value) -> BoltType {
    match value {
        Value::Null => BoltType::Null(BoltNull),
        Value::Integer(i) => i.into(),
        Value::Real(r) => r.into(),
        Value::Text(s) => s.into(),
        Value::Date(d) => d.format("%Y-%m-%d").to_string().into(),
        Value::Timestamp(t) => t.to_rfc3339().into(),
    }
}

impl GraphStore for Neo4jGraphStore {
    #[instrument(skip(self, statement), fields(backend = "neo4j", statement = statement.kind()))]
    fn execute(&self, statement: &GraphStatement) -> Result<()> {
        if !statement.is_write() {
            return Err(read_via_execute(statement));
        }
        if let GraphStatement::CreateUser { username, .. } = statement
            && self.user_node_exists(username)?
        {
            return Err(already_exists(username));
        }
        self.runtime
            .block_on(self.graph.run(Self::build_query(statement)))
            .map_err(|e| match statement {
                // A concurrent create slipped past the existence check.
                GraphStatement::CreateUser { username, .. }
                    if e.to_string().contains("ConstraintValidationFailed") =>
                {
                    already_exists(username)
                },
                _ => Error::operation(statement.kind(), e),
            })
    }

    #[instrument(skip(self, statement), fields(backend = "neo4j", statement = statement.kind()))]
    fn execute_returning(&self, statement: &GraphStatement) -> Result<Vec<Record>> {
        let Some(field) = statement.result_field() else {
            self.execute(statement)?;
            return Ok(Vec::new());
        };
        let kind = statement.kind();
        self.runtime.block_on(async {
            let mut stream = self
                .graph
                .execute(Self::build_query(statement))
                .await
                .map_err(|e| Error::operation(kind, e))?;
            let mut records = Vec::new();
            while let Some(row) = stream.next().await.map_err(|e| Error::operation(kind, e))? {
                let value: String = row.get(field).map_err(|e| Error::operation(kind, e))?;
                records.push(Record::new().with(field, value));
            }
            Ok(records)
        })
    }

    fn backend_name(&self) -> &'static str {
        "neo4j"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use chrono::{NaiveDate, TimeZone, Utc};
    use test_case::test_case;

    #[test]
    fn test_to_bolt_converts_every_value() {
        assert!(matches!(to_bolt(Value::Null), BoltType::Null(_)));
        assert_eq!(to_bolt(Value::Integer(7)), BoltType::from(7_i64));
        assert_eq!(to_bolt(Value::from("jazz")), BoltType::from("jazz"));

        let date = NaiveDate::from_ymd_opt(1990, 5, 10).unwrap();
        assert_eq!(to_bolt(Value::Date(date)), BoltType::from("1990-05-10"));

        let timestamp = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            to_bolt(Value::Timestamp(timestamp)),
            BoltType::from(timestamp.to_rfc3339())
        );
    }

    #[test_case(GraphStatement::create_user(&User::new("a", "A", "a@example.com")) ; "create user")]
    #[test_case(GraphStatement::merge_user("a") ; "merge user")]
    #[test_case(GraphStatement::merge_friendship("a", "b") ; "merge friendship")]
    #[test_case(GraphStatement::like_genre("a", "jazz") ; "like genre")]
    #[test_case(GraphStatement::list_friends("a") ; "list friends")]
    #[test_case(GraphStatement::list_liked_genres("a") ; "list genres")]
    #[test_case(GraphStatement::recommend_by_genre("a") ; "recommend")]
    fn test_build_query_binds_every_parameter(statement: GraphStatement) {
        let query = Neo4jGraphStore::build_query(&statement);
        for name in statement.parameters().keys() {
            assert!(query.has_param_key(name), "{name}");
        }
    }

    #[test]
    fn test_constraints_cover_both_node_keys() {
        assert!(CONSTRAINTS[0].contains("u.username IS UNIQUE"));
        assert!(CONSTRAINTS[1].contains("g.genre_name IS UNIQUE"));
    }
}
