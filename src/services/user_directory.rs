//! User lookups over the relational store.

use crate::models::{Row, USER_TABLE, User, Value};
use crate::storage::traits::RelationalStore;
use crate::{Error, Result};
use std::sync::Arc;
use tracing::instrument;

/// Resolves users by username or surrogate id and inserts new ones.
///
/// When a lookup matches several rows the first one wins.
#[derive(Clone)]
pub struct UserDirectory {
    store: Arc<dyn RelationalStore>,
}

impl UserDirectory {
    /// Creates a directory over a shared relational store.
    #[must_use]
    pub fn new(store: Arc<dyn RelationalStore>) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn RelationalStore> {
        &self.store
    }

    /// Looks a user up by username.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no row matches, or the store error.
    #[instrument(skip(self), fields(operation = "resolve_by_username"))]
    pub fn resolve_by_username(&self, username: &str) -> Result<User> {
        self.resolve_one("username", Value::from(username), username)
    }

    /// Looks a user up by surrogate id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no row matches, or the store error.
    #[instrument(skip(self), fields(operation = "resolve_by_id"))]
    pub fn resolve_by_id(&self, user_id: i64) -> Result<User> {
        self.resolve_one("id", Value::Integer(user_id), &user_id.to_string())
    }

    /// Inserts a user row and returns the generated id.
    ///
    /// # Errors
    ///
    /// Returns the store error, e.g. on a duplicate username.
    #[instrument(skip(self, user), fields(operation = "create_user_row", username = %user.username))]
    pub fn create(&self, user: &User) -> Result<i64> {
        self.store.put(&user.to_row(), USER_TABLE)
    }

    fn resolve_one(&self, column: &str, value: Value, key: &str) -> Result<User> {
        let constraints = Row::from([(column.to_string(), value)]);
        let rows = self.store.get(&constraints, USER_TABLE)?;
        let Some(row) = rows.first() else {
            return Err(Error::NotFound {
                entity: "user",
                key: key.to_string(),
            });
        };
        User::from_row(row, USER_TABLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::relational::InMemoryRelationalStore;

    fn directory() -> UserDirectory {
        UserDirectory::new(Arc::new(InMemoryRelationalStore::new()))
    }

    #[test]
    fn test_resolve_by_username_and_id() {
        let directory = directory();
        let id = directory
            .create(&User::new("alice", "Alice", "alice@example.com"))
            .unwrap();

        let by_name = directory.resolve_by_username("alice").unwrap();
        assert_eq!(by_name.email, "alice@example.com");
        assert_eq!(by_name.user_id, Some(id));

        let by_id = directory.resolve_by_id(id).unwrap();
        assert_eq!(by_id.username, "alice");
    }

    #[test]
    fn test_missing_user_is_not_found() {
        let directory = directory();
        let err = directory.resolve_by_username("nonexistent").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "user does not exist: nonexistent");
    }

    #[test]
    fn test_missing_id_is_not_found() {
        let err = directory().resolve_by_id(42).unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "user", ref key } if key == "42"));
    }

    #[test]
    fn test_malformed_row_surfaces() {
        let store = Arc::new(InMemoryRelationalStore::new());
        let row = Row::from([("username".to_string(), Value::from("broken"))]);
        store.put(&row, USER_TABLE).unwrap();

        let directory = UserDirectory::new(store);
        let err = directory.resolve_by_username("broken").unwrap_err();
        assert!(matches!(err, Error::MalformedRow { .. }));
    }
}
