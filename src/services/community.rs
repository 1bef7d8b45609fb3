//! Communities built on the relational user directory.
//!
//! Communities are purely relational: a `COMMUNITY` table and a
//! `USER_COMMUNITY` link table. Membership listings use pre-joined table
//! expressions, so they need a store that supports joins (`SQLite`).

use super::UserDirectory;
use crate::models::{
    COMMUNITIES_WITH_MEMBERSHIP, COMMUNITY_TABLE, Community, Row, USER_COMMUNITY_TABLE,
    USERS_WITH_MEMBERSHIP, User, Value,
};
use crate::storage::traits::RelationalStore;
use crate::{Error, Result};
use std::sync::Arc;
use tracing::instrument;

/// Row-level access to communities and memberships.
#[derive(Clone)]
pub struct CommunityRepository {
    store: Arc<dyn RelationalStore>,
}

impl CommunityRepository {
    /// Creates a repository over a shared relational store.
    #[must_use]
    pub fn new(store: Arc<dyn RelationalStore>) -> Self {
        Self { store }
    }

    /// Inserts a community and returns it with its id.
    ///
    /// # Errors
    ///
    /// Returns the store error, e.g. on a duplicate name.
    pub fn create(&self, community: &Community) -> Result<Community> {
        let id = self.store.put(&community.to_row(), COMMUNITY_TABLE)?;
        let mut created = community.clone();
        created.id = Some(id);
        Ok(created)
    }

    /// Looks a community up by name, ignoring surrounding whitespace as
    /// [`CommunityService::create_community`] does.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no community has that name.
    pub fn get_by_name(&self, community_name: &str) -> Result<Community> {
        let community_name = community_name.trim();
        let constraints = Row::from([(
            "community_name".to_string(),
            Value::from(community_name),
        )]);
        let rows = self.store.get(&constraints, COMMUNITY_TABLE)?;
        let Some(row) = rows.first() else {
            return Err(Error::NotFound {
                entity: "community",
                key: community_name.to_string(),
            });
        };
        Community::from_row(row, COMMUNITY_TABLE)
    }

    /// Links a stored user to a stored community.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if either side has no id, or the store
    /// error (including an existing membership).
    pub fn add_member(&self, user: &User, community: &Community) -> Result<()> {
        let (Some(user_id), Some(community_id)) = (user.user_id, community.id) else {
            return Err(Error::InvalidInput(
                "membership requires a stored user and community".to_string(),
            ));
        };
        let link = Row::from([
            ("user_id".to_string(), Value::Integer(user_id)),
            ("community_id".to_string(), Value::Integer(community_id)),
        ]);
        self.store.put(&link, USER_COMMUNITY_TABLE).map(|_| ())
    }

    /// Members of a community.
    ///
    /// # Errors
    ///
    /// Returns the store error or [`Error::MalformedRow`].
    pub fn list_members(&self, community: &Community) -> Result<Vec<User>> {
        let Some(id) = community.id else {
            return Ok(Vec::new());
        };
        let constraints = Row::from([("uc.community_id".to_string(), Value::Integer(id))]);
        let rows = self.store.get(&constraints, USERS_WITH_MEMBERSHIP)?;
        User::from_rows(&rows, USERS_WITH_MEMBERSHIP)
    }

    /// Communities a user belongs to.
    ///
    /// # Errors
    ///
    /// Returns the store error or [`Error::MalformedRow`].
    pub fn list_communities_of(&self, user: &User) -> Result<Vec<Community>> {
        let Some(id) = user.user_id else {
            return Ok(Vec::new());
        };
        let constraints = Row::from([("uc.user_id".to_string(), Value::Integer(id))]);
        let rows = self.store.get(&constraints, COMMUNITIES_WITH_MEMBERSHIP)?;
        Community::from_rows(&rows, COMMUNITIES_WITH_MEMBERSHIP)
    }
}

/// Community operations keyed by username and community name.
#[derive(Clone)]
pub struct CommunityService {
    users: UserDirectory,
    communities: CommunityRepository,
}

impl CommunityService {
    /// Creates the service. Both arguments should share one store.
    #[must_use]
    pub const fn new(users: UserDirectory, communities: CommunityRepository) -> Self {
        Self { users, communities }
    }

    /// Builds the service over a single relational store.
    #[must_use]
    pub fn over(store: &Arc<dyn RelationalStore>) -> Self {
        Self::new(
            UserDirectory::new(Arc::clone(store)),
            CommunityRepository::new(Arc::clone(store)),
        )
    }

    /// Creates a community.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an empty name, or the store error.
    #[instrument(skip(self, description), fields(operation = "create_community"))]
    pub fn create_community(&self, community_name: &str, description: &str) -> Result<Community> {
        if community_name.trim().is_empty() {
            return Err(Error::InvalidInput(
                "community name cannot be empty".to_string(),
            ));
        }
        self.communities
            .create(&Community::new(community_name.trim(), description))
    }

    /// Adds a user to a community.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the user or the community does not
    /// exist, or the store error.
    #[instrument(skip(self), fields(operation = "add_user_to_community"))]
    pub fn add_user_to_community(&self, username: &str, community_name: &str) -> Result<()> {
        let user = self.users.resolve_by_username(username)?;
        let community = self.communities.get_by_name(community_name)?;
        self.communities.add_member(&user, &community)?;
        tracing::info!(username, community_name, "User joined community");
        Ok(())
    }

    /// Lists the members of a community.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the community does not exist.
    #[instrument(skip(self), fields(operation = "list_users_from_community"))]
    pub fn list_users_from_community(&self, community_name: &str) -> Result<Vec<User>> {
        let community = self.communities.get_by_name(community_name)?;
        self.communities.list_members(&community)
    }

    /// Lists the communities a user belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the user does not exist.
    #[instrument(skip(self), fields(operation = "list_communities_of_user"))]
    pub fn list_communities_of_user(&self, username: &str) -> Result<Vec<Community>> {
        let user = self.users.resolve_by_username(username)?;
        self.communities.list_communities_of(&user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::relational::SqliteRelationalStore;

    fn service() -> CommunityService {
        let store: Arc<dyn RelationalStore> = Arc::new(SqliteRelationalStore::in_memory().unwrap());
        let service = CommunityService::over(&store);
        for name in ["alice", "bob"] {
            service
                .users
                .create(&User::new(name, name, format!("{name}@example.com")))
                .unwrap();
        }
        service
    }

    #[test]
    fn test_membership_roundtrip() {
        let service = service();
        service.create_community("jazz-club", "Standards").unwrap();
        service.create_community("metalheads", "").unwrap();
        service.add_user_to_community("alice", "jazz-club").unwrap();
        service.add_user_to_community("bob", "jazz-club").unwrap();
        service.add_user_to_community("alice", "metalheads").unwrap();

        let mut members: Vec<String> = service
            .list_users_from_community("jazz-club")
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        members.sort();
        assert_eq!(members, vec!["alice", "bob"]);

        let mut communities: Vec<String> = service
            .list_communities_of_user("alice")
            .unwrap()
            .into_iter()
            .map(|c| c.community_name)
            .collect();
        communities.sort();
        assert_eq!(communities, vec!["jazz-club", "metalheads"]);
    }

    #[test]
    fn test_missing_user_or_community() {
        let service = service();
        service.create_community("jazz-club", "").unwrap();

        let err = service.add_user_to_community("ghost", "jazz-club").unwrap_err();
        assert_eq!(err.to_string(), "user does not exist: ghost");

        let err = service.add_user_to_community("alice", "nowhere").unwrap_err();
        assert_eq!(err.to_string(), "community does not exist: nowhere");
    }

    #[test]
    fn test_padded_community_name_matches_created_one() {
        let service = service();
        service.create_community(" jazz-club ", "").unwrap();
        service.add_user_to_community("alice", "jazz-club ").unwrap();
        service.add_user_to_community("bob", "\tjazz-club").unwrap();

        let members = service.list_users_from_community("  jazz-club").unwrap();
        assert_eq!(members.len(), 2);
        let err = service.add_user_to_community("alice", " nowhere ").unwrap_err();
        assert_eq!(err.to_string(), "community does not exist: nowhere");
    }

    #[test]
    fn test_empty_community_lists_no_members() {
        let service = service();
        service.create_community("quiet", "").unwrap();
        assert!(service.list_users_from_community("quiet").unwrap().is_empty());
        assert!(service.list_communities_of_user("bob").unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_membership_fails() {
        let service = service();
        service.create_community("jazz-club", "").unwrap();
        service.add_user_to_community("alice", "jazz-club").unwrap();
        assert!(matches!(
            service.add_user_to_community("alice", "jazz-club"),
            Err(Error::OperationFailed { .. })
        ));
    }

    #[test]
    fn test_add_member_requires_ids() {
        let store: Arc<dyn RelationalStore> = Arc::new(SqliteRelationalStore::in_memory().unwrap());
        let repository = CommunityRepository::new(store);
        let err = repository
            .add_member(&User::new("a", "", ""), &Community::new("c", ""))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
