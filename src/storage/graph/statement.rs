//! Parameterized graph statements.
//!
//! Every graph operation the social layer performs is one variant of
//! [`GraphStatement`]. A statement carries its parameters, knows its Cypher
//! text (what a Neo4j server runs) and names the field its result records
//! expose. Embedded backends interpret the variant directly.

use crate::models::{Row, User, Value};

/// Maximum number of genre-based recommendations returned.
pub const RECOMMENDATION_LIMIT: usize = 10;

const CREATE_USER: &str = "CREATE (p:User {username: $username})";

const MERGE_USER: &str = "MERGE (p:User {username: $username})";

const MERGE_FRIENDSHIP: &str = "
MATCH (u1:User {username: $username1}), (u2:User {username: $username2})
MERGE (u1)-[:FRIENDS_WITH]-(u2)
";

const LIKE_GENRE: &str = "
MERGE (g:Genre {genre_name: $genreName})
WITH g
MATCH (u:User {username: $username})
MERGE (u)-[:LIKES]->(g)
";

const LIST_FRIENDS: &str = "
MATCH (u:User {username: $username})-[:FRIENDS_WITH]-(friend:User)
RETURN friend.username AS friend
";

const LIST_LIKED_GENRES: &str = "
MATCH (u:User {username: $username})-[:LIKES]-(g:Genre)
RETURN g.genre_name AS genre
";

const RECOMMEND_BY_GENRE: &str = "
MATCH (u:User {username: $username})-[:LIKES]->(g:Genre)<-[:LIKES]-(other:User)
WHERE other.username <> $username
  AND NOT (u)-[:FRIENDS_WITH]-(other)
RETURN DISTINCT other.username AS username
LIMIT $limit
";

/// A graph statement together with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphStatement {
    /// Creates a `User` node. All user attributes travel as parameters, only
    /// `username` is stored on the node.
    CreateUser {
        /// Natural key of the node.
        username: String,
        /// Full attribute map of the user.
        properties: Row,
    },
    /// Creates a `User` node if none exists for the username.
    MergeUser {
        /// Natural key of the node.
        username: String,
    },
    /// Links two users with one undirected `FRIENDS_WITH` edge.
    MergeFriendship {
        /// One side of the friendship.
        username1: String,
        /// The other side.
        username2: String,
    },
    /// Records that a user likes a genre, creating the genre if needed.
    LikeGenre {
        /// The user.
        username: String,
        /// Free-text genre name.
        genre_name: String,
    },
    /// Lists the usernames of a user's friends (field `friend`).
    ListFriends {
        /// The user.
        username: String,
    },
    /// Lists the genres a user likes (field `genre`).
    ListLikedGenres {
        /// The user.
        username: String,
    },
    /// Lists users who share a liked genre but are not friends yet
    /// (field `username`).
    RecommendByGenre {
        /// The subject user.
        username: String,
        /// Result cap.
        limit: usize,
    },
}

impl GraphStatement {
    /// `CreateUser` for a full user record.
    #[must_use]
    pub fn create_user(user: &User) -> Self {
        Self::CreateUser {
            username: user.username.clone(),
            properties: user.to_row(),
        }
    }

    /// `MergeUser` for a username.
    #[must_use]
    pub fn merge_user(username: impl Into<String>) -> Self {
        Self::MergeUser {
            username: username.into(),
        }
    }

    /// `MergeFriendship` between two usernames.
    #[must_use]
    pub fn merge_friendship(username1: impl Into<String>, username2: impl Into<String>) -> Self {
        Self::MergeFriendship {
            username1: username1.into(),
            username2: username2.into(),
        }
    }

    /// `LikeGenre` for a user and genre.
    #[must_use]
    pub fn like_genre(username: impl Into<String>, genre_name: impl Into<String>) -> Self {
        Self::LikeGenre {
            username: username.into(),
            genre_name: genre_name.into(),
        }
    }

    /// `ListFriends` for a user.
    #[must_use]
    pub fn list_friends(username: impl Into<String>) -> Self {
        Self::ListFriends {
            username: username.into(),
        }
    }

    /// `ListLikedGenres` for a user.
    #[must_use]
    pub fn list_liked_genres(username: impl Into<String>) -> Self {
        Self::ListLikedGenres {
            username: username.into(),
        }
    }

    /// `RecommendByGenre` with the standard cap.
    #[must_use]
    pub fn recommend_by_genre(username: impl Into<String>) -> Self {
        Self::RecommendByGenre {
            username: username.into(),
            limit: RECOMMENDATION_LIMIT,
        }
    }

    /// Snake-case name used in logs, metrics and error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::CreateUser { .. } => "create_user",
            Self::MergeUser { .. } => "merge_user",
            Self::MergeFriendship { .. } => "merge_friendship",
            Self::LikeGenre { .. } => "like_genre",
            Self::ListFriends { .. } => "list_friends",
            Self::ListLikedGenres { .. } => "list_liked_genres",
            Self::RecommendByGenre { .. } => "recommend_by_genre",
        }
    }

    /// Whether the statement mutates the graph.
    #[must_use]
    pub const fn is_write(&self) -> bool {
        matches!(
            self,
            Self::CreateUser { .. }
                | Self::MergeUser { .. }
                | Self::MergeFriendship { .. }
                | Self::LikeGenre { .. }
        )
    }

    /// The Cypher text of the statement.
    #[must_use]
    pub const fn cypher(&self) -> &'static str {
        match self {
            Self::CreateUser { .. } => CREATE_USER,
            Self::MergeUser { .. } => MERGE_USER,
            Self::MergeFriendship { .. } => MERGE_FRIENDSHIP,
            Self::LikeGenre { .. } => LIKE_GENRE,
            Self::ListFriends { .. } => LIST_FRIENDS,
            Self::ListLikedGenres { .. } => LIST_LIKED_GENRES,
            Self::RecommendByGenre { .. } => RECOMMEND_BY_GENRE,
        }
    }

    /// Name of the single field each result record carries, for reads.
    #[must_use]
    pub const fn result_field(&self) -> Option<&'static str> {
        match self {
            Self::ListFriends { .. } => Some("friend"),
            Self::ListLikedGenres { .. } => Some("genre"),
            Self::RecommendByGenre { .. } => Some("username"),
            _ => None,
        }
    }

    /// Parameters bound to the Cypher `$placeholders`.
    #[must_use]
    pub fn parameters(&self) -> Row {
        let mut params = Row::new();
        match self {
            Self::CreateUser {
                username,
                properties,
            } => {
                params.extend(properties.clone());
                params.insert("username".to_string(), Value::from(username));
            },
            Self::MergeUser { username }
            | Self::ListFriends { username }
            | Self::ListLikedGenres { username } => {
                params.insert("username".to_string(), Value::from(username));
            },
            Self::MergeFriendship {
                username1,
                username2,
            } => {
                params.insert("username1".to_string(), Value::from(username1));
                params.insert("username2".to_string(), Value::from(username2));
            },
            Self::LikeGenre {
                username,
                genre_name,
            } => {
                params.insert("username".to_string(), Value::from(username));
                params.insert("genreName".to_string(), Value::from(genre_name));
            },
            Self::RecommendByGenre { username, limit } => {
                params.insert("username".to_string(), Value::from(username));
                params.insert(
                    "limit".to_string(),
                    Value::Integer(i64::try_from(*limit).unwrap_or(i64::MAX)),
                );
            },
        }
        params
    }
}
