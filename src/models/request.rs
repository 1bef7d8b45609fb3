//! Request payloads for the social graph operations.

use serde::{Deserialize, Serialize};

/// Two users to befriend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendshipRequest {
    /// First user.
    pub username1: String,
    /// Second user.
    pub username2: String,
}

/// A genre a user likes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreLikeRequest {
    /// The user.
    pub username: String,
    /// Genre name, trimmed before use.
    pub genre_name: String,
}
