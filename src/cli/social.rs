//! Social graph commands.

use super::{Command, to_json};
use crate::models::{FriendshipRequest, GenreLikeRequest, User};
use crate::services::SocialGraphService;
use crate::{Error, Result};

/// Runs a social graph command.
///
/// # Errors
///
/// Returns the service error, or [`Error::InvalidInput`] for a community
/// command.
pub fn execute_social(command: Command, service: &SocialGraphService) -> Result<serde_json::Value> {
    match command {
        Command::CreateUser {
            username,
            full_name,
            email,
            birth_date,
            telephone,
        } => {
            let mut user = User::new(username, full_name, email);
            if let Some(date) = birth_date {
                user = user.with_birth_date(date);
            }
            if let Some(telephone) = telephone {
                user = user.with_telephone(telephone);
            }
            to_json(&service.create_user(&user)?)
        },
        Command::GetUser { username } => to_json(&service.get_user(&username)?),
        Command::Befriend {
            username1,
            username2,
        } => {
            service.add_friendship(&username1, &username2)?;
            to_json(&FriendshipRequest {
                username1,
                username2,
            })
        },
        Command::Friends { username } => to_json(&service.list_friendships(&username)?),
        Command::LikeGenre { username, genre } => {
            service.like_genre(&username, &genre)?;
            to_json(&GenreLikeRequest {
                username,
                genre_name: genre.trim().to_string(),
            })
        },
        Command::Genres { username } => to_json(&service.list_liked_genres(&username)?),
        Command::Recommend { username } => {
            to_json(&service.get_recommendations_by_genre(&username)?)
        },
        Command::RepairUser { username } => to_json(&service.repair_user_node(&username)?),
        Command::Community { .. } => Err(Error::InvalidInput(
            "community commands are handled by the community service".to_string(),
        )),
    }
}
