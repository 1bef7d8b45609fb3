//! Community commands.

use super::to_json;
use crate::Result;
use crate::services::CommunityService;
use clap::Subcommand;
use serde_json::json;

/// Community subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum CommunityAction {
    /// Create a community.
    Create {
        /// Unique community name.
        name: String,

        /// Free-text description.
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Add a user to a community.
    Join {
        /// The user.
        username: String,
        /// The community.
        community: String,
    },

    /// List the members of a community.
    Members {
        /// The community.
        community: String,
    },

    /// List the communities a user belongs to.
    OfUser {
        /// The user.
        username: String,
    },
}

/// Runs a community command.
///
/// # Errors
///
/// Returns the service error.
pub fn execute_community(
    action: CommunityAction,
    service: &CommunityService,
) -> Result<serde_json::Value> {
    match action {
        CommunityAction::Create { name, description } => {
            to_json(&service.create_community(&name, &description)?)
        },
        CommunityAction::Join {
            username,
            community,
        } => {
            service.add_user_to_community(&username, &community)?;
            Ok(json!({ "username": username, "community": community }))
        },
        CommunityAction::Members { community } => {
            to_json(&service.list_users_from_community(&community)?)
        },
        CommunityAction::OfUser { username } => {
            to_json(&service.list_communities_of_user(&username)?)
        },
    }
}
