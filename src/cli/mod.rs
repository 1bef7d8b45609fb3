//! CLI command definitions and handlers.
//!
//! Every command prints one JSON document on stdout.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `create-user` | Create a user in both stores |
//! | `get-user` | Show a user |
//! | `befriend` | Make two users friends |
//! | `friends` | List a user's friends |
//! | `like-genre` | Record a liked genre |
//! | `genres` | List a user's liked genres |
//! | `recommend` | Genre-based friend recommendations |
//! | `repair-user` | Recreate a missing graph node for a stored user |
//! | `community` | Create, join and list communities |
//!
//! # Example Usage
//!
//! ```bash
//! symphony create-user alice --full-name "Alice Liddell" --email alice@example.com
//! symphony like-genre alice jazz
//! symphony recommend alice
//! symphony community join alice jazz-club
//! ```

mod community;
mod social;

pub use community::{CommunityAction, execute_community};
pub use social::execute_social;

use crate::services::Services;
use crate::{Error, Result};
use chrono::NaiveDate;
use clap::Subcommand;
use serde::Serialize;

/// Available commands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create a user.
    CreateUser {
        /// Unique username.
        username: String,

        /// Display name.
        #[arg(long, default_value = "")]
        full_name: String,

        /// Contact email.
        #[arg(long, default_value = "")]
        email: String,

        /// Birth date (YYYY-MM-DD).
        #[arg(long)]
        birth_date: Option<NaiveDate>,

        /// Telephone number.
        #[arg(long)]
        telephone: Option<String>,
    },

    /// Show a user.
    GetUser {
        /// Username to look up.
        username: String,
    },

    /// Make two users friends.
    Befriend {
        /// First user.
        username1: String,
        /// Second user.
        username2: String,
    },

    /// List a user's friends.
    Friends {
        /// The user.
        username: String,
    },

    /// Record that a user likes a genre.
    LikeGenre {
        /// The user.
        username: String,
        /// Genre name.
        genre: String,
    },

    /// List the genres a user likes.
    Genres {
        /// The user.
        username: String,
    },

    /// Recommend users who share a liked genre and are not friends yet.
    Recommend {
        /// The user.
        username: String,
    },

    /// Recreate the graph node of a stored user.
    RepairUser {
        /// The user.
        username: String,
    },

    /// Manage communities.
    Community {
        /// Community subcommand.
        #[command(subcommand)]
        action: CommunityAction,
    },
}

/// Runs a command and returns its JSON output.
///
/// # Errors
///
/// Returns the service error of the command.
pub fn execute(command: Command, services: &Services) -> Result<serde_json::Value> {
    match command {
        Command::Community { action } => execute_community(action, &services.communities),
        other => execute_social(other, &services.social),
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| Error::operation("serialize_output", e))
}
