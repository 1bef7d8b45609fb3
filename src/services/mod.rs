//! Business logic services.
//!
//! - [`UserDirectory`]: user lookups over the relational store
//! - [`SocialGraphService`]: dual-write user creation, friendships, genre
//!   likes and recommendations
//! - [`CommunityService`]: community membership
//! - [`StoreFactory`]: builds stores and services from configuration

mod community;
mod factory;
mod social_graph;
mod user_directory;

pub use community::{CommunityRepository, CommunityService};
pub use factory::{Services, StoreFactory};
pub use social_graph::SocialGraphService;
pub use user_directory::UserDirectory;
