//! Data models for symphony.
//!
//! Typed entities (`User`, `Community`), request payloads, and the loosely
//! typed `Value`/`Row` shapes the stores exchange.

mod community;
mod request;
mod user;
mod value;

pub use community::{
    COMMUNITIES_WITH_MEMBERSHIP, COMMUNITY_TABLE, Community, USER_COMMUNITY_TABLE,
    USERS_WITH_MEMBERSHIP,
};
pub use request::{FriendshipRequest, GenreLikeRequest};
pub use user::{USER_TABLE, User};
pub use value::{Record, Row, RowReader, Value, strings_from_records};
