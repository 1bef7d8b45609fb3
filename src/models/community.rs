//! Communities and their membership table.

use super::value::{Row, RowReader, Value};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Relational table holding communities.
pub const COMMUNITY_TABLE: &str = "COMMUNITY";

/// Membership link table between users and communities.
pub const USER_COMMUNITY_TABLE: &str = "USER_COMMUNITY";

/// Communities joined with their membership rows (filter on `uc.user_id`).
pub const COMMUNITIES_WITH_MEMBERSHIP: &str =
    "COMMUNITY c JOIN USER_COMMUNITY uc ON c.id = uc.community_id";

/// Users joined with their membership rows (filter on `uc.community_id`).
pub const USERS_WITH_MEMBERSHIP: &str = "USERS u JOIN USER_COMMUNITY uc ON u.id = uc.user_id";

/// A user community.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Community {
    /// Surrogate key (`None` before insert).
    pub id: Option<i64>,
    /// Unique community name.
    pub community_name: String,
    /// Free-text description.
    pub description: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Community {
    /// Creates a community stamped with the current time.
    #[must_use]
    pub fn new(community_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: None,
            community_name: community_name.into(),
            description: description.into(),
            created_at: Utc::now(),
        }
    }

    /// Column map used for inserts.
    #[must_use]
    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        if let Some(id) = self.id {
            row.insert("id".to_string(), Value::Integer(id));
        }
        row.insert("community_name".to_string(), Value::from(&self.community_name));
        row.insert("description".to_string(), Value::from(&self.description));
        row.insert("created_at".to_string(), Value::Timestamp(self.created_at));
        row
    }

    /// Builds a community from a row read from `table`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MalformedRow`] if a column is missing or mistyped.
    pub fn from_row(row: &Row, table: &str) -> Result<Self> {
        let reader = RowReader::new(row, table);
        Ok(Self {
            id: reader.optional_integer("id")?,
            community_name: reader.text("community_name")?,
            description: reader.text_or_empty("description")?,
            created_at: reader.timestamp("created_at")?,
        })
    }

    /// Converts every row, failing on the first malformed one.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MalformedRow`] for the first bad row.
    pub fn from_rows(rows: &[Row], table: &str) -> Result<Vec<Self>> {
        rows.iter().map(|row| Self::from_row(row, table)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_conversion() {
        let mut community = Community::new("jazz-club", "Late night standards");
        community.id = Some(4);
        let back = Community::from_row(&community.to_row(), COMMUNITY_TABLE).unwrap();
        assert_eq!(back, community);
    }

    #[test]
    fn test_missing_created_at_is_malformed() {
        let mut row = Community::new("jazz-club", "").to_row();
        row.remove("created_at");
        assert!(Community::from_row(&row, COMMUNITY_TABLE).is_err());
    }
}
