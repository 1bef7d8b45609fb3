//! The canonical user entity.

use super::value::{Row, RowReader, Value};
use crate::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Relational table holding user records.
pub const USER_TABLE: &str = "USERS";

/// A Symphony user.
///
/// `username` is globally unique and is the key shared by the relational
/// row and the graph node. Every other attribute is owned by the relational
/// store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Surrogate key assigned by the relational store (`None` before insert).
    pub user_id: Option<i64>,
    /// Unique handle.
    pub username: String,
    /// Display name.
    pub full_name: String,
    /// Contact email.
    pub email: String,
    /// Date of birth, if given.
    pub birth_date: Option<NaiveDate>,
    /// Telephone number (may be empty).
    pub telephone: String,
    /// When the user registered.
    pub registered_at: DateTime<Utc>,
}

impl User {
    /// Creates a user registered now, with no id, birth date or telephone.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        full_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            user_id: None,
            username: username.into(),
            full_name: full_name.into(),
            email: email.into(),
            birth_date: None,
            telephone: String::new(),
            registered_at: Utc::now(),
        }
    }

    /// Sets the birth date.
    #[must_use]
    pub const fn with_birth_date(mut self, birth_date: NaiveDate) -> Self {
        self.birth_date = Some(birth_date);
        self
    }

    /// Sets the telephone number.
    #[must_use]
    pub fn with_telephone(mut self, telephone: impl Into<String>) -> Self {
        self.telephone = telephone.into();
        self
    }

    /// Sets the surrogate id.
    #[must_use]
    pub const fn with_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Converts the user into a column map.
    ///
    /// `id` is only present once the relational store has assigned one, so the
    /// same map can be used for inserts.
    #[must_use]
    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        if let Some(id) = self.user_id {
            row.insert("id".to_string(), Value::Integer(id));
        }
        row.insert("username".to_string(), Value::from(&self.username));
        row.insert("fullname".to_string(), Value::from(&self.full_name));
        row.insert("email".to_string(), Value::from(&self.email));
        row.insert(
            "register_date".to_string(),
            Value::Timestamp(self.registered_at),
        );
        row.insert("birth_date".to_string(), Value::from(self.birth_date));
        row.insert("telephone".to_string(), Value::from(&self.telephone));
        row
    }

    /// Builds a user from a row read from `table`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MalformedRow`] if a required column is missing
    /// or holds the wrong type.
    pub fn from_row(row: &Row, table: &str) -> Result<Self> {
        let reader = RowReader::new(row, table);
        Ok(Self {
            user_id: reader.optional_integer("id")?,
            username: reader.text("username")?,
            full_name: reader.text_or_empty("fullname")?,
            email: reader.text_or_empty("email")?,
            birth_date: reader.optional_date("birth_date")?,
            telephone: reader.text_or_empty("telephone")?,
            registered_at: reader.timestamp("register_date")?,
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
