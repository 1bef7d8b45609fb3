//! Relational store implementations.
//!
//! Table names and column names arrive as strings from the services, so both
//! backends validate them before use. A table argument is either a plain
//! table name or a simple join expression
//! (`A a JOIN B b ON a.id = b.a_id`); only the `SQLite` store accepts joins.

mod memory;
mod sqlite;

pub use memory::InMemoryRelationalStore;
pub use sqlite::SqliteRelationalStore;

use crate::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// `name` or `alias.name`.
static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$")
        .unwrap_or_else(|_| unreachable!())
});

/// `T [t] (JOIN U [u] ON t.x = u.y)*`
static TABLE_EXPRESSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z_]\w*( [A-Za-z_]\w*)?( JOIN [A-Za-z_]\w*( [A-Za-z_]\w*)? ON [A-Za-z_]\w*\.\w+ = [A-Za-z_]\w*\.\w+)*$",
    )
    .unwrap_or_else(|_| unreachable!())
});

/// Rejects anything but a plain or alias-qualified column name.
pub(crate) fn validate_column(column: &str) -> Result<()> {
    if IDENTIFIER.is_match(column) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!("unsafe column name: '{column}'")))
    }
}

/// Rejects anything but a table name or a simple inner join.
pub(crate) fn validate_table(table: &str) -> Result<()> {
    if TABLE_EXPRESSION.is_match(table) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!("unsafe table expression: '{table}'")))
    }
}

/// Whether `table` names a single table (no alias, no join).
pub(crate) fn is_plain_table(table: &str) -> bool {
    !table.contains(' ') && IDENTIFIER.is_match(table) && !table.contains('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{COMMUNITIES_WITH_MEMBERSHIP, USERS_WITH_MEMBERSHIP};
    use test_case::test_case;

    #[test_case("USERS" ; "plain")]
    #[test_case(COMMUNITIES_WITH_MEMBERSHIP ; "communities join")]
    #[test_case(USERS_WITH_MEMBERSHIP ; "users join")]
    fn test_accepts_table_expressions(table: &str) {
        assert!(validate_table(table).is_ok());
    }

    #[test_case("USERS; DROP TABLE USERS" ; "statement injection")]
    #[test_case("USERS WHERE 1=1" ; "where clause")]
    #[test_case("" ; "empty")]
    #[test_case("USERS --" ; "comment")]
    fn test_rejects_table_expressions(table: &str) {
        assert!(matches!(validate_table(table), Err(Error::InvalidInput(_))));
    }

    #[test_case("username", true ; "plain column")]
    #[test_case("uc.community_id", true ; "qualified column")]
    #[test_case("id = 1 OR 1", false ; "expression")]
    #[test_case("a.b.c", false ; "double qualified")]
    fn test_column_validation(column: &str, ok: bool) {
        assert_eq!(validate_column(column).is_ok(), ok);
    }

    #[test]
    fn test_plain_table_detection() {
        assert!(is_plain_table("USERS"));
        assert!(!is_plain_table(USERS_WITH_MEMBERSHIP));
        assert!(!is_plain_table("u.USERS"));
    }
}
