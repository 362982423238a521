//! Statements the execution path cannot run
//!
//! The migration files are written for MySQL and contain engine directives,
//! privilege management and stored routines that the target connection does
//! not understand. Those statements are skipped instead of attempted.

/// Built-in keywords. Matching is a case-sensitive substring test, so the
/// trailing spaces are significant (`GRANT ` does not match `GRANTED`).
pub const DEFAULT_SKIP_KEYWORDS: &[&str] = &[
    "SOURCE ",
    "SHOW ",
    "DELIMITER",
    "CREATE ROLE",
    "DROP ROLE",
    "GRANT ",
    "REVOKE ",
    "SET DEFAULT ROLE",
    "CREATE USER",
    "CREATE FUNCTION",
    "CREATE PROCEDURE",
    "CREATE TRIGGER",
    "DROP FUNCTION",
    "DROP PROCEDURE",
    "DROP TRIGGER",
];

/// Keyword denylist for dialect-specific statements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denylist {
    keywords: Vec<String>,
}

impl Default for Denylist {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_SKIP_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl Denylist {
    /// Built-in keywords plus `extra`. Built-in keywords cannot be removed.
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut denylist = Self::default();
        for keyword in extra {
            let keyword = keyword.into();
            if !keyword.is_empty() && !denylist.keywords.contains(&keyword) {
                denylist.keywords.push(keyword);
            }
        }
        denylist
    }

    /// Return the first keyword contained in `statement`, if any.
    ///
    /// `None` means the statement should be executed.
    pub fn matched_keyword(&self, statement: &str) -> Option<&str> {
        self.keywords
            .iter()
            .find(|k| statement.contains(k.as_str()))
            .map(String::as_str)
    }

    /// Whether `statement` must be skipped
    pub fn is_denied(&self, statement: &str) -> bool {
        self.matched_keyword(statement).is_some()
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_default_keyword_is_denied() {
        let denylist = Denylist::default();
        let statements = [
            "SOURCE /tmp/other.sql",
            "SHOW TABLES",
            "DELIMITER //",
            "CREATE ROLE 'app_admin'",
            "DROP ROLE IF EXISTS 'app_admin'",
            "GRANT SELECT ON xhub.* TO 'app_read'",
            "REVOKE ALL PRIVILEGES ON xhub.* FROM 'guest'",
            "SET DEFAULT ROLE 'app_read' TO 'reporter'@'%'",
            "CREATE USER 'reporter'@'%' IDENTIFIED BY 'x'",
            "CREATE FUNCTION hash_password(p VARCHAR(255)) RETURNS VARCHAR(64)",
            "CREATE PROCEDURE sp_login(IN email VARCHAR(255))",
            "CREATE TRIGGER trg_users_audit AFTER INSERT ON users FOR EACH ROW",
            "DROP FUNCTION IF EXISTS hash_password",
            "DROP PROCEDURE IF EXISTS sp_login",
            "DROP TRIGGER IF EXISTS trg_users_audit",
        ];

        for statement in statements {
            assert!(denylist.is_denied(statement), "expected skip: {}", statement);
        }
    }

    #[test]
    fn test_plain_statements_pass() {
        let denylist = Denylist::default();
        let statements = [
            "CREATE TABLE users (id INTEGER PRIMARY KEY, email VARCHAR)",
            "INSERT INTO roles (name) VALUES ('Admin')",
            "CREATE VIEW active_users AS SELECT * FROM users WHERE active",
            "UPDATE users SET active = true",
        ];

        for statement in statements {
            assert_eq!(denylist.matched_keyword(statement), None, "{}", statement);
        }
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let denylist = Denylist::default();
        assert!(!denylist.is_denied("create trigger trg after insert on t"));
        assert!(!denylist.is_denied("show tables"));
    }

    #[test]
    fn test_matching_is_substring_anywhere() {
        let denylist = Denylist::default();
        // The keyword inside a string literal still matches
        let statement = "INSERT INTO notes (body) VALUES ('please GRANT access')";
        assert_eq!(denylist.matched_keyword(statement), Some("GRANT "));
    }

    #[test]
    fn test_trailing_space_is_significant() {
        let denylist = Denylist::default();
        assert!(!denylist.is_denied("INSERT INTO t (status) VALUES ('GRANTED')"));
    }

    #[test]
    fn test_with_extra_appends_keywords() {
        let denylist = Denylist::with_extra(["LOCK TABLES", "", "SHOW "]);
        assert_eq!(denylist.keywords().len(), DEFAULT_SKIP_KEYWORDS.len() + 1);
        assert_eq!(denylist.matched_keyword("LOCK TABLES users WRITE"), Some("LOCK TABLES"));
        assert!(denylist.is_denied("CREATE TRIGGER t"));
    }
}
