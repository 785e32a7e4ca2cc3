use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An account allowed to call the posts API.
///
/// Emails are stored normalized (trimmed, lowercased), so lookups must go
/// through [`normalize_email`] as well.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    /// Argon2 PHC string, never the plain password.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// New account with a generated id; `email` is normalized.
    pub fn new(email: &str, password_hash: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: normalize_email(email),
            password_hash: password_hash.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Canonical form of an email address for storage and lookup.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Loose shape check: a non-empty local part and domain around one `@`,
/// no whitespace.
pub fn is_valid_email(raw: &str) -> bool {
    let email = raw.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_email() {
        let user = User::new("  Reader@Example.COM ", "$argon2id$hash");
        assert_eq!(user.email, "reader@example.com");
        assert_eq!(user.created_at, user.updated_at);
    }

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("reader@example.com"));
        assert!(is_valid_email(" reader@example.com "));
        assert!(!is_valid_email("reader"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("reader@"));
        assert!(!is_valid_email("a@b@c"));
        assert!(!is_valid_email("read er@example.com"));
    }
}
