//! Account model.

use chrono::{DateTime, Utc};
use serde::Serialize;
use ulid::Ulid;

/// Credential record. Only `id` and `email` are ever serialized.
#[derive(Clone, Serialize)]
pub struct Account {
    pub id: Ulid,
    pub email: String,
    /// bcrypt hash, never the plaintext
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(skip_serializing)]
    pub created_at: DateTime<Utc>,
}

redacted_debug!(Account {
    show id,
    show email,
    redact password,
    show created_at,
});

impl Account {
    /// New account with a fresh id; `password_hash` must already be hashed.
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: Ulid::new(),
            email: email.into(),
            password: password_hash.into(),
            created_at: Utc::now(),
        }
    }
}

/// Account-role association row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct AccountRole {
    pub account_id: Ulid,
    pub role_id: Ulid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_never_serialized() {
        let account = Account::new("a@x.com", "$2b$04$hash-of-hunter2pass");
        let json = serde_json::to_value(&account).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["email"], "a@x.com");
        assert_eq!(obj["id"], account.id.to_string());
        assert!(!json.to_string().contains("hash-of-hunter2pass"));
    }

    #[test]
    fn test_debug_redacts_password() {
        let account = Account::new("a@x.com", "secret-hash");
        assert!(!format!("{:?}", account).contains("secret-hash"));
    }

    #[test]
    fn test_ids_sort_by_creation() {
        let first = Account::new("a@x.com", "h");
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = Account::new("b@x.com", "h");
        assert!(first.id < second.id);
    }
}
