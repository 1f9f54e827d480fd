//! Refresh token (session) model.

use chrono::{DateTime, Duration, Utc};
use ulid::Ulid;

/// One login session. Live while unrevoked and unexpired.
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshToken {
    pub id: Ulid,
    pub token_value: String,
    pub account_id: Ulid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
}

redacted_debug!(RefreshToken {
    show id,
    redact token_value,
    show account_id,
    show created_at,
    show expires_at,
    show revoked,
});

impl RefreshToken {
    /// New unrevoked session expiring `ttl` from now.
    pub fn issue(account_id: Ulid, token_value: impl Into<String>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: Ulid::new(),
            token_value: token_value.into(),
            account_id,
            created_at: now,
            expires_at: now + ttl,
            revoked: false,
        }
    }

    /// `expires_at > now AND revoked = false`
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && self.expires_at > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_liveness() {
        let mut token = RefreshToken::issue(Ulid::new(), "abc", Duration::days(7));
        assert!(token.is_live_at(Utc::now()));
        assert!(!token.is_live_at(token.expires_at));

        token.revoked = true;
        assert!(!token.is_live_at(Utc::now()));
    }

    #[test]
    fn test_debug_redacts_value() {
        let token = RefreshToken::issue(Ulid::new(), "very-secret-value", Duration::days(1));
        assert!(!format!("{:?}", token).contains("very-secret-value"));
    }
}
