//! Authorization gate: effective permissions and the encoded grant.
//!
//! At login the account's permission URLs are joined with `,` and base64url
//! encoded into the `permissions` cookie. A protected action is allowed only
//! when the decoded grant names it and the account holds some live session.
//! The grant is not tied to a particular session: a revocation blocks stale
//! cookies until the next login, after which an older cookie is honoured again
//! until it expires.

use std::sync::Arc;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use ulid::Ulid;

use crate::config::GrantMatch;
use crate::error::{AppError, Result};
use crate::models::Listing;
use crate::store::{GrantReader, SessionReader};

/// Cookie carrying the encoded grant
pub const GRANT_COOKIE: &str = "permissions";

const DELIMITER: char = ',';

/// Encodes without padding, decodes with or without it.
const GRANT_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Ordered list of permission URLs handed to the client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grant {
    entries: Vec<String>,
}

impl Grant {
    pub fn from_permissions(urls: Vec<String>) -> Self {
        Self { entries: urls }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    fn joined(&self) -> String {
        self.entries.join(",")
    }

    pub fn encode(&self) -> String {
        GRANT_ENGINE.encode(self.joined())
    }

    pub fn decode(raw: &str) -> Result<Self> {
        let bytes = GRANT_ENGINE
            .decode(raw.trim())
            .map_err(|_| AppError::Unauthorized("malformed permission grant".into()))?;
        let joined = String::from_utf8(bytes)
            .map_err(|_| AppError::Unauthorized("malformed permission grant".into()))?;

        let entries = if joined.is_empty() {
            Vec::new()
        } else {
            joined.split(DELIMITER).map(str::to_string).collect()
        };
        Ok(Self { entries })
    }

    /// Whether `action` is granted under `mode`.
    pub fn allows(&self, action: &str, mode: GrantMatch) -> bool {
        if action.is_empty() {
            return false;
        }
        match mode {
            GrantMatch::Exact => {
                let wanted = action.trim_start_matches('/');
                self.entries
                    .iter()
                    .any(|entry| entry.trim_start_matches('/') == wanted)
            }
            GrantMatch::Contains => self.joined().contains(action),
        }
    }
}

/// Derives effective permissions and gates protected actions.
pub struct AuthorizationService {
    grants: Arc<dyn GrantReader>,
    sessions: Arc<dyn SessionReader>,
    mode: GrantMatch,
}

impl AuthorizationService {
    pub fn new(grants: Arc<dyn GrantReader>, sessions: Arc<dyn SessionReader>, mode: GrantMatch) -> Self {
        Self {
            grants,
            sessions,
            mode,
        }
    }

    /// Distinct permission URLs reachable through the account's roles.
    pub async fn effective_permissions(&self, account_id: Ulid) -> Result<Listing<String>> {
        let permissions = self.grants.effective_permissions(account_id).await?;
        if permissions.is_empty() {
            tracing::debug!(account_id = %account_id, "account has no effective permissions");
        }
        Ok(permissions)
    }

    /// Reject unless the account holds a live session and `grant` names `action`.
    pub async fn check(&self, account_id: Ulid, grant: &Grant, action: &str) -> Result<()> {
        if self.sessions.live_session_for_account(account_id).await?.is_none() {
            tracing::debug!(account_id = %account_id, action, "grant presented without a live session");
            return Err(AppError::Unauthorized("session revoked or expired".into()));
        }
        if !grant.allows(action, self.mode) {
            tracing::debug!(account_id = %account_id, action, "action not granted");
            return Err(AppError::Unauthorized(format!("permission required: {action}")));
        }
        Ok(())
    }
}
