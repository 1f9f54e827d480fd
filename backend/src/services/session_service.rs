//! Session manager: login, access token refresh, logout and revocation.
//!
//! An account is either without a session or holds exactly one live refresh
//! token. Login is refused while that token is live; logout, revocation or
//! expiry return the account to the sessionless state.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info};
use ulid::Ulid;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{Listing, RefreshToken};
use crate::services::authorization::{AuthorizationService, Grant};
use crate::services::password::PasswordHasher;
use crate::services::token::{random_token, AccessClaims, TokenSigner, REFRESH_TOKEN_LEN};
use crate::store::{AccountReader, SessionReader, SessionWriter};

/// Token pair handed out at login
#[derive(Clone, Serialize)]
pub struct TokenBundle {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(rename = "type")]
    pub token_type: &'static str,
    /// Refresh token expiry
    pub expired_at: DateTime<Utc>,
    pub access_expires_at: DateTime<Utc>,
    pub scope: &'static str,
}

redacted_debug!(TokenBundle {
    redact access_token,
    redact refresh_token,
    show token_type,
    show expired_at,
    show access_expires_at,
    show scope,
});

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub tokens: TokenBundle,
    pub permissions: Listing<String>,
}

impl LoginOutcome {
    /// The grant to hand back as the `permissions` cookie.
    pub fn grant(&self) -> Grant {
        Grant::from_permissions(self.permissions.data.clone())
    }
}

/// Access token minted from a live refresh token
#[derive(Clone, Serialize)]
pub struct RefreshedAccess {
    pub access_token: String,
    #[serde(rename = "type")]
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
}

redacted_debug!(RefreshedAccess {
    redact access_token,
    show token_type,
    show expires_at,
});

pub struct SessionService {
    accounts: Arc<dyn AccountReader>,
    session_reader: Arc<dyn SessionReader>,
    session_writer: Arc<dyn SessionWriter>,
    authorization: Arc<AuthorizationService>,
    hasher: PasswordHasher,
    signer: TokenSigner,
    refresh_ttl: Duration,
}

impl SessionService {
    pub fn new(
        accounts: Arc<dyn AccountReader>,
        session_reader: Arc<dyn SessionReader>,
        session_writer: Arc<dyn SessionWriter>,
        authorization: Arc<AuthorizationService>,
        config: &Config,
    ) -> Self {
        Self {
            accounts,
            session_reader,
            session_writer,
            authorization,
            hasher: PasswordHasher::new(config.password_cost),
            signer: TokenSigner::new(&config.jwt.secret, config.jwt.access_exp),
            refresh_ttl: Duration::days(i64::from(config.jwt.refresh_exp)),
        }
    }

    /// Refresh token lifetime, mirrored by the grant cookie.
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Authenticate and open the account's single session.
    ///
    /// An unknown email and a wrong password are indistinguishable to the
    /// caller. A live session signals `AlreadyLoggedIn` and issues nothing.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        let account = match self.accounts.find_account_by_email(email).await {
            Ok(account) => account,
            Err(AppError::NotFound(_)) => {
                debug!("login attempt for unknown email");
                return Err(AppError::WrongPassword);
            }
            Err(e) => return Err(e),
        };

        if !self.hasher.verify(password, &account.password)? {
            debug!(account_id = %account.id, "login attempt with wrong password");
            return Err(AppError::WrongPassword);
        }

        if self
            .session_reader
            .live_session_for_account(account.id)
            .await?
            .is_some()
        {
            return Err(AppError::AlreadyLoggedIn);
        }

        let (access_token, access_expires_at) = self.signer.sign(account.id, &account.email)?;
        let session = RefreshToken::issue(
            account.id,
            random_token(REFRESH_TOKEN_LEN),
            self.refresh_ttl,
        );
        let permissions = self.authorization.effective_permissions(account.id).await?;

        // Racing logins meet the single-session constraint here
        self.session_writer.open_session(&session).await?;

        info!(
            account_id = %account.id,
            permissions = permissions.count,
            "account logged in"
        );

        Ok(LoginOutcome {
            tokens: TokenBundle {
                access_token,
                refresh_token: session.token_value,
                token_type: "Bearer",
                expired_at: session.expires_at,
                access_expires_at,
                scope: "*",
            },
            permissions,
        })
    }

    /// Mint a new access token from a live refresh token. The refresh token
    /// is not rotated.
    pub async fn refresh(
        &self,
        refresh_token: &str,
        account_id: Ulid,
        email: &str,
    ) -> Result<RefreshedAccess> {
        let session = self.session_reader.find_live_session(refresh_token).await?;
        if session.account_id != account_id {
            debug!(account_id = %account_id, "refresh token belongs to another account");
            return Err(AppError::not_found("refresh token"));
        }

        let (access_token, expires_at) = self.signer.sign(account_id, email)?;
        debug!(account_id = %account_id, "access token refreshed");
        Ok(RefreshedAccess {
            access_token,
            token_type: "Bearer",
            expires_at,
        })
    }

    /// [`refresh`](Self::refresh) with the identity taken from a presented
    /// access token, which may already have expired.
    pub async fn refresh_with_access_token(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<RefreshedAccess> {
        let claims = self.signer.claims_allowing_expired(access_token)?;
        self.refresh(refresh_token, claims.sub, &claims.email).await
    }

    /// Revoke the live session holding `refresh_token`.
    pub async fn logout(&self, refresh_token: &str) -> Result<()> {
        let session = self.session_reader.find_live_session(refresh_token).await?;
        self.session_writer.revoke_session(refresh_token).await?;
        info!(account_id = %session.account_id, "account logged out");
        Ok(())
    }

    /// Revoke every open session of the account, returning how many there were.
    /// `NotFound` when the account holds none.
    pub async fn revoke_sessions(&self, account_id: Ulid) -> Result<u64> {
        let revoked = self.session_writer.revoke_account_sessions(account_id).await?;
        if revoked == 0 {
            return Err(AppError::not_found("live session"));
        }
        info!(account_id = %account_id, sessions_revoked = revoked, "sessions revoked");
        Ok(revoked)
    }

    /// Validate an access token's signature and expiry.
    pub fn authenticate(&self, access_token: &str) -> Result<AccessClaims> {
        Ok(self.signer.verify(access_token)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GrantMatch;
    use crate::models::{Account, Permission, Role};
    use crate::store::{
        AccountRoleWriter, AccountWriter, MemoryStore, PermissionWriter, RolePermissionWriter,
        RoleWriter,
    };

    fn test_config() -> Config {
        let mut config = Config::default();
        config.password_cost = 4;
        config.jwt.secret = "test-secret".into();
        config
    }

    async fn setup() -> (Arc<MemoryStore>, SessionService, Account) {
        let config = test_config();
        let store = Arc::new(MemoryStore::new());
        let hasher = PasswordHasher::new(config.password_cost);
        let account = Account::new("a@x.com", hasher.hash("password123").unwrap());
        store.save_account(&account).await.unwrap();

        let authorization = Arc::new(AuthorizationService::new(
            store.clone(),
            store.clone(),
            GrantMatch::Exact,
        ));
        let svc = SessionService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            authorization,
            &config,
        );
        (store, svc, account)
    }

    #[tokio::test]
    async fn test_login_issues_tokens_and_empty_permissions() {
        let (store, svc, account) = setup().await;
        let outcome = svc.login("a@x.com", "password123").await.unwrap();

        assert_eq!(outcome.tokens.refresh_token.len(), REFRESH_TOKEN_LEN);
        assert_eq!(outcome.permissions.count, 0);
        assert!(outcome.permissions.data.is_empty());

        let claims = svc.authenticate(&outcome.tokens.access_token).unwrap();
        assert_eq!(claims.sub, account.id);
        assert_eq!(claims.email, "a@x.com");

        let session = store.live_session_for_account(account.id).await.unwrap().unwrap();
        assert_eq!(session.token_value, outcome.tokens.refresh_token);
        assert_eq!(session.expires_at, outcome.tokens.expired_at);
    }

    #[tokio::test]
    async fn test_unknown_email_and_wrong_password_look_alike() {
        let (_, svc, _) = setup().await;
        assert!(matches!(
            svc.login("nobody@x.com", "password123").await.unwrap_err(),
            AppError::WrongPassword
        ));
        assert!(matches!(
            svc.login("a@x.com", "password124").await.unwrap_err(),
            AppError::WrongPassword
        ));
    }

    #[tokio::test]
    async fn test_single_session_until_logout() {
        let (_, svc, _) = setup().await;
        let first = svc.login("a@x.com", "password123").await.unwrap();
        assert!(matches!(
            svc.login("a@x.com", "password123").await.unwrap_err(),
            AppError::AlreadyLoggedIn
        ));

        svc.logout(&first.tokens.refresh_token).await.unwrap();
        let second = svc.login("a@x.com", "password123").await.unwrap();
        assert_ne!(first.tokens.refresh_token, second.tokens.refresh_token);
    }

    #[tokio::test]
    async fn test_logout_twice_is_not_found() {
        let (_, svc, _) = setup().await;
        let outcome = svc.login("a@x.com", "password123").await.unwrap();
        svc.logout(&outcome.tokens.refresh_token).await.unwrap();
        assert!(matches!(
            svc.logout(&outcome.tokens.refresh_token).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_refresh_keeps_refresh_token() {
        let (store, svc, account) = setup().await;
        let outcome = svc.login("a@x.com", "password123").await.unwrap();

        let refreshed = svc
            .refresh(&outcome.tokens.refresh_token, account.id, "a@x.com")
            .await
            .unwrap();
        assert_eq!(svc.authenticate(&refreshed.access_token).unwrap().sub, account.id);

        let session = store.live_session_for_account(account.id).await.unwrap().unwrap();
        assert_eq!(session.token_value, outcome.tokens.refresh_token);
    }

    #[tokio::test]
    async fn test_refresh_rejects_foreign_or_dead_tokens() {
        let (_, svc, account) = setup().await;
        let outcome = svc.login("a@x.com", "password123").await.unwrap();

        assert!(matches!(
            svc.refresh(&outcome.tokens.refresh_token, Ulid::new(), "b@x.com")
                .await
                .unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            svc.refresh("unknown", account.id, "a@x.com").await.unwrap_err(),
            AppError::NotFound(_)
        ));

        assert_eq!(svc.revoke_sessions(account.id).await.unwrap(), 1);
        assert!(matches!(
            svc.refresh(&outcome.tokens.refresh_token, account.id, "a@x.com")
                .await
                .unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            svc.revoke_sessions(account.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_refresh_with_expired_access_token() {
        let (_, svc, account) = setup().await;
        let outcome = svc.login("a@x.com", "password123").await.unwrap();

        let past = Utc::now() - Duration::hours(3);
        let expired = svc
            .signer
            .encode_claims(&AccessClaims {
                sub: account.id,
                email: account.email.clone(),
                iat: past.timestamp(),
                exp: (past + Duration::hours(1)).timestamp(),
            })
            .unwrap();
        assert!(matches!(
            svc.authenticate(&expired).unwrap_err(),
            AppError::Unauthorized(_)
        ));

        let refreshed = svc
            .refresh_with_access_token(&expired, &outcome.tokens.refresh_token)
            .await
            .unwrap();
        assert!(refreshed.expires_at > Utc::now());

        assert!(matches!(
            svc.refresh_with_access_token("garbage", &outcome.tokens.refresh_token)
                .await
                .unwrap_err(),
            AppError::Unauthorized(_)
        ));
    }

    #[tokio::test]
    async fn test_login_reports_union_of_role_permissions() {
        let (store, svc, account) = setup().await;
        let r1 = Role::new("r1", "");
        let r2 = Role::new("r2", "");
        store.save_role(&r1).await.unwrap();
        store.save_role(&r2).await.unwrap();
        let mut ids = Vec::new();
        for url in ["/a", "/b", "/c"] {
            let p = Permission::new(url.trim_start_matches('/'), "", url);
            store.save_permission(&p).await.unwrap();
            ids.push(p.id);
        }
        store.assign_permission(r1.id, ids[0]).await.unwrap();
        store.assign_permission(r1.id, ids[1]).await.unwrap();
        store.assign_permission(r2.id, ids[1]).await.unwrap();
        store.assign_permission(r2.id, ids[2]).await.unwrap();
        store.assign_role(account.id, r1.id).await.unwrap();
        store.assign_role(account.id, r2.id).await.unwrap();

        let outcome = svc.login("a@x.com", "password123").await.unwrap();
        assert_eq!(outcome.permissions.count, 3);
        assert_eq!(outcome.permissions.data, vec!["/a", "/b", "/c"]);
        assert_eq!(
            Grant::decode(&outcome.grant().encode()).unwrap().entries(),
            ["/a", "/b", "/c"]
        );
    }

    #[test]
    fn test_bundle_debug_hides_tokens() {
        let bundle = TokenBundle {
            access_token: "header.payload.sig".into(),
            refresh_token: "r4nd0mT0k3n".into(),
            token_type: "Bearer",
            expired_at: Utc::now(),
            access_expires_at: Utc::now(),
            scope: "*",
        };
        let output = format!("{:?}", bundle);
        assert!(!output.contains("r4nd0mT0k3n"));
        assert!(!output.contains("header.payload.sig"));
    }
}
