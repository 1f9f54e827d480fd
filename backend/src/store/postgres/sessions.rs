//! Refresh-token sessions and the effective permission join.

use async_trait::async_trait;
use ulid::Ulid;
use uuid::Uuid;

use super::{violation, PgStore, RefreshTokenRow, Violation};
use crate::error::{AppError, Result};
use crate::models::{Listing, RefreshToken};
use crate::store::{GrantReader, SessionReader, SessionWriter};

const ONE_ACTIVE_PER_ACCOUNT: &str = "refresh_tokens_one_active_per_account";

#[async_trait]
impl SessionReader for PgStore {
    async fn find_live_session(&self, token_value: &str) -> Result<RefreshToken> {
        let row: Option<RefreshTokenRow> = sqlx::query_as(
            r#"
            SELECT id, token_value, account_id, created_at, expires_at, revoked
            FROM refresh_tokens
            WHERE token_value = $1 AND expires_at > NOW() AND revoked = FALSE
            "#,
        )
        .bind(token_value)
        .fetch_optional(&self.db)
        .await?;

        row.map(RefreshToken::from)
            .ok_or_else(|| AppError::not_found("refresh token"))
    }

    async fn live_session_for_account(&self, account_id: Ulid) -> Result<Option<RefreshToken>> {
        let row: Option<RefreshTokenRow> = sqlx::query_as(
            r#"
            SELECT id, token_value, account_id, created_at, expires_at, revoked
            FROM refresh_tokens
            WHERE account_id = $1 AND expires_at > NOW() AND revoked = FALSE
            LIMIT 1
            "#,
        )
        .bind(Uuid::from(account_id))
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(RefreshToken::from))
    }
}

#[async_trait]
impl SessionWriter for PgStore {
    async fn open_session(&self, session: &RefreshToken) -> Result<()> {
        let account_id = Uuid::from(session.account_id);
        let mut tx = self.db.begin().await?;

        // Expired rows still hold the single-session index slot
        sqlx::query(
            r#"
            UPDATE refresh_tokens SET revoked = TRUE
            WHERE account_id = $1 AND revoked = FALSE AND expires_at <= NOW()
            "#,
        )
        .bind(account_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (id, token_value, account_id, created_at, expires_at, revoked)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::from(session.id))
        .bind(&session.token_value)
        .bind(account_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .bind(session.revoked)
        .execute(&mut *tx)
        .await
        .map_err(|e| match violation(&e) {
            Violation::Unique(Some(ONE_ACTIVE_PER_ACCOUNT)) => AppError::AlreadyLoggedIn,
            Violation::Unique(_) => AppError::AlreadyExists("refresh token".into()),
            Violation::ForeignKey => AppError::not_found("account"),
            Violation::Other => AppError::Database(e),
        })?;

        tx.commit().await?;
        Ok(())
    }

    async fn revoke_session(&self, token_value: &str) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens SET revoked = TRUE
            WHERE token_value = $1 AND expires_at > NOW() AND revoked = FALSE
            "#,
        )
        .bind(token_value)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("refresh token"));
        }
        Ok(())
    }

    async fn revoke_account_sessions(&self, account_id: Ulid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked = TRUE WHERE account_id = $1 AND revoked = FALSE",
        )
        .bind(Uuid::from(account_id))
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl GrantReader for PgStore {
    async fn effective_permissions(&self, account_id: Ulid) -> Result<Listing<String>> {
        let urls: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT p.url
            FROM account_roles ar
            JOIN role_permissions rp ON rp.role_id = ar.role_id
            JOIN permissions p ON p.id = rp.permission_id
            WHERE ar.account_id = $1
            ORDER BY p.url
            "#,
        )
        .bind(Uuid::from(account_id))
        .fetch_all(&self.db)
        .await?;

        Ok(Listing::from(urls))
    }
}
