use async_trait::async_trait;
use ulid::Ulid;
use uuid::Uuid;

use super::{violation, AccountRow, PgStore, Violation};
use crate::error::{AppError, Result};
use crate::models::{Account, Listing};
use crate::store::{AccountReader, AccountWriter};

#[async_trait]
impl AccountReader for PgStore {
    async fn find_account(&self, id: Ulid) -> Result<Account> {
        let row: Option<AccountRow> = sqlx::query_as(
            "SELECT id, email, password, created_at FROM accounts WHERE id = $1",
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.db)
        .await?;

        row.map(Account::from)
            .ok_or_else(|| AppError::not_found("account"))
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Account> {
        let row: Option<AccountRow> = sqlx::query_as(
            "SELECT id, email, password, created_at FROM accounts WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;

        row.map(Account::from)
            .ok_or_else(|| AppError::not_found("account"))
    }

    async fn list_accounts(&self) -> Result<Listing<Account>> {
        let rows: Vec<AccountRow> = sqlx::query_as(
            "SELECT id, email, password, created_at FROM accounts ORDER BY id",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(Listing::from(
            rows.into_iter().map(Account::from).collect::<Vec<_>>(),
        ))
    }
}

#[async_trait]
impl AccountWriter for PgStore {
    async fn save_account(&self, account: &Account) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, email, password, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET password = EXCLUDED.password
            "#,
        )
        .bind(Uuid::from(account.id))
        .bind(&account.email)
        .bind(&account.password)
        .bind(account.created_at)
        .execute(&self.db)
        .await
        .map_err(|e| match violation(&e) {
            Violation::Unique(_) => AppError::DuplicateEmail(account.email.clone()),
            _ => AppError::Database(e),
        })?;

        Ok(())
    }

    async fn delete_account(&self, id: Ulid) -> Result<()> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(Uuid::from(id))
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("account"));
        }
        Ok(())
    }
}
