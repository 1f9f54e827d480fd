//! Permission and role catalogs.

use async_trait::async_trait;
use ulid::Ulid;
use uuid::Uuid;

use super::{violation, PermissionRow, PgStore, RoleRow, Violation};
use crate::error::{AppError, Result};
use crate::models::{Listing, Permission, Role};
use crate::store::{PermissionReader, PermissionWriter, RoleReader, RoleWriter};

#[async_trait]
impl PermissionReader for PgStore {
    async fn find_permission(&self, id: Ulid) -> Result<Permission> {
        let row: Option<PermissionRow> = sqlx::query_as(
            "SELECT id, name, description, url, created_at FROM permissions WHERE id = $1",
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.db)
        .await?;

        row.map(Permission::from)
            .ok_or_else(|| AppError::not_found("permission"))
    }

    async fn list_permissions(&self) -> Result<Listing<Permission>> {
        let rows: Vec<PermissionRow> = sqlx::query_as(
            "SELECT id, name, description, url, created_at FROM permissions ORDER BY id",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(Listing::from(
            rows.into_iter().map(Permission::from).collect::<Vec<_>>(),
        ))
    }
}

#[async_trait]
impl PermissionWriter for PgStore {
    async fn save_permission(&self, permission: &Permission) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO permissions (id, name, description, url, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
                SET name = EXCLUDED.name,
                    description = EXCLUDED.description,
                    url = EXCLUDED.url
            "#,
        )
        .bind(Uuid::from(permission.id))
        .bind(&permission.name)
        .bind(&permission.description)
        .bind(&permission.url)
        .bind(permission.created_at)
        .execute(&self.db)
        .await
        .map_err(|e| match violation(&e) {
            Violation::Unique(_) => {
                AppError::AlreadyExists(format!("permission url {}", permission.url))
            }
            _ => AppError::Database(e),
        })?;

        Ok(())
    }

    async fn delete_permission(&self, id: Ulid) -> Result<u64> {
        let id = Uuid::from(id);
        let mut tx = self.db.begin().await?;

        let revoked = sqlx::query(
            r#"
            UPDATE refresh_tokens SET revoked = TRUE
            WHERE revoked = FALSE
              AND account_id IN (
                SELECT ar.account_id
                FROM account_roles ar
                JOIN role_permissions rp ON rp.role_id = ar.role_id
                WHERE rp.permission_id = $1
              )
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let deleted = sqlx::query("DELETE FROM permissions WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(AppError::not_found("permission"));
        }

        tx.commit().await?;
        Ok(revoked)
    }
}

#[async_trait]
impl RoleReader for PgStore {
    async fn find_role(&self, id: Ulid) -> Result<Role> {
        let row: Option<RoleRow> = sqlx::query_as(
            "SELECT id, name, description, created_at FROM roles WHERE id = $1",
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.db)
        .await?;

        row.map(Role::from).ok_or_else(|| AppError::not_found("role"))
    }

    async fn list_roles(&self) -> Result<Listing<Role>> {
        let rows: Vec<RoleRow> =
            sqlx::query_as("SELECT id, name, description, created_at FROM roles ORDER BY id")
                .fetch_all(&self.db)
                .await?;

        Ok(Listing::from(rows.into_iter().map(Role::from).collect::<Vec<_>>()))
    }
}

#[async_trait]
impl RoleWriter for PgStore {
    async fn save_role(&self, role: &Role) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO roles (id, name, description, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
                SET name = EXCLUDED.name,
                    description = EXCLUDED.description
            "#,
        )
        .bind(Uuid::from(role.id))
        .bind(&role.name)
        .bind(&role.description)
        .bind(role.created_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn delete_role(&self, id: Ulid) -> Result<u64> {
        let id = Uuid::from(id);
        let mut tx = self.db.begin().await?;

        let revoked = sqlx::query(
            r#"
            UPDATE refresh_tokens SET revoked = TRUE
            WHERE revoked = FALSE
              AND account_id IN (SELECT account_id FROM account_roles WHERE role_id = $1)
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let deleted = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(AppError::not_found("role"));
        }

        tx.commit().await?;
        Ok(revoked)
    }
}
