//! Account-role and role-permission associations.

use async_trait::async_trait;
use ulid::Ulid;
use uuid::Uuid;

use super::{classify_assignment, AccountRow, PermissionRow, PgStore, RoleRow};
use crate::error::{AppError, Result};
use crate::models::{Account, AccountRole, Listing, Permission, Role, RolePermission};
use crate::store::{
    AccountRoleReader, AccountRoleWriter, RolePermissionReader, RolePermissionWriter,
};

#[async_trait]
impl RolePermissionReader for PgStore {
    async fn permissions_for_role(&self, role_id: Ulid) -> Result<Listing<Permission>> {
        let rows: Vec<PermissionRow> = sqlx::query_as(
            r#"
            SELECT p.id, p.name, p.description, p.url, p.created_at
            FROM permissions p
            JOIN role_permissions rp ON rp.permission_id = p.id
            WHERE rp.role_id = $1
            ORDER BY p.id
            "#,
        )
        .bind(Uuid::from(role_id))
        .fetch_all(&self.db)
        .await?;

        Ok(Listing::from(
            rows.into_iter().map(Permission::from).collect::<Vec<_>>(),
        ))
    }

    async fn roles_for_permission(&self, permission_id: Ulid) -> Result<Listing<Role>> {
        let rows: Vec<RoleRow> = sqlx::query_as(
            r#"
            SELECT r.id, r.name, r.description, r.created_at
            FROM roles r
            JOIN role_permissions rp ON rp.role_id = r.id
            WHERE rp.permission_id = $1
            ORDER BY r.id
            "#,
        )
        .bind(Uuid::from(permission_id))
        .fetch_all(&self.db)
        .await?;

        Ok(Listing::from(rows.into_iter().map(Role::from).collect::<Vec<_>>()))
    }

    async fn find_role_permission(&self, role_id: Ulid, permission_id: Ulid) -> Result<RolePermission> {
        let found: Option<i32> = sqlx::query_scalar(
            "SELECT 1 FROM role_permissions WHERE role_id = $1 AND permission_id = $2",
        )
        .bind(Uuid::from(role_id))
        .bind(Uuid::from(permission_id))
        .fetch_optional(&self.db)
        .await?;

        found
            .map(|_| RolePermission {
                role_id,
                permission_id,
            })
            .ok_or_else(|| AppError::not_found("role permission"))
    }
}

#[async_trait]
impl RolePermissionWriter for PgStore {
    async fn assign_permission(&self, role_id: Ulid, permission_id: Ulid) -> Result<RolePermission> {
        sqlx::query("INSERT INTO role_permissions (role_id, permission_id) VALUES ($1, $2)")
            .bind(Uuid::from(role_id))
            .bind(Uuid::from(permission_id))
            .execute(&self.db)
            .await
            .map_err(|e| classify_assignment(e, "role permission", "role or permission"))?;

        Ok(RolePermission {
            role_id,
            permission_id,
        })
    }

    async fn remove_permission(&self, role_id: Ulid, permission_id: Ulid) -> Result<u64> {
        let role_id = Uuid::from(role_id);
        let mut tx = self.db.begin().await?;

        let deleted =
            sqlx::query("DELETE FROM role_permissions WHERE role_id = $1 AND permission_id = $2")
                .bind(role_id)
                .bind(Uuid::from(permission_id))
                .execute(&mut *tx)
                .await?
                .rows_affected();

        if deleted == 0 {
            return Err(AppError::not_found("role permission"));
        }

        // Every holder of the role carries a grant that may list the permission
        let revoked = sqlx::query(
            r#"
            UPDATE refresh_tokens SET revoked = TRUE
            WHERE revoked = FALSE
              AND account_id IN (SELECT account_id FROM account_roles WHERE role_id = $1)
            "#,
        )
        .bind(role_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;
        Ok(revoked)
    }
}

#[async_trait]
impl AccountRoleReader for PgStore {
    async fn roles_for_account(&self, account_id: Ulid) -> Result<Listing<Role>> {
        let rows: Vec<RoleRow> = sqlx::query_as(
            r#"
            SELECT r.id, r.name, r.description, r.created_at
            FROM roles r
            JOIN account_roles ar ON ar.role_id = r.id
            WHERE ar.account_id = $1
            ORDER BY r.id
            "#,
        )
        .bind(Uuid::from(account_id))
        .fetch_all(&self.db)
        .await?;

        Ok(Listing::from(rows.into_iter().map(Role::from).collect::<Vec<_>>()))
    }

    async fn accounts_for_role(&self, role_id: Ulid) -> Result<Listing<Account>> {
        let rows: Vec<AccountRow> = sqlx::query_as(
            r#"
            SELECT a.id, a.email, a.password, a.created_at
            FROM accounts a
            JOIN account_roles ar ON ar.account_id = a.id
            WHERE ar.role_id = $1
            ORDER BY a.id
            "#,
        )
        .bind(Uuid::from(role_id))
        .fetch_all(&self.db)
        .await?;

        Ok(Listing::from(
            rows.into_iter().map(Account::from).collect::<Vec<_>>(),
        ))
    }

    async fn find_account_role(&self, account_id: Ulid, role_id: Ulid) -> Result<AccountRole> {
        let found: Option<i32> = sqlx::query_scalar(
            "SELECT 1 FROM account_roles WHERE account_id = $1 AND role_id = $2",
        )
        .bind(Uuid::from(account_id))
        .bind(Uuid::from(role_id))
        .fetch_optional(&self.db)
        .await?;

        found
            .map(|_| AccountRole {
                account_id,
                role_id,
            })
            .ok_or_else(|| AppError::not_found("account role"))
    }
}

#[async_trait]
impl AccountRoleWriter for PgStore {
    async fn assign_role(&self, account_id: Ulid, role_id: Ulid) -> Result<AccountRole> {
        sqlx::query("INSERT INTO account_roles (account_id, role_id) VALUES ($1, $2)")
            .bind(Uuid::from(account_id))
            .bind(Uuid::from(role_id))
            .execute(&self.db)
            .await
            .map_err(|e| classify_assignment(e, "account role", "account or role"))?;

        Ok(AccountRole {
            account_id,
            role_id,
        })
    }

    async fn remove_role(&self, account_id: Ulid, role_id: Ulid) -> Result<u64> {
        let account_id = Uuid::from(account_id);
        let mut tx = self.db.begin().await?;

        let deleted = sqlx::query("DELETE FROM account_roles WHERE account_id = $1 AND role_id = $2")
            .bind(account_id)
            .bind(Uuid::from(role_id))
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(AppError::not_found("account role"));
        }

        let revoked = sqlx::query(
            "UPDATE refresh_tokens SET revoked = TRUE WHERE account_id = $1 AND revoked = FALSE",
        )
        .bind(account_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;
        Ok(revoked)
    }
}
