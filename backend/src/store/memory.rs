//! In-process store.
//!
//! Mirrors the Postgres schema: unique emails and permission URLs, unique
//! association pairs, cascading deletes and the single live session per
//! account. Each operation takes the write lock once, so multi-step writes
//! are atomic.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use ulid::Ulid;

use super::{
    AccountReader, AccountRoleReader, AccountRoleWriter, AccountWriter, GrantReader,
    PermissionReader, PermissionWriter, RolePermissionReader, RolePermissionWriter, RoleReader,
    RoleWriter, SessionReader, SessionWriter,
};
use crate::error::{AppError, Result};
use crate::models::{Account, AccountRole, Listing, Permission, RefreshToken, Role, RolePermission};

#[derive(Default)]
struct Tables {
    accounts: BTreeMap<Ulid, Account>,
    permissions: BTreeMap<Ulid, Permission>,
    roles: BTreeMap<Ulid, Role>,
    /// (role_id, permission_id)
    role_permissions: BTreeSet<(Ulid, Ulid)>,
    /// (account_id, role_id)
    account_roles: BTreeSet<(Ulid, Ulid)>,
    sessions: Vec<RefreshToken>,
}

impl Tables {
    fn revoke_where<F: Fn(&RefreshToken) -> bool>(&mut self, pred: F) -> u64 {
        let mut revoked = 0;
        for session in self.sessions.iter_mut().filter(|s| !s.revoked) {
            if pred(session) {
                session.revoked = true;
                revoked += 1;
            }
        }
        revoked
    }

    fn holders_of_role(&self, role_id: Ulid) -> BTreeSet<Ulid> {
        self.account_roles
            .iter()
            .filter(|(_, r)| *r == role_id)
            .map(|(a, _)| *a)
            .collect()
    }

    fn revoke_accounts(&mut self, accounts: &BTreeSet<Ulid>) -> u64 {
        self.revoke_where(|s| accounts.contains(&s.account_id))
    }
}

/// `RwLock`-guarded implementation of every store capability
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every session row ever opened for the account, live or not.
    pub async fn sessions_of(&self, account_id: Ulid) -> Vec<RefreshToken> {
        let tables = self.tables.read().await;
        tables
            .sessions
            .iter()
            .filter(|s| s.account_id == account_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl AccountReader for MemoryStore {
    async fn find_account(&self, id: Ulid) -> Result<Account> {
        let tables = self.tables.read().await;
        tables
            .accounts
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found("account"))
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Account> {
        let tables = self.tables.read().await;
        tables
            .accounts
            .values()
            .find(|a| a.email == email)
            .cloned()
            .ok_or_else(|| AppError::not_found("account"))
    }

    async fn list_accounts(&self) -> Result<Listing<Account>> {
        let tables = self.tables.read().await;
        Ok(Listing::from(
            tables.accounts.values().cloned().collect::<Vec<_>>(),
        ))
    }
}

#[async_trait]
impl AccountWriter for MemoryStore {
    async fn save_account(&self, account: &Account) -> Result<()> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.accounts.get_mut(&account.id) {
            existing.password = account.password.clone();
            return Ok(());
        }
        if tables.accounts.values().any(|a| a.email == account.email) {
            return Err(AppError::DuplicateEmail(account.email.clone()));
        }
        tables.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn delete_account(&self, id: Ulid) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.accounts.remove(&id).is_none() {
            return Err(AppError::not_found("account"));
        }
        tables.account_roles.retain(|(a, _)| *a != id);
        tables.sessions.retain(|s| s.account_id != id);
        Ok(())
    }
}

#[async_trait]
impl PermissionReader for MemoryStore {
    async fn find_permission(&self, id: Ulid) -> Result<Permission> {
        let tables = self.tables.read().await;
        tables
            .permissions
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found("permission"))
    }

    async fn list_permissions(&self) -> Result<Listing<Permission>> {
        let tables = self.tables.read().await;
        Ok(Listing::from(
            tables.permissions.values().cloned().collect::<Vec<_>>(),
        ))
    }
}

#[async_trait]
impl PermissionWriter for MemoryStore {
    async fn save_permission(&self, permission: &Permission) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables
            .permissions
            .values()
            .any(|p| p.url == permission.url && p.id != permission.id)
        {
            return Err(AppError::AlreadyExists(format!(
                "permission url {}",
                permission.url
            )));
        }
        match tables.permissions.get_mut(&permission.id) {
            Some(existing) => {
                existing.name = permission.name.clone();
                existing.description = permission.description.clone();
                existing.url = permission.url.clone();
            }
            None => {
                tables.permissions.insert(permission.id, permission.clone());
            }
        }
        Ok(())
    }

    async fn delete_permission(&self, id: Ulid) -> Result<u64> {
        let mut tables = self.tables.write().await;
        if tables.permissions.remove(&id).is_none() {
            return Err(AppError::not_found("permission"));
        }
        let roles: Vec<Ulid> = tables
            .role_permissions
            .iter()
            .filter(|(_, p)| *p == id)
            .map(|(r, _)| *r)
            .collect();
        let mut holders = BTreeSet::new();
        for role_id in roles {
            holders.extend(tables.holders_of_role(role_id));
        }
        tables.role_permissions.retain(|(_, p)| *p != id);
        Ok(tables.revoke_accounts(&holders))
    }
}

#[async_trait]
impl RoleReader for MemoryStore {
    async fn find_role(&self, id: Ulid) -> Result<Role> {
        let tables = self.tables.read().await;
        tables
            .roles
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found("role"))
    }

    async fn list_roles(&self) -> Result<Listing<Role>> {
        let tables = self.tables.read().await;
        Ok(Listing::from(tables.roles.values().cloned().collect::<Vec<_>>()))
    }
}

#[async_trait]
impl RoleWriter for MemoryStore {
    async fn save_role(&self, role: &Role) -> Result<()> {
        let mut tables = self.tables.write().await;
        match tables.roles.get_mut(&role.id) {
            Some(existing) => {
                existing.name = role.name.clone();
                existing.description = role.description.clone();
            }
            None => {
                tables.roles.insert(role.id, role.clone());
            }
        }
        Ok(())
    }

    async fn delete_role(&self, id: Ulid) -> Result<u64> {
        let mut tables = self.tables.write().await;
        if tables.roles.remove(&id).is_none() {
            return Err(AppError::not_found("role"));
        }
        let holders = tables.holders_of_role(id);
        tables.account_roles.retain(|(_, r)| *r != id);
        tables.role_permissions.retain(|(r, _)| *r != id);
        Ok(tables.revoke_accounts(&holders))
    }
}

#[async_trait]
impl RolePermissionReader for MemoryStore {
    async fn permissions_for_role(&self, role_id: Ulid) -> Result<Listing<Permission>> {
        let tables = self.tables.read().await;
        let permissions: Vec<Permission> = tables
            .role_permissions
            .iter()
            .filter(|(r, _)| *r == role_id)
            .filter_map(|(_, p)| tables.permissions.get(p).cloned())
            .collect();
        Ok(Listing::from(permissions))
    }

    async fn roles_for_permission(&self, permission_id: Ulid) -> Result<Listing<Role>> {
        let tables = self.tables.read().await;
        let roles: Vec<Role> = tables
            .role_permissions
            .iter()
            .filter(|(_, p)| *p == permission_id)
            .filter_map(|(r, _)| tables.roles.get(r).cloned())
            .collect();
        Ok(Listing::from(roles))
    }

    async fn find_role_permission(&self, role_id: Ulid, permission_id: Ulid) -> Result<RolePermission> {
        let tables = self.tables.read().await;
        if tables.role_permissions.contains(&(role_id, permission_id)) {
            Ok(RolePermission {
                role_id,
                permission_id,
            })
        } else {
            Err(AppError::not_found("role permission"))
        }
    }
}

#[async_trait]
impl RolePermissionWriter for MemoryStore {
    async fn assign_permission(&self, role_id: Ulid, permission_id: Ulid) -> Result<RolePermission> {
        let mut tables = self.tables.write().await;
        if !tables.roles.contains_key(&role_id) || !tables.permissions.contains_key(&permission_id) {
            return Err(AppError::not_found("role or permission"));
        }
        if !tables.role_permissions.insert((role_id, permission_id)) {
            return Err(AppError::AlreadyAssigned("role permission".into()));
        }
        Ok(RolePermission {
            role_id,
            permission_id,
        })
    }

    async fn remove_permission(&self, role_id: Ulid, permission_id: Ulid) -> Result<u64> {
        let mut tables = self.tables.write().await;
        if !tables.role_permissions.remove(&(role_id, permission_id)) {
            return Err(AppError::not_found("role permission"));
        }
        let holders = tables.holders_of_role(role_id);
        Ok(tables.revoke_accounts(&holders))
    }
}

#[async_trait]
impl AccountRoleReader for MemoryStore {
    async fn roles_for_account(&self, account_id: Ulid) -> Result<Listing<Role>> {
        let tables = self.tables.read().await;
        let roles: Vec<Role> = tables
            .account_roles
            .iter()
            .filter(|(a, _)| *a == account_id)
            .filter_map(|(_, r)| tables.roles.get(r).cloned())
            .collect();
        Ok(Listing::from(roles))
    }

    async fn accounts_for_role(&self, role_id: Ulid) -> Result<Listing<Account>> {
        let tables = self.tables.read().await;
        let mut accounts: Vec<Account> = tables
            .account_roles
            .iter()
            .filter(|(_, r)| *r == role_id)
            .filter_map(|(a, _)| tables.accounts.get(a).cloned())
            .collect();
        accounts.sort_by_key(|a| a.id);
        Ok(Listing::from(accounts))
    }

    async fn find_account_role(&self, account_id: Ulid, role_id: Ulid) -> Result<AccountRole> {
        let tables = self.tables.read().await;
        if tables.account_roles.contains(&(account_id, role_id)) {
            Ok(AccountRole {
                account_id,
                role_id,
            })
        } else {
            Err(AppError::not_found("account role"))
        }
    }
}

#[async_trait]
impl AccountRoleWriter for MemoryStore {
    async fn assign_role(&self, account_id: Ulid, role_id: Ulid) -> Result<AccountRole> {
        let mut tables = self.tables.write().await;
        if !tables.accounts.contains_key(&account_id) || !tables.roles.contains_key(&role_id) {
            return Err(AppError::not_found("account or role"));
        }
        if !tables.account_roles.insert((account_id, role_id)) {
            return Err(AppError::AlreadyAssigned("account role".into()));
        }
        Ok(AccountRole {
            account_id,
            role_id,
        })
    }

    async fn remove_role(&self, account_id: Ulid, role_id: Ulid) -> Result<u64> {
        let mut tables = self.tables.write().await;
        if !tables.account_roles.remove(&(account_id, role_id)) {
            return Err(AppError::not_found("account role"));
        }
        Ok(tables.revoke_where(|s| s.account_id == account_id))
    }
}

#[async_trait]
impl SessionReader for MemoryStore {
    async fn find_live_session(&self, token_value: &str) -> Result<RefreshToken> {
        let now = Utc::now();
        let tables = self.tables.read().await;
        tables
            .sessions
            .iter()
            .find(|s| s.token_value == token_value && s.is_live_at(now))
            .cloned()
            .ok_or_else(|| AppError::not_found("refresh token"))
    }

    async fn live_session_for_account(&self, account_id: Ulid) -> Result<Option<RefreshToken>> {
        let now = Utc::now();
        let tables = self.tables.read().await;
        Ok(tables
            .sessions
            .iter()
            .find(|s| s.account_id == account_id && s.is_live_at(now))
            .cloned())
    }
}

#[async_trait]
impl SessionWriter for MemoryStore {
    async fn open_session(&self, session: &RefreshToken) -> Result<()> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        if !tables.accounts.contains_key(&session.account_id) {
            return Err(AppError::not_found("account"));
        }
        tables.revoke_where(|s| s.account_id == session.account_id && s.expires_at <= now);
        if tables
            .sessions
            .iter()
            .any(|s| s.account_id == session.account_id && !s.revoked)
        {
            return Err(AppError::AlreadyLoggedIn);
        }
        if tables
            .sessions
            .iter()
            .any(|s| s.token_value == session.token_value)
        {
            return Err(AppError::AlreadyExists("refresh token".into()));
        }
        tables.sessions.push(session.clone());
        Ok(())
    }

    async fn revoke_session(&self, token_value: &str) -> Result<()> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        match tables
            .sessions
            .iter_mut()
            .find(|s| s.token_value == token_value && s.is_live_at(now))
        {
            Some(session) => {
                session.revoked = true;
                Ok(())
            }
            None => Err(AppError::not_found("refresh token")),
        }
    }

    async fn revoke_account_sessions(&self, account_id: Ulid) -> Result<u64> {
        let mut tables = self.tables.write().await;
        Ok(tables.revoke_where(|s| s.account_id == account_id))
    }
}

#[async_trait]
impl GrantReader for MemoryStore {
    async fn effective_permissions(&self, account_id: Ulid) -> Result<Listing<String>> {
        let tables = self.tables.read().await;
        let mut urls = BTreeSet::new();
        for (_, role_id) in tables.account_roles.iter().filter(|(a, _)| *a == account_id) {
            for (_, permission_id) in tables.role_permissions.iter().filter(|(r, _)| r == role_id) {
                if let Some(permission) = tables.permissions.get(permission_id) {
                    urls.insert(permission.url.clone());
                }
            }
        }
        Ok(Listing::from(urls.into_iter().collect::<Vec<_>>()))
    }
}
