//! Storage capabilities.
//!
//! Each trait covers one narrow capability so services depend only on what
//! they use. [`postgres::PgStore`] and [`memory::MemoryStore`] implement all
//! of them with the same semantics: unique emails and permission URLs,
//! unique association pairs, cascading deletes, and refresh tokens that only
//! count as live while `expires_at > now AND revoked = false`.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use ulid::Ulid;

use crate::error::Result;
use crate::models::{Account, AccountRole, Listing, Permission, RefreshToken, Role, RolePermission};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait AccountReader: Send + Sync {
    /// Signals `NotFound` when no account has this id.
    async fn find_account(&self, id: Ulid) -> Result<Account>;

    /// Signals `NotFound` when no account has this email.
    async fn find_account_by_email(&self, email: &str) -> Result<Account>;

    async fn list_accounts(&self) -> Result<Listing<Account>>;
}

#[async_trait]
pub trait AccountWriter: Send + Sync {
    /// Insert, or update the password hash of an existing id. A clash on
    /// email signals `DuplicateEmail`.
    async fn save_account(&self, account: &Account) -> Result<()>;

    /// Delete the account together with its role assignments and sessions.
    async fn delete_account(&self, id: Ulid) -> Result<()>;
}

#[async_trait]
pub trait PermissionReader: Send + Sync {
    async fn find_permission(&self, id: Ulid) -> Result<Permission>;

    async fn list_permissions(&self) -> Result<Listing<Permission>>;
}

#[async_trait]
pub trait PermissionWriter: Send + Sync {
    /// Insert, or update name, description and url. A clash on url signals
    /// `AlreadyExists`.
    async fn save_permission(&self, permission: &Permission) -> Result<()>;

    /// Delete the permission and its role assignments, revoking the sessions
    /// of every account that reached it. Returns the number of sessions revoked.
    async fn delete_permission(&self, id: Ulid) -> Result<u64>;
}

#[async_trait]
pub trait RoleReader: Send + Sync {
    async fn find_role(&self, id: Ulid) -> Result<Role>;

    async fn list_roles(&self) -> Result<Listing<Role>>;
}

#[async_trait]
pub trait RoleWriter: Send + Sync {
    async fn save_role(&self, role: &Role) -> Result<()>;

    /// Delete the role and both kinds of assignment, revoking the sessions of
    /// its holders. Returns the number of sessions revoked.
    async fn delete_role(&self, id: Ulid) -> Result<u64>;
}

#[async_trait]
pub trait RolePermissionReader: Send + Sync {
    async fn permissions_for_role(&self, role_id: Ulid) -> Result<Listing<Permission>>;

    async fn roles_for_permission(&self, permission_id: Ulid) -> Result<Listing<Role>>;

    async fn find_role_permission(&self, role_id: Ulid, permission_id: Ulid) -> Result<RolePermission>;
}

#[async_trait]
pub trait RolePermissionWriter: Send + Sync {
    /// `AlreadyAssigned` if the pair exists, `NotFound` if either side does not.
    async fn assign_permission(&self, role_id: Ulid, permission_id: Ulid) -> Result<RolePermission>;

    /// Remove the pair and revoke the sessions of every holder of the role.
    /// Returns the number of sessions revoked.
    async fn remove_permission(&self, role_id: Ulid, permission_id: Ulid) -> Result<u64>;
}

#[async_trait]
pub trait AccountRoleReader: Send + Sync {
    async fn roles_for_account(&self, account_id: Ulid) -> Result<Listing<Role>>;

    async fn accounts_for_role(&self, role_id: Ulid) -> Result<Listing<Account>>;

    async fn find_account_role(&self, account_id: Ulid, role_id: Ulid) -> Result<AccountRole>;
}

#[async_trait]
pub trait AccountRoleWriter: Send + Sync {
    /// `AlreadyAssigned` if the pair exists, `NotFound` if either side does not.
    async fn assign_role(&self, account_id: Ulid, role_id: Ulid) -> Result<AccountRole>;

    /// Remove the pair and revoke the account's sessions. Returns the number
    /// of sessions revoked.
    async fn remove_role(&self, account_id: Ulid, role_id: Ulid) -> Result<u64>;
}

#[async_trait]
pub trait SessionReader: Send + Sync {
    /// The live session holding `token_value`, or `NotFound`.
    async fn find_live_session(&self, token_value: &str) -> Result<RefreshToken>;

    async fn live_session_for_account(&self, account_id: Ulid) -> Result<Option<RefreshToken>>;
}

#[async_trait]
pub trait SessionWriter: Send + Sync {
    /// Persist a new session. Expired rows for the account are retired first;
    /// a remaining live row signals `AlreadyLoggedIn`.
    async fn open_session(&self, session: &RefreshToken) -> Result<()>;

    /// Revoke the live session holding `token_value`, or signal `NotFound`.
    async fn revoke_session(&self, token_value: &str) -> Result<()>;

    async fn revoke_account_sessions(&self, account_id: Ulid) -> Result<u64>;
}

#[async_trait]
pub trait GrantReader: Send + Sync {
    /// Distinct permission URLs reachable from the account through its roles,
    /// sorted. Empty when the account holds no roles.
    async fn effective_permissions(&self, account_id: Ulid) -> Result<Listing<String>>;
}

/// Every capability, as handed to the service constructors.
#[derive(Clone)]
pub struct Stores {
    pub account_reader: Arc<dyn AccountReader>,
    pub account_writer: Arc<dyn AccountWriter>,
    pub permission_reader: Arc<dyn PermissionReader>,
    pub permission_writer: Arc<dyn PermissionWriter>,
    pub role_reader: Arc<dyn RoleReader>,
    pub role_writer: Arc<dyn RoleWriter>,
    pub role_permission_reader: Arc<dyn RolePermissionReader>,
    pub role_permission_writer: Arc<dyn RolePermissionWriter>,
    pub account_role_reader: Arc<dyn AccountRoleReader>,
    pub account_role_writer: Arc<dyn AccountRoleWriter>,
    pub session_reader: Arc<dyn SessionReader>,
    pub session_writer: Arc<dyn SessionWriter>,
    pub grant_reader: Arc<dyn GrantReader>,
}

impl Stores {
    /// Hand out one backend for every capability.
    pub fn from_backend<S>(backend: Arc<S>) -> Self
    where
        S: AccountReader
            + AccountWriter
            + PermissionReader
            + PermissionWriter
            + RoleReader
            + RoleWriter
            + RolePermissionReader
            + RolePermissionWriter
            + AccountRoleReader
            + AccountRoleWriter
            + SessionReader
            + SessionWriter
            + GrantReader
            + 'static,
    {
        Self {
            account_reader: backend.clone(),
            account_writer: backend.clone(),
            permission_reader: backend.clone(),
            permission_writer: backend.clone(),
            role_reader: backend.clone(),
            role_writer: backend.clone(),
            role_permission_reader: backend.clone(),
            role_permission_writer: backend.clone(),
            account_role_reader: backend.clone(),
            account_role_writer: backend.clone(),
            session_reader: backend.clone(),
            session_writer: backend.clone(),
            grant_reader: backend,
        }
    }
}
