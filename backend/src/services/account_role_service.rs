//! Account-role graph service.

use std::sync::Arc;

use tracing::info;
use ulid::Ulid;

use crate::error::{AppError, Result};
use crate::models::{Account, AccountRole, Listing, Role};
use crate::store::{AccountRoleReader, AccountRoleWriter};

pub struct AccountRoleService {
    reader: Arc<dyn AccountRoleReader>,
    writer: Arc<dyn AccountRoleWriter>,
}

impl AccountRoleService {
    pub fn new(reader: Arc<dyn AccountRoleReader>, writer: Arc<dyn AccountRoleWriter>) -> Self {
        Self { reader, writer }
    }

    pub async fn roles_for_account(&self, account_id: Ulid) -> Result<Listing<Role>> {
        self.reader.roles_for_account(account_id).await
    }

    pub async fn accounts_for_role(&self, role_id: Ulid) -> Result<Listing<Account>> {
        self.reader.accounts_for_role(role_id).await
    }

    pub async fn find(&self, account_id: Ulid, role_id: Ulid) -> Result<AccountRole> {
        self.reader.find_account_role(account_id, role_id).await
    }

    /// Assign a role. The store's unique pair backs up the lookup, so a
    /// concurrent duplicate also signals `AlreadyAssigned`.
    pub async fn assign_role(&self, account_id: Ulid, role_id: Ulid) -> Result<AccountRole> {
        match self.reader.find_account_role(account_id, role_id).await {
            Ok(_) => return Err(AppError::AlreadyAssigned("account role".into())),
            Err(AppError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }
        let assigned = self.writer.assign_role(account_id, role_id).await?;
        info!(account_id = %account_id, role_id = %role_id, "role assigned");
        Ok(assigned)
    }

    /// Remove a role and revoke the account's sessions.
    pub async fn remove_role(&self, account_id: Ulid, role_id: Ulid) -> Result<()> {
        let revoked = self.writer.remove_role(account_id, role_id).await?;
        info!(
            account_id = %account_id,
            role_id = %role_id,
            sessions_revoked = revoked,
            "role removed"
        );
        Ok(())
    }
}
