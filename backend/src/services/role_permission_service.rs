//! Role-permission graph service.

use std::sync::Arc;

use tracing::info;
use ulid::Ulid;

use crate::error::{AppError, Result};
use crate::models::{Listing, Permission, Role, RolePermission};
use crate::store::{RolePermissionReader, RolePermissionWriter};

pub struct RolePermissionService {
    reader: Arc<dyn RolePermissionReader>,
    writer: Arc<dyn RolePermissionWriter>,
}

impl RolePermissionService {
    pub fn new(reader: Arc<dyn RolePermissionReader>, writer: Arc<dyn RolePermissionWriter>) -> Self {
        Self { reader, writer }
    }

    pub async fn permissions_for_role(&self, role_id: Ulid) -> Result<Listing<Permission>> {
        self.reader.permissions_for_role(role_id).await
    }

    pub async fn roles_for_permission(&self, permission_id: Ulid) -> Result<Listing<Role>> {
        self.reader.roles_for_permission(permission_id).await
    }

    pub async fn find(&self, role_id: Ulid, permission_id: Ulid) -> Result<RolePermission> {
        self.reader.find_role_permission(role_id, permission_id).await
    }

    pub async fn assign_permission(&self, role_id: Ulid, permission_id: Ulid) -> Result<RolePermission> {
        match self.reader.find_role_permission(role_id, permission_id).await {
            Ok(_) => return Err(AppError::AlreadyAssigned("role permission".into())),
            Err(AppError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }
        let assigned = self.writer.assign_permission(role_id, permission_id).await?;
        info!(role_id = %role_id, permission_id = %permission_id, "permission assigned");
        Ok(assigned)
    }

    /// Remove a permission and revoke the sessions of every account holding
    /// the role, since their grants may still list it.
    pub async fn remove_permission(&self, role_id: Ulid, permission_id: Ulid) -> Result<()> {
        let revoked = self.writer.remove_permission(role_id, permission_id).await?;
        info!(
            role_id = %role_id,
            permission_id = %permission_id,
            sessions_revoked = revoked,
            "permission removed"
        );
        Ok(())
    }
}
