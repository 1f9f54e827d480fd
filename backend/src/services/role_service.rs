//! Role catalog service.

use std::sync::Arc;

use tracing::info;
use ulid::Ulid;

use crate::error::Result;
use crate::models::{Listing, Role, RoleDetail};
use crate::store::{RolePermissionReader, RoleReader, RoleWriter};

/// Mutable role fields
#[derive(Debug, Clone)]
pub struct RoleInput {
    pub name: String,
    pub description: String,
}

pub struct RoleService {
    reader: Arc<dyn RoleReader>,
    writer: Arc<dyn RoleWriter>,
    permissions: Arc<dyn RolePermissionReader>,
}

impl RoleService {
    pub fn new(
        reader: Arc<dyn RoleReader>,
        writer: Arc<dyn RoleWriter>,
        permissions: Arc<dyn RolePermissionReader>,
    ) -> Self {
        Self {
            reader,
            writer,
            permissions,
        }
    }

    pub async fn create_role(&self, input: RoleInput) -> Result<Role> {
        let role = Role::new(input.name, input.description);
        self.writer.save_role(&role).await?;
        info!(role_id = %role.id, name = %role.name, "role created");
        Ok(role)
    }

    pub async fn edit_role(&self, id: Ulid, input: RoleInput) -> Result<Role> {
        let mut role = self.reader.find_role(id).await?;
        role.name = input.name;
        role.description = input.description;
        self.writer.save_role(&role).await?;
        info!(role_id = %id, "role updated");
        Ok(role)
    }

    /// Delete the role with its assignments; holders must log in again.
    pub async fn delete_role(&self, id: Ulid) -> Result<()> {
        let revoked = self.writer.delete_role(id).await?;
        info!(role_id = %id, sessions_revoked = revoked, "role deleted");
        Ok(())
    }

    /// The role with the URLs of its permissions.
    pub async fn get_role(&self, id: Ulid) -> Result<RoleDetail> {
        let role = self.reader.find_role(id).await?;
        let urls = self
            .permissions
            .permissions_for_role(id)
            .await?
            .data
            .into_iter()
            .map(|p| p.url)
            .collect();
        Ok(RoleDetail::new(role, urls))
    }

    pub async fn list_roles(&self) -> Result<Listing<Role>> {
        self.reader.list_roles().await
    }
}
