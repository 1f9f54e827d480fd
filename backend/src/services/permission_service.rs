//! Permission catalog service.

use std::sync::Arc;

use tracing::info;
use ulid::Ulid;

use crate::error::Result;
use crate::models::{Listing, Permission};
use crate::store::{PermissionReader, PermissionWriter};

/// Mutable permission fields
#[derive(Debug, Clone)]
pub struct PermissionInput {
    pub name: String,
    pub description: String,
    pub url: String,
}

pub struct PermissionService {
    reader: Arc<dyn PermissionReader>,
    writer: Arc<dyn PermissionWriter>,
}

impl PermissionService {
    pub fn new(reader: Arc<dyn PermissionReader>, writer: Arc<dyn PermissionWriter>) -> Self {
        Self { reader, writer }
    }

    pub async fn create_permission(&self, input: PermissionInput) -> Result<Permission> {
        let permission = Permission::new(input.name, input.description, input.url);
        self.writer.save_permission(&permission).await?;
        info!(permission_id = %permission.id, url = %permission.url, "permission created");
        Ok(permission)
    }

    pub async fn edit_permission(&self, id: Ulid, input: PermissionInput) -> Result<Permission> {
        let mut permission = self.reader.find_permission(id).await?;
        permission.name = input.name;
        permission.description = input.description;
        permission.url = input.url;
        self.writer.save_permission(&permission).await?;
        info!(permission_id = %id, "permission updated");
        Ok(permission)
    }

    /// Delete the permission and its assignments; holders must log in again.
    pub async fn delete_permission(&self, id: Ulid) -> Result<()> {
        let revoked = self.writer.delete_permission(id).await?;
        info!(permission_id = %id, sessions_revoked = revoked, "permission deleted");
        Ok(())
    }

    pub async fn get_permission(&self, id: Ulid) -> Result<Permission> {
        self.reader.find_permission(id).await
    }

    pub async fn list_permissions(&self) -> Result<Listing<Permission>> {
        self.reader.list_permissions().await
    }
}
