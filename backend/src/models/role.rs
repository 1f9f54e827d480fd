//! Role models.

use chrono::{DateTime, Utc};
use serde::Serialize;
use ulid::Ulid;

/// Role entity: a reusable bundle of permissions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Role {
    pub id: Ulid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Role {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Ulid::new(),
            name: name.into(),
            description: description.into(),
            created_at: Utc::now(),
        }
    }
}

/// A role together with the URLs of the permissions assigned to it.
#[derive(Debug, Clone, Serialize)]
pub struct RoleDetail {
    pub id: Ulid,
    pub name: String,
    pub description: String,
    pub total_permission: usize,
    pub permissions: Vec<String>,
}

impl RoleDetail {
    pub fn new(role: Role, permissions: Vec<String>) -> Self {
        Self {
            id: role.id,
            name: role.name,
            description: role.description,
            total_permission: permissions.len(),
            permissions,
        }
    }
}

/// Role-permission association row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RolePermission {
    pub role_id: Ulid,
    pub permission_id: Ulid,
}
