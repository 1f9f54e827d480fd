//! Role-permission assignment handlers.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use validator::Validate;

use crate::api::extract::{parse_id, IdPath, ValidatedJson};
use crate::api::response::{DataResponse, MessageResponse};
use crate::api::SharedState;
use crate::error::Result;
use crate::models::{Permission, Role, RolePermission};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", post(assign_permission).delete(remove_permission))
        .route("/{id}/permission", get(permissions_for_role))
        .route("/{id}/role", get(roles_for_permission))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RolePermissionRequest {
    #[validate(length(min = 1))]
    pub role_id: String,
    #[validate(length(min = 1))]
    pub permission_id: String,
}

/// Permissions assigned to the role `{id}`
pub async fn permissions_for_role(
    State(state): State<SharedState>,
    IdPath(role_id): IdPath,
) -> Result<Json<DataResponse<Vec<Permission>>>> {
    let permissions = state
        .services
        .role_permissions
        .permissions_for_role(role_id)
        .await?;
    Ok(Json(permissions.into()))
}

/// Roles that carry the permission `{id}`
pub async fn roles_for_permission(
    State(state): State<SharedState>,
    IdPath(permission_id): IdPath,
) -> Result<Json<DataResponse<Vec<Role>>>> {
    let roles = state
        .services
        .role_permissions
        .roles_for_permission(permission_id)
        .await?;
    Ok(Json(roles.into()))
}

pub async fn assign_permission(
    State(state): State<SharedState>,
    ValidatedJson(payload): ValidatedJson<RolePermissionRequest>,
) -> Result<(StatusCode, Json<DataResponse<RolePermission>>)> {
    let role_id = parse_id(&payload.role_id)?;
    let permission_id = parse_id(&payload.permission_id)?;
    let assigned = state
        .services
        .role_permissions
        .assign_permission(role_id, permission_id)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(assigned))))
}

pub async fn remove_permission(
    State(state): State<SharedState>,
    ValidatedJson(payload): ValidatedJson<RolePermissionRequest>,
) -> Result<Json<MessageResponse>> {
    let role_id = parse_id(&payload.role_id)?;
    let permission_id = parse_id(&payload.permission_id)?;
    state
        .services
        .role_permissions
        .remove_permission(role_id, permission_id)
        .await?;
    Ok(Json(MessageResponse::new("success remove permission")))
}
