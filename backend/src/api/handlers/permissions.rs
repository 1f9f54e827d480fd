//! Permission catalog handlers.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::api::extract::{IdPath, ValidatedJson};
use crate::api::response::{DataResponse, MessageResponse};
use crate::api::SharedState;
use crate::error::Result;
use crate::models::Permission;
use crate::services::permission_service::PermissionInput;

/// Create permission routes
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_permissions).post(create_permission))
        .route(
            "/{id}",
            get(get_permission)
                .put(update_permission)
                .patch(update_permission)
                .delete(delete_permission),
        )
}

#[derive(Debug, Deserialize, Validate)]
pub struct PermissionRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 1), custom(function = "validate_action_url"))]
    pub url: String,
}

/// Grant entries are comma-joined, so a URL must not contain the delimiter
fn validate_action_url(url: &str) -> std::result::Result<(), ValidationError> {
    if url.contains(',') {
        return Err(ValidationError::new("url_contains_comma"));
    }
    Ok(())
}

impl From<PermissionRequest> for PermissionInput {
    fn from(req: PermissionRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            url: req.url,
        }
    }
}

pub async fn list_permissions(
    State(state): State<SharedState>,
) -> Result<Json<DataResponse<Vec<Permission>>>> {
    let permissions = state.services.permissions.list_permissions().await?;
    Ok(Json(permissions.into()))
}

pub async fn create_permission(
    State(state): State<SharedState>,
    ValidatedJson(payload): ValidatedJson<PermissionRequest>,
) -> Result<(StatusCode, Json<DataResponse<Permission>>)> {
    let permission = state
        .services
        .permissions
        .create_permission(payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(permission))))
}

pub async fn get_permission(
    State(state): State<SharedState>,
    IdPath(id): IdPath,
) -> Result<Json<DataResponse<Permission>>> {
    let permission = state.services.permissions.get_permission(id).await?;
    Ok(Json(DataResponse::new(permission)))
}

pub async fn update_permission(
    State(state): State<SharedState>,
    IdPath(id): IdPath,
    ValidatedJson(payload): ValidatedJson<PermissionRequest>,
) -> Result<Json<DataResponse<Permission>>> {
    let permission = state
        .services
        .permissions
        .edit_permission(id, payload.into())
        .await?;
    Ok(Json(DataResponse::new(permission)))
}

pub async fn delete_permission(
    State(state): State<SharedState>,
    IdPath(id): IdPath,
) -> Result<Json<MessageResponse>> {
    state.services.permissions.delete_permission(id).await?;
    Ok(Json(MessageResponse::new("success delete permission")))
}
