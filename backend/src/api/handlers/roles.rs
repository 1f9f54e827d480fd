//! Role catalog handlers.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Deserialize;
use validator::Validate;

use crate::api::extract::{IdPath, ValidatedJson};
use crate::api::response::{DataResponse, MessageResponse};
use crate::api::SharedState;
use crate::error::Result;
use crate::models::{Role, RoleDetail};
use crate::services::role_service::RoleInput;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_roles).post(create_role))
        .route(
            "/{id}",
            get(get_role)
                .put(update_role)
                .patch(update_role)
                .delete(delete_role),
        )
}

#[derive(Debug, Deserialize, Validate)]
pub struct RoleRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl From<RoleRequest> for RoleInput {
    fn from(req: RoleRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
        }
    }
}

pub async fn list_roles(State(state): State<SharedState>) -> Result<Json<DataResponse<Vec<Role>>>> {
    let roles = state.services.roles.list_roles().await?;
    Ok(Json(roles.into()))
}

pub async fn create_role(
    State(state): State<SharedState>,
    ValidatedJson(payload): ValidatedJson<RoleRequest>,
) -> Result<(StatusCode, Json<DataResponse<Role>>)> {
    let role = state.services.roles.create_role(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(role))))
}

/// The role with its permission URLs
pub async fn get_role(
    State(state): State<SharedState>,
    IdPath(id): IdPath,
) -> Result<Json<DataResponse<RoleDetail>>> {
    let role = state.services.roles.get_role(id).await?;
    Ok(Json(DataResponse::new(role)))
}

pub async fn update_role(
    State(state): State<SharedState>,
    IdPath(id): IdPath,
    ValidatedJson(payload): ValidatedJson<RoleRequest>,
) -> Result<Json<DataResponse<Role>>> {
    let role = state.services.roles.edit_role(id, payload.into()).await?;
    Ok(Json(DataResponse::new(role)))
}

pub async fn delete_role(
    State(state): State<SharedState>,
    IdPath(id): IdPath,
) -> Result<Json<MessageResponse>> {
    state.services.roles.delete_role(id).await?;
    Ok(Json(MessageResponse::new("success delete role")))
}
