//! Account-role assignment handlers.

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
use crate::models::{Account, AccountRole, Role};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", post(assign_role).delete(remove_role))
        .route("/{id}/role", get(roles_for_account))
        .route("/{id}/account", get(accounts_for_role))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AccountRoleRequest {
    #[validate(length(min = 1))]
    pub account_id: String,
    #[validate(length(min = 1))]
    pub role_id: String,
}

/// Roles assigned to the account `{id}`
pub async fn roles_for_account(
    State(state): State<SharedState>,
    IdPath(account_id): IdPath,
) -> Result<Json<DataResponse<Vec<Role>>>> {
    let roles = state
        .services
        .account_roles
        .roles_for_account(account_id)
        .await?;
    Ok(Json(roles.into()))
}

/// Accounts holding the role `{id}`
pub async fn accounts_for_role(
    State(state): State<SharedState>,
    IdPath(role_id): IdPath,
) -> Result<Json<DataResponse<Vec<Account>>>> {
    let accounts = state
        .services
        .account_roles
        .accounts_for_role(role_id)
        .await?;
    Ok(Json(accounts.into()))
}

pub async fn assign_role(
    State(state): State<SharedState>,
    ValidatedJson(payload): ValidatedJson<AccountRoleRequest>,
) -> Result<(StatusCode, Json<DataResponse<AccountRole>>)> {
    let account_id = parse_id(&payload.account_id)?;
    let role_id = parse_id(&payload.role_id)?;
    let assigned = state
        .services
        .account_roles
        .assign_role(account_id, role_id)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(assigned))))
}

pub async fn remove_role(
    State(state): State<SharedState>,
    ValidatedJson(payload): ValidatedJson<AccountRoleRequest>,
) -> Result<Json<MessageResponse>> {
    let account_id = parse_id(&payload.account_id)?;
    let role_id = parse_id(&payload.role_id)?;
    state
        .services
        .account_roles
        .remove_role(account_id, role_id)
        .await?;
    Ok(Json(MessageResponse::new("success remove role")))
}
