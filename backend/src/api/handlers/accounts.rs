//! Account handlers.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use validator::Validate;

use crate::api::extract::{IdPath, ValidatedJson};
use crate::api::response::{DataResponse, MessageResponse};
use crate::api::SharedState;
use crate::error::Result;
use crate::models::Account;

/// Registration, open to anonymous callers
pub fn public_router() -> Router<SharedState> {
    Router::new().route("/", post(create_account))
}

/// Routes behind the access token middleware
pub fn protected_router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_accounts))
        .route("/{id}", get(get_account).delete(delete_account))
        .route("/password/{id}", patch(update_password))
        .route("/{id}/sessions", delete(revoke_sessions))
}

#[derive(Deserialize, Validate)]
pub struct CreateAccountRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 32))]
    pub password: String,
}

redacted_debug!(CreateAccountRequest {
    show email,
    redact password,
});

#[derive(Deserialize, Validate)]
pub struct UpdatePasswordRequest {
    #[validate(length(min = 8, max = 32))]
    pub password: String,
}

pub async fn create_account(
    State(state): State<SharedState>,
    ValidatedJson(payload): ValidatedJson<CreateAccountRequest>,
) -> Result<(StatusCode, Json<DataResponse<Account>>)> {
    let account = state
        .services
        .accounts
        .create_account(&payload.email, &payload.password)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(account))))
}

pub async fn list_accounts(
    State(state): State<SharedState>,
) -> Result<Json<DataResponse<Vec<Account>>>> {
    let accounts = state.services.accounts.list_accounts().await?;
    Ok(Json(accounts.into()))
}

pub async fn get_account(
    State(state): State<SharedState>,
    IdPath(id): IdPath,
) -> Result<Json<DataResponse<Account>>> {
    let account = state.services.accounts.get_account(id).await?;
    Ok(Json(DataResponse::new(account)))
}

pub async fn update_password(
    State(state): State<SharedState>,
    IdPath(id): IdPath,
    ValidatedJson(payload): ValidatedJson<UpdatePasswordRequest>,
) -> Result<Json<MessageResponse>> {
    state
        .services
        .accounts
        .edit_password(id, &payload.password)
        .await?;
    Ok(Json(MessageResponse::new("success update password")))
}

pub async fn delete_account(
    State(state): State<SharedState>,
    IdPath(id): IdPath,
) -> Result<Json<MessageResponse>> {
    state.services.accounts.delete_account(id).await?;
    Ok(Json(MessageResponse::new("success delete account")))
}

/// Log the account out everywhere by revoking its live sessions
pub async fn revoke_sessions(
    State(state): State<SharedState>,
    IdPath(id): IdPath,
) -> Result<Json<MessageResponse>> {
    state.services.sessions.revoke_sessions(id).await?;
    Ok(Json(MessageResponse::new("success revoke sessions")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_account_validation() {
        let ok = CreateAccountRequest {
            email: "a@x.com".into(),
            password: "password123".into(),
        };
        assert!(ok.validate().is_ok());

        let bad_email = CreateAccountRequest {
            email: "not-an-email".into(),
            password: "password123".into(),
        };
        assert!(bad_email.validate().is_err());

        let short = CreateAccountRequest {
            email: "a@x.com".into(),
            password: "short".into(),
        };
        assert!(short.validate().is_err());

        let long = CreateAccountRequest {
            email: "a@x.com".into(),
            password: "x".repeat(33),
        };
        assert!(long.validate().is_err());
    }
}
