//! Session handlers: login, logout and access token refresh.

use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use cookie::time::{Duration as CookieDuration, OffsetDateTime};
use cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::extract::ValidatedJson;
use crate::api::middleware::auth::{extract_bearer, ExtractedToken};
use crate::api::response::{DataResponse, Meta, MessageResponse};
use crate::api::SharedState;
use crate::error::{AppError, Result};
use crate::services::authorization::GRANT_COOKIE;
use crate::services::session_service::{RefreshedAccess, TokenBundle};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/request-token", post(request_token))
}

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 32))]
    pub password: String,
}

redacted_debug!(LoginRequest {
    show email,
    redact password,
});

#[derive(Deserialize, Validate)]
pub struct TokenRequest {
    #[validate(length(min = 1))]
    pub token: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub tokens: TokenBundle,
    pub permissions: Vec<String>,
}

fn grant_set_cookie(value: String, max_age_secs: i64) -> String {
    Cookie::build((GRANT_COOKIE, value))
        .path("/")
        .max_age(CookieDuration::seconds(max_age_secs))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .build()
        .to_string()
}

fn grant_clear_cookie() -> String {
    Cookie::build((GRANT_COOKIE, ""))
        .path("/")
        .max_age(CookieDuration::ZERO)
        .expires(OffsetDateTime::UNIX_EPOCH)
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .build()
        .to_string()
}

/// Authenticate, open the session and hand out the grant cookie
pub async fn login(
    State(state): State<SharedState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse> {
    let sessions = &state.services.sessions;
    let outcome = sessions.login(&payload.email, &payload.password).await?;

    let cookie = grant_set_cookie(
        outcome.grant().encode(),
        sessions.refresh_ttl().num_seconds(),
    );
    let body = DataResponse {
        meta: Some(Meta {
            total: outcome.permissions.count,
        }),
        data: LoginResponse {
            tokens: outcome.tokens,
            permissions: outcome.permissions.data,
        },
    };

    Ok(([(SET_COOKIE, cookie)], Json(body)))
}

/// Revoke the session and clear the grant cookie
pub async fn logout(
    State(state): State<SharedState>,
    ValidatedJson(payload): ValidatedJson<TokenRequest>,
) -> Result<impl IntoResponse> {
    state.services.sessions.logout(&payload.token).await?;
    Ok((
        [(SET_COOKIE, grant_clear_cookie())],
        Json(MessageResponse::new("success logout")),
    ))
}

/// New access token from a live refresh token. The bearer token may have
/// expired but must otherwise be valid.
pub async fn request_token(
    State(state): State<SharedState>,
    headers: HeaderMap,
    ValidatedJson(payload): ValidatedJson<TokenRequest>,
) -> Result<Json<DataResponse<RefreshedAccess>>> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());
    let access_token = match extract_bearer(header) {
        ExtractedToken::Bearer(token) => token,
        _ => return Err(AppError::Unauthorized("missing bearer token".into())),
    };

    let refreshed = state
        .services
        .sessions
        .refresh_with_access_token(access_token, &payload.token)
        .await?;
    Ok(Json(DataResponse::new(refreshed)))
}
