//! Access token middleware.
//!
//! Requires `Authorization: Bearer <jwt>` with a valid signature and an
//! unexpired `exp`. The verified identity is stored as [`AuthExtension`].

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use ulid::Ulid;

use crate::api::SharedState;
use crate::error::AppError;
use crate::services::token::AccessClaims;

/// Extension that holds the authenticated account
#[derive(Debug, Clone)]
pub struct AuthExtension {
    pub account_id: Ulid,
    pub email: String,
}

impl From<AccessClaims> for AuthExtension {
    fn from(claims: AccessClaims) -> Self {
        Self {
            account_id: claims.sub,
            email: claims.email,
        }
    }
}

/// Token extraction result
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ExtractedToken<'a> {
    Bearer(&'a str),
    None,
    Invalid,
}

/// Pull the bearer token out of an `Authorization` header value
pub(crate) fn extract_bearer(header: Option<&str>) -> ExtractedToken<'_> {
    match header {
        None => ExtractedToken::None,
        Some(value) => match value.strip_prefix("Bearer ") {
            Some(token) if !token.trim().is_empty() => ExtractedToken::Bearer(token.trim()),
            _ => ExtractedToken::Invalid,
        },
    }
}

pub(crate) fn bearer_token(request: &Request) -> ExtractedToken<'_> {
    extract_bearer(
        request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok()),
    )
}

/// Authentication middleware function - requires a valid access token
pub async fn auth_middleware(
    State(state): State<SharedState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(&request) {
        ExtractedToken::Bearer(token) => token,
        ExtractedToken::None => {
            return AppError::Unauthorized("missing authorization header".into()).into_response()
        }
        ExtractedToken::Invalid => {
            return AppError::Unauthorized("invalid authorization header format".into())
                .into_response()
        }
    };

    match state.services.sessions.authenticate(token) {
        Ok(claims) => {
            request.extensions_mut().insert(AuthExtension::from(claims));
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}
