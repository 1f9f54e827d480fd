//! Permission grant middleware.
//!
//! Runs after [`auth_middleware`](super::auth::auth_middleware). Decodes the
//! `permissions` cookie and asks the authorization service whether the
//! route's action is granted to the authenticated account.

use axum::{
    extract::{Request, State},
    http::{header::COOKIE, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use cookie::Cookie;

use super::auth::AuthExtension;
use crate::api::SharedState;
use crate::error::{AppError, Result};
use crate::services::authorization::{Grant, GRANT_COOKIE};

/// State for one gated action
#[derive(Clone)]
pub struct GrantGate {
    pub state: SharedState,
    pub action: &'static str,
}

/// Raw value of the grant cookie, if sent
pub(crate) fn grant_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| Cookie::split_parse(value))
        .filter_map(|parsed| parsed.ok())
        .find(|cookie| cookie.name() == GRANT_COOKIE)
        .map(|cookie| cookie.value().to_string())
}

/// Identity and grant presented with the request
fn presented(request: &Request) -> Result<(AuthExtension, Grant)> {
    let auth = request
        .extensions()
        .get::<AuthExtension>()
        .cloned()
        .ok_or_else(|| AppError::Unauthorized("authentication required".into()))?;
    let raw = grant_cookie(request.headers())
        .ok_or_else(|| AppError::Unauthorized("missing permission grant".into()))?;
    Ok((auth, Grant::decode(&raw)?))
}

pub async fn grant_middleware(
    State(gate): State<GrantGate>,
    request: Request,
    next: Next,
) -> Response {
    let (auth, grant) = match presented(&request) {
        Ok(found) => found,
        Err(e) => return e.into_response(),
    };

    match gate
        .state
        .services
        .authorization
        .check(auth.account_id, &grant, gate.action)
        .await
    {
        Ok(()) => next.run(request).await,
        Err(e) => e.into_response(),
    }
}
