//! Route definitions for the API.

use std::time::Duration;

use axum::{http::StatusCode, middleware, routing::get, Router};
use tower_http::timeout::{RequestBodyTimeoutLayer, ResponseBodyTimeoutLayer, TimeoutLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::middleware::auth::auth_middleware;
use super::middleware::request_id::request_id_middleware;
use super::SharedState;

/// Create the main API router
pub fn create_router(state: SharedState) -> Router {
    let listen = &state.config.listen;
    let request_timeout = Duration::from_secs(listen.request_timeout_secs);
    let read_timeout = Duration::from_secs(listen.read_timeout);
    let write_timeout = Duration::from_secs(listen.write_timeout);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .nest("/api", api_v1_routes(state.clone()))
        .layer(ResponseBodyTimeoutLayer::new(write_timeout))
        .layer(RequestBodyTimeoutLayer::new(read_timeout))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

fn api_v1_routes(state: SharedState) -> Router<SharedState> {
    let auth = || middleware::from_fn_with_state(state.clone(), auth_middleware);

    // Registration stays public; the rest of /account needs a token
    let accounts = handlers::accounts::public_router()
        .merge(handlers::accounts::protected_router().route_layer(auth()));

    Router::new()
        .merge(handlers::auth::router())
        .nest("/account", accounts)
        .nest("/permission", handlers::permissions::router().route_layer(auth()))
        .nest("/role", handlers::roles::router().route_layer(auth()))
        .nest(
            "/account-role",
            handlers::account_roles::router().route_layer(auth()),
        )
        .nest(
            "/role-permission",
            handlers::role_permissions::router().route_layer(auth()),
        )
        // Token gate outside, grant gate inside
        .nest(
            "/protected",
            handlers::protected::router(&state).route_layer(auth()),
        )
}
