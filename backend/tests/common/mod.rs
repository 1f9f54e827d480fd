//! Shared helpers for the router and flow tests.
//!
//! Every app is backed by a fresh [`MemoryStore`] and a config with a low
//! bcrypt cost.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use warden_backend::api::{routes::create_router, AppState, SharedState};
use warden_backend::config::{Config, GrantMatch};
use warden_backend::store::MemoryStore;

pub const TEST_SECRET: &str = "integration-test-secret";
pub const EMAIL: &str = "a@x.com";
pub const PASSWORD: &str = "password123";

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.jwt.secret = TEST_SECRET.to_string();
    config.password_cost = 4;
    config
}

pub struct TestApp {
    pub router: Router,
    pub state: SharedState,
    pub store: Arc<MemoryStore>,
}

/// Decoded response
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// `name=value` of the first `Set-Cookie` header, attributes stripped
    pub fn cookie_pair(&self) -> Option<String> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string)
    }

    pub fn set_cookie(&self) -> Option<String> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }
}

/// Tokens and grant cookie returned by a login
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub cookie: String,
    pub permissions: Vec<String>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_grant_match(mode: GrantMatch) -> Self {
        let mut config = test_config();
        config.jwt.grant_match = mode;
        Self::with_config(config)
    }

    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = Arc::new(AppState::in_memory(config, store.clone()));
        Self {
            router: create_router(state.clone()),
            state,
            store,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        headers: &[(header::HeaderName, String)],
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn post_json(&self, uri: &str, body: Value, token: Option<&str>) -> TestResponse {
        self.request(Method::POST, uri, Some(body), &bearer(token)).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, None, &bearer(token)).await
    }

    /// Register an account and return its id
    pub async fn create_account(&self, email: &str, password: &str) -> String {
        let res = self
            .post_json(
                "/api/account",
                json!({ "email": email, "password": password }),
                None,
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
        id_of(&res.body)
    }

    pub async fn login(&self, email: &str, password: &str) -> Session {
        let res = self
            .post_json(
                "/api/login",
                json!({ "email": email, "password": password }),
                None,
            )
            .await;
        assert_eq!(res.status, StatusCode::OK, "{}", res.body);
        let data = &res.body["data"];
        Session {
            access_token: data["access_token"].as_str().unwrap().to_string(),
            refresh_token: data["refresh_token"].as_str().unwrap().to_string(),
            cookie: res.cookie_pair().unwrap(),
            permissions: data["permissions"]
                .as_array()
                .unwrap()
                .iter()
                .map(|v| v.as_str().unwrap().to_string())
                .collect(),
        }
    }

    pub async fn logout(&self, refresh_token: &str) -> TestResponse {
        self.post_json("/api/logout", json!({ "token": refresh_token }), None)
            .await
    }

    pub async fn create_role(&self, token: &str, name: &str) -> String {
        let res = self
            .post_json(
                "/api/role",
                json!({ "name": name, "description": "" }),
                Some(token),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
        id_of(&res.body)
    }

    pub async fn create_permission(&self, token: &str, name: &str, url: &str) -> String {
        let res = self
            .post_json(
                "/api/permission",
                json!({ "name": name, "description": "", "url": url }),
                Some(token),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
        id_of(&res.body)
    }

    pub async fn assign_permission(&self, token: &str, role_id: &str, permission_id: &str) {
        let res = self
            .post_json(
                "/api/role-permission",
                json!({ "role_id": role_id, "permission_id": permission_id }),
                Some(token),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    }

    pub async fn assign_role(&self, token: &str, account_id: &str, role_id: &str) {
        let res = self
            .post_json(
                "/api/account-role",
                json!({ "account_id": account_id, "role_id": role_id }),
                Some(token),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    }

    /// Call a grant-gated action with the session's token and cookie
    pub async fn protected(&self, method: Method, path: &str, session: &Session) -> TestResponse {
        self.request(
            method,
            &format!("/api/protected{path}"),
            None,
            &[
                (
                    header::AUTHORIZATION,
                    format!("Bearer {}", session.access_token),
                ),
                (header::COOKIE, session.cookie.clone()),
            ],
        )
        .await
    }
}

pub fn bearer(token: Option<&str>) -> Vec<(header::HeaderName, String)> {
    token
        .map(|t| vec![(header::AUTHORIZATION, format!("Bearer {t}"))])
        .unwrap_or_default()
}

pub fn id_of(body: &Value) -> String {
    body["data"]["id"].as_str().unwrap().to_string()
}
