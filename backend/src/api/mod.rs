//! API module - HTTP handlers and middleware.

pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::services::Services;
use crate::store::{MemoryStore, PgStore, Stores};

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub services: Services,
    /// Present when backed by Postgres; pinged by the health check
    pub db: Option<PgPool>,
}

impl AppState {
    pub fn new(config: Config, stores: Stores, db: Option<PgPool>) -> Self {
        let services = Services::new(stores, &config);
        Self {
            config,
            services,
            db,
        }
    }

    /// State backed by the Postgres store
    pub fn with_postgres(config: Config, db: PgPool) -> Self {
        let stores = Stores::from_backend(Arc::new(PgStore::new(db.clone())));
        Self::new(config, stores, Some(db))
    }

    /// State backed by an in-process store
    pub fn in_memory(config: Config, store: Arc<MemoryStore>) -> Self {
        Self::new(config, Stores::from_backend(store), None)
    }
}

pub type SharedState = Arc<AppState>;
