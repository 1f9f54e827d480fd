//! Postgres-backed store.
//!
//! Queries are runtime-checked `sqlx::query`/`query_as` calls with bound
//! parameters. ULIDs are stored as UUID. Every multi-write runs in a single
//! transaction; dropping an uncommitted transaction rolls it back.

mod accounts;
mod catalog;
mod graph;
mod sessions;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use ulid::Ulid;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Account, Permission, RefreshToken, Role};

/// Postgres implementation of every store capability
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Constraint failure reported by Postgres, if any.
enum Violation<'a> {
    Unique(Option<&'a str>),
    ForeignKey,
    Other,
}

fn violation(err: &sqlx::Error) -> Violation<'_> {
    match err.as_database_error() {
        Some(db_err) if db_err.is_unique_violation() => Violation::Unique(db_err.constraint()),
        Some(db_err) if db_err.is_foreign_key_violation() => Violation::ForeignKey,
        _ => Violation::Other,
    }
}

/// Map a failed association insert: duplicate pair or missing endpoint.
fn classify_assignment(err: sqlx::Error, pair: &str, endpoints: &str) -> AppError {
    match violation(&err) {
        Violation::Unique(_) => AppError::AlreadyAssigned(pair.to_string()),
        Violation::ForeignKey => AppError::not_found(endpoints),
        Violation::Other => AppError::Database(err),
    }
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    email: String,
    password: String,
    created_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Self {
            id: Ulid::from(row.id),
            email: row.email,
            password: row.password,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PermissionRow {
    id: Uuid,
    name: String,
    description: String,
    url: String,
    created_at: DateTime<Utc>,
}

impl From<PermissionRow> for Permission {
    fn from(row: PermissionRow) -> Self {
        Self {
            id: Ulid::from(row.id),
            name: row.name,
            description: row.description,
            url: row.url,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RoleRow {
    id: Uuid,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
}

impl From<RoleRow> for Role {
    fn from(row: RoleRow) -> Self {
        Self {
            id: Ulid::from(row.id),
            name: row.name,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RefreshTokenRow {
    id: Uuid,
    token_value: String,
    account_id: Uuid,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    revoked: bool,
}

impl From<RefreshTokenRow> for RefreshToken {
    fn from(row: RefreshTokenRow) -> Self {
        Self {
            id: Ulid::from(row.id),
            token_value: row.token_value,
            account_id: Ulid::from(row.account_id),
            created_at: row.created_at,
            expires_at: row.expires_at,
            revoked: row.revoked,
        }
    }
}
