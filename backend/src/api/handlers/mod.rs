//! HTTP request handlers.

pub mod account_roles;
pub mod accounts;
pub mod auth;
pub mod health;
pub mod permissions;
pub mod protected;
pub mod role_permissions;
pub mod roles;
