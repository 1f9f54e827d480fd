//! Warden - role-based access control backend.
//!
//! Accounts, a permission catalog and a role catalog, the graphs that link
//! them, refresh-token sessions and the grant gate in front of protected
//! actions.

#[macro_use]
mod macros;

pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod telemetry;

pub use config::Config;
pub use error::{AppError, Result};
