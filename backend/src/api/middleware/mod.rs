//! Request gates.

pub mod auth;
pub mod grant;
pub mod request_id;
