//! Domain models shared by the store, services and API layers.

pub mod account;
pub mod listing;
pub mod permission;
pub mod refresh_token;
pub mod role;

pub use account::{Account, AccountRole};
pub use listing::Listing;
pub use permission::Permission;
pub use refresh_token::RefreshToken;
pub use role::{Role, RoleDetail, RolePermission};
