//! Business logic services.

pub mod account_role_service;
pub mod account_service;
pub mod authorization;
pub mod password;
pub mod permission_service;
pub mod role_permission_service;
pub mod role_service;
pub mod session_service;
pub mod token;

use std::sync::Arc;

use crate::config::Config;
use crate::store::Stores;

use account_role_service::AccountRoleService;
use account_service::AccountService;
use authorization::AuthorizationService;
use password::PasswordHasher;
use permission_service::PermissionService;
use role_permission_service::RolePermissionService;
use role_service::RoleService;
use session_service::SessionService;

/// Every service, wired over one set of store capabilities.
pub struct Services {
    pub accounts: AccountService,
    pub permissions: PermissionService,
    pub roles: RoleService,
    pub account_roles: AccountRoleService,
    pub role_permissions: RolePermissionService,
    pub sessions: SessionService,
    pub authorization: Arc<AuthorizationService>,
}

impl Services {
    pub fn new(stores: Stores, config: &Config) -> Self {
        let authorization = Arc::new(AuthorizationService::new(
            stores.grant_reader.clone(),
            stores.session_reader.clone(),
            config.jwt.grant_match,
        ));

        Self {
            accounts: AccountService::new(
                stores.account_reader.clone(),
                stores.account_writer.clone(),
                PasswordHasher::new(config.password_cost),
            ),
            permissions: PermissionService::new(
                stores.permission_reader.clone(),
                stores.permission_writer.clone(),
            ),
            roles: RoleService::new(
                stores.role_reader.clone(),
                stores.role_writer.clone(),
                stores.role_permission_reader.clone(),
            ),
            account_roles: AccountRoleService::new(
                stores.account_role_reader.clone(),
                stores.account_role_writer.clone(),
            ),
            role_permissions: RolePermissionService::new(
                stores.role_permission_reader.clone(),
                stores.role_permission_writer.clone(),
            ),
            sessions: SessionService::new(
                stores.account_reader,
                stores.session_reader,
                stores.session_writer,
                authorization.clone(),
                config,
            ),
            authorization,
        }
    }
}
