//! Account service: registration, password rotation and lookups.

use std::sync::Arc;

use tracing::info;
use ulid::Ulid;

use crate::error::Result;
use crate::models::{Account, Listing};
use crate::services::password::PasswordHasher;
use crate::store::{AccountReader, AccountWriter};

pub struct AccountService {
    reader: Arc<dyn AccountReader>,
    writer: Arc<dyn AccountWriter>,
    hasher: PasswordHasher,
}

impl AccountService {
    pub fn new(
        reader: Arc<dyn AccountReader>,
        writer: Arc<dyn AccountWriter>,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            reader,
            writer,
            hasher,
        }
    }

    /// Register an account. Signals `DuplicateEmail` when the email is taken.
    pub async fn create_account(&self, email: &str, password: &str) -> Result<Account> {
        let account = Account::new(email, self.hasher.hash(password)?);
        self.writer.save_account(&account).await?;
        info!(account_id = %account.id, "account created");
        Ok(account)
    }

    /// Rehash and store a new password.
    pub async fn edit_password(&self, id: Ulid, password: &str) -> Result<Account> {
        let mut account = self.reader.find_account(id).await?;
        account.password = self.hasher.hash(password)?;
        self.writer.save_account(&account).await?;
        info!(account_id = %id, "account password changed");
        Ok(account)
    }

    pub async fn delete_account(&self, id: Ulid) -> Result<()> {
        self.writer.delete_account(id).await?;
        info!(account_id = %id, "account deleted");
        Ok(())
    }

    pub async fn get_account(&self, id: Ulid) -> Result<Account> {
        self.reader.find_account(id).await
    }

    pub async fn list_accounts(&self) -> Result<Listing<Account>> {
        self.reader.list_accounts().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::store::MemoryStore;

    fn service() -> AccountService {
        let store = Arc::new(MemoryStore::new());
        AccountService::new(store.clone(), store, PasswordHasher::new(4))
    }

    #[tokio::test]
    async fn test_create_hashes_and_hides_password() {
        let svc = service();
        let account = svc.create_account("a@x.com", "hunter2pass").await.unwrap();
        assert_ne!(account.password, "hunter2pass");

        let json = serde_json::to_string(&account).unwrap();
        assert!(!json.contains("hunter2pass"));
        assert!(!json.contains("password"));
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let svc = service();
        svc.create_account("a@x.com", "password123").await.unwrap();
        let err = svc.create_account("a@x.com", "password456").await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail(email) if email == "a@x.com"));
    }

    #[tokio::test]
    async fn test_edit_password_rehashes() {
        let svc = service();
        let account = svc.create_account("a@x.com", "password123").await.unwrap();
        let edited = svc.edit_password(account.id, "password456").await.unwrap();

        let hasher = PasswordHasher::new(4);
        assert!(hasher.verify("password456", &edited.password).unwrap());
        let stored = svc.get_account(account.id).await.unwrap();
        assert_eq!(stored.password, edited.password);
    }

    #[tokio::test]
    async fn test_missing_account_surfaces_not_found() {
        let svc = service();
        assert!(matches!(
            svc.edit_password(Ulid::new(), "password123").await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            svc.delete_account(Ulid::new()).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_list_is_empty_not_absent() {
        let svc = service();
        let listing = svc.list_accounts().await.unwrap();
        assert_eq!(listing.count, 0);
        assert!(listing.data.is_empty());
    }
}
