use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::{
    Company, CompanyPatch, CompanyView, NewCompany, NewUser, User, UserPatch,
};
use crate::filter::{CompanyFilter, Page, Paged};

/// Errors from a store backend
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique index rejected the write. `field` is the wire name of the column.
    #[error("duplicate value for unique field '{field}'")]
    Duplicate { field: &'static str },

    #[error("Invalid stored value: {0}")]
    Corrupt(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Persistence operations used by guards, validators and controllers.
///
/// Lookups by id return records regardless of `status`; mutations and lists
/// only ever touch active records. Every method is a single round trip.
#[async_trait]
pub trait Store: Send + Sync {
    /// Cheap connectivity probe for `/health`.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Number of ADMIN accounts with `status = true`.
    async fn active_admin_count(&self) -> Result<i64, StoreError>;

    async fn admin_exists(&self) -> Result<bool, StoreError> {
        Ok(self.active_admin_count().await? > 0)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Active user whose email (case-insensitive) or username matches.
    async fn find_login(&self, email: Option<&str>, username: Option<&str>) -> Result<Option<User>, StoreError>;

    async fn email_taken(&self, email: &str, except: Option<Uuid>) -> Result<bool, StoreError>;

    async fn username_taken(&self, username: &str, except: Option<Uuid>) -> Result<bool, StoreError>;

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;

    /// `None` when the user is absent or inactive.
    async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>, StoreError>;

    /// Logical delete. `None` when the user is absent or already inactive.
    async fn deactivate_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn list_users(&self, page: Page) -> Result<Paged<User>, StoreError>;

    async fn company_name_taken(&self, name: &str, except: Option<Uuid>) -> Result<bool, StoreError>;

    async fn find_company(&self, id: Uuid) -> Result<Option<Company>, StoreError>;

    /// Active company with its owner resolved.
    async fn find_company_view(&self, id: Uuid) -> Result<Option<CompanyView>, StoreError>;

    async fn insert_company(&self, company: NewCompany) -> Result<Company, StoreError>;

    async fn update_company(&self, id: Uuid, patch: CompanyPatch) -> Result<Option<Company>, StoreError>;

    async fn deactivate_company(&self, id: Uuid) -> Result<Option<Company>, StoreError>;

    async fn list_companies(&self, filter: &CompanyFilter, page: Page) -> Result<Paged<CompanyView>, StoreError>;

    /// Every active company ordered by name, for the spreadsheet export.
    async fn active_companies(&self) -> Result<Vec<CompanyView>, StoreError>;
}
