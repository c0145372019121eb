mod models;
mod postgres;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use models::{UserRow, VersionInput, VersionRow};
pub use postgres::PgRepository;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate record")]
    Duplicate,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence seam. Every version query is scoped by the owning user's id.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn insert_user(&self, username: &str, hashed_password: &str)
    -> Result<UserRow, StoreError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRow>, StoreError>;

    async fn list_versions(&self, user_id: i64) -> Result<Vec<VersionRow>, StoreError>;

    async fn list_versions_by_minor(
        &self,
        user_id: i64,
        minor_version: &str,
    ) -> Result<Vec<VersionRow>, StoreError>;

    /// Inserts the whole batch atomically: either every entry is stored or none is.
    async fn insert_versions(
        &self,
        user_id: i64,
        entries: &[VersionInput],
    ) -> Result<Vec<VersionRow>, StoreError>;

    /// Returns `None` when the version is absent or owned by someone else.
    async fn update_version(
        &self,
        user_id: i64,
        version_id: i64,
        entry: &VersionInput,
    ) -> Result<Option<VersionRow>, StoreError>;

    /// Returns `false` when the version is absent or owned by someone else.
    async fn delete_version(&self, user_id: i64, version_id: i64) -> Result<bool, StoreError>;
}
