use tracing::info;

use crate::{
    db::{Repository, UserRow, VersionInput, VersionRow},
    error::AppError,
    web::ApiMessage,
};

pub async fn list(repo: &dyn Repository, owner: &UserRow) -> Result<Vec<VersionRow>, AppError> {
    Ok(repo.list_versions(owner.id).await?)
}

pub async fn list_by_minor_version(
    repo: &dyn Repository,
    owner: &UserRow,
    minor_version: &str,
) -> Result<Vec<VersionRow>, AppError> {
    Ok(repo.list_versions_by_minor(owner.id, minor_version).await?)
}

pub async fn create(
    repo: &dyn Repository,
    owner: &UserRow,
    entries: &[VersionInput],
) -> Result<Vec<VersionRow>, AppError> {
    let created = repo.insert_versions(owner.id, entries).await?;
    info!(user_id = owner.id, count = created.len(), "stored versions");
    Ok(created)
}

pub async fn update(
    repo: &dyn Repository,
    owner: &UserRow,
    version_id: i64,
    entry: &VersionInput,
) -> Result<VersionRow, AppError> {
    repo.update_version(owner.id, version_id, entry)
        .await?
        .ok_or_else(not_found)
}

pub async fn delete(
    repo: &dyn Repository,
    owner: &UserRow,
    version_id: i64,
) -> Result<ApiMessage, AppError> {
    if !repo.delete_version(owner.id, version_id).await? {
        return Err(not_found());
    }
    Ok(ApiMessage::new("Version deleted successfully"))
}

fn not_found() -> AppError {
    AppError::NotFound("Version not found".to_string())
}
