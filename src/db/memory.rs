use std::sync::Mutex;

use async_trait::async_trait;

use super::{Repository, StoreError, UserRow, VersionInput, VersionRow};

/// In-process stand-in for Postgres used by the test suites.
#[derive(Default)]
pub struct MemoryRepository {
    inner: Mutex<Tables>,
    failing_insert: Mutex<Option<usize>>,
}

#[derive(Default)]
struct Tables {
    users: Vec<UserRow>,
    versions: Vec<VersionRow>,
    next_user_id: i64,
    next_version_id: i64,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the `nth` (0-based) row of every later batch insert fail.
    pub fn fail_version_insert_at(&self, nth: usize) {
        *self.failing_insert.lock().expect("memory repository poisoned") = Some(nth);
    }

    pub fn remove_user(&self, username: &str) {
        let mut tables = self.inner.lock().expect("memory repository poisoned");
        tables.users.retain(|user| user.username != username);
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn insert_user(
        &self,
        username: &str,
        hashed_password: &str,
    ) -> Result<UserRow, StoreError> {
        let mut tables = self.inner.lock().expect("memory repository poisoned");
        if tables.users.iter().any(|user| user.username == username) {
            return Err(StoreError::Duplicate);
        }
        tables.next_user_id += 1;
        let user = UserRow {
            id: tables.next_user_id,
            username: username.to_string(),
            hashed_password: hashed_password.to_string(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRow>, StoreError> {
        let tables = self.inner.lock().expect("memory repository poisoned");
        Ok(tables
            .users
            .iter()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn list_versions(&self, user_id: i64) -> Result<Vec<VersionRow>, StoreError> {
        let tables = self.inner.lock().expect("memory repository poisoned");
        Ok(tables
            .versions
            .iter()
            .filter(|row| row.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_versions_by_minor(
        &self,
        user_id: i64,
        minor_version: &str,
    ) -> Result<Vec<VersionRow>, StoreError> {
        let tables = self.inner.lock().expect("memory repository poisoned");
        Ok(tables
            .versions
            .iter()
            .filter(|row| row.user_id == user_id && row.minor_version == minor_version)
            .cloned()
            .collect())
    }

    async fn insert_versions(
        &self,
        user_id: i64,
        entries: &[VersionInput],
    ) -> Result<Vec<VersionRow>, StoreError> {
        let failing = *self.failing_insert.lock().expect("memory repository poisoned");
        let mut tables = self.inner.lock().expect("memory repository poisoned");

        // Rows are staged and only published once the whole batch succeeded.
        let mut staged = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            if failing == Some(index) {
                return Err(StoreError::Database(sqlx::Error::Protocol(format!(
                    "injected failure on row {index}"
                ))));
            }
            staged.push(VersionRow {
                id: tables.next_version_id + index as i64 + 1,
                minor_version: entry.minor_version.clone(),
                release_date: entry.release_date,
                user_id,
            });
        }

        tables.next_version_id += staged.len() as i64;
        tables.versions.extend(staged.iter().cloned());
        Ok(staged)
    }

    async fn update_version(
        &self,
        user_id: i64,
        version_id: i64,
        entry: &VersionInput,
    ) -> Result<Option<VersionRow>, StoreError> {
        let mut tables = self.inner.lock().expect("memory repository poisoned");
        let Some(row) = tables
            .versions
            .iter_mut()
            .find(|row| row.id == version_id && row.user_id == user_id)
        else {
            return Ok(None);
        };
        row.minor_version = entry.minor_version.clone();
        row.release_date = entry.release_date;
        Ok(Some(row.clone()))
    }

    async fn delete_version(&self, user_id: i64, version_id: i64) -> Result<bool, StoreError> {
        let mut tables = self.inner.lock().expect("memory repository poisoned");
        let before = tables.versions.len();
        tables
            .versions
            .retain(|row| !(row.id == version_id && row.user_id == user_id));
        Ok(tables.versions.len() < before)
    }
}
