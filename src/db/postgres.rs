use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::info;

use super::{Repository, StoreError, UserRow, VersionInput, VersionRow};

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    /// Connect the pool and bring the schema up to date.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("failed to connect to Postgres")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run database migrations")?;
        info!(max_connections, "database ready");

        Ok(Self { pool })
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn insert_user(
        &self,
        username: &str,
        hashed_password: &str,
    ) -> Result<UserRow, StoreError> {
        let result = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (username, hashed_password) VALUES ($1, $2)
             RETURNING id, username, hashed_password",
        )
        .bind(username)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(db_err))
                if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) =>
            {
                Err(StoreError::Duplicate)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRow>, StoreError> {
        let user = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, hashed_password FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list_versions(&self, user_id: i64) -> Result<Vec<VersionRow>, StoreError> {
        let rows = sqlx::query_as::<_, VersionRow>(
            "SELECT id, minor_version, release_date, user_id FROM versions
             WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_versions_by_minor(
        &self,
        user_id: i64,
        minor_version: &str,
    ) -> Result<Vec<VersionRow>, StoreError> {
        let rows = sqlx::query_as::<_, VersionRow>(
            "SELECT id, minor_version, release_date, user_id FROM versions
             WHERE user_id = $1 AND minor_version = $2 ORDER BY id",
        )
        .bind(user_id)
        .bind(minor_version)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert_versions(
        &self,
        user_id: i64,
        entries: &[VersionInput],
    ) -> Result<Vec<VersionRow>, StoreError> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        // Dropping the transaction without commit rolls the batch back.
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(entries.len());

        for entry in entries {
            let row = sqlx::query_as::<_, VersionRow>(
                "INSERT INTO versions (minor_version, release_date, user_id) VALUES ($1, $2, $3)
                 RETURNING id, minor_version, release_date, user_id",
            )
            .bind(&entry.minor_version)
            .bind(entry.release_date)
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;
            created.push(row);
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn update_version(
        &self,
        user_id: i64,
        version_id: i64,
        entry: &VersionInput,
    ) -> Result<Option<VersionRow>, StoreError> {
        let row = sqlx::query_as::<_, VersionRow>(
            "UPDATE versions SET minor_version = $3, release_date = $4
             WHERE id = $1 AND user_id = $2
             RETURNING id, minor_version, release_date, user_id",
        )
        .bind(version_id)
        .bind(user_id)
        .bind(&entry.minor_version)
        .bind(entry.release_date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_version(&self, user_id: i64, version_id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM versions WHERE id = $1 AND user_id = $2")
            .bind(version_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
