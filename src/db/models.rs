use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Clone, Debug, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub hashed_password: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, FromRow)]
pub struct VersionRow {
    pub id: i64,
    pub minor_version: String,
    pub release_date: NaiveDate,
    pub user_id: i64,
}

/// Payload shared by batch creation and full-replace updates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInput {
    pub minor_version: String,
    pub release_date: NaiveDate,
}
