use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
};
use serde::Deserialize;
use tracing::error;

use crate::{
    db::{VersionInput, VersionRow},
    error::AppError,
    scrape::ScrapedVersion,
    versions,
    web::{ApiMessage, AppState, CurrentUser},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/versions/scrape", get(scrape_versions))
        .route("/versions", get(list_versions).post(add_versions))
        .route("/versions/", get(list_versions).post(add_versions))
        .route("/versions/:id", put(update_version).delete(delete_version))
        .route(
            "/versions/get_minor_version_all/:minor_version",
            get(list_minor_version),
        )
}

#[derive(Deserialize)]
pub struct ScrapeQuery {
    pub url: Option<String>,
}

/// Public: no bearer token required.
async fn scrape_versions(
    State(state): State<AppState>,
    Query(query): Query<ScrapeQuery>,
) -> Result<Json<Vec<ScrapedVersion>>, AppError> {
    let releases = state
        .scraper()
        .scrape(query.url.as_deref())
        .await
        .map_err(|err| {
            error!(?err, "release notes scrape failed");
            AppError::from(err)
        })?;
    Ok(Json(releases))
}

async fn list_versions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<VersionRow>>, AppError> {
    Ok(Json(versions::list(state.repo(), &user).await?))
}

async fn add_versions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(entries): Json<Vec<VersionInput>>,
) -> Result<(StatusCode, Json<Vec<VersionRow>>), AppError> {
    let created = versions::create(state.repo(), &user, &entries).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_version(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(version_id): Path<i64>,
    Json(entry): Json<VersionInput>,
) -> Result<Json<VersionRow>, AppError> {
    Ok(Json(
        versions::update(state.repo(), &user, version_id, &entry).await?,
    ))
}

async fn delete_version(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(version_id): Path<i64>,
) -> Result<Json<ApiMessage>, AppError> {
    Ok(Json(versions::delete(state.repo(), &user, version_id).await?))
}

async fn list_minor_version(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(minor_version): Path<String>,
) -> Result<Json<Vec<VersionRow>>, AppError> {
    Ok(Json(
        versions::list_by_minor_version(state.repo(), &user, &minor_version).await?,
    ))
}
