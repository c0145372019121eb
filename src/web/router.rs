use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};

use crate::web::{AppState, ApiMessage, auth, middleware::log_requests, versions};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .merge(versions::router())
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

async fn root() -> Json<ApiMessage> {
    Json(ApiMessage::new("Welcome to OTG"))
}

async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}
