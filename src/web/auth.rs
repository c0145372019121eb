use axum::{
    Json,
    async_trait,
    extract::{FromRequestParts, State},
    http::{StatusCode, request::Parts},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use serde::Deserialize;

use crate::{
    db::UserRow,
    error::AppError,
    identity::{self, AccessToken, UserProfile},
    web::AppState,
};

#[derive(Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    fn validated(&self) -> Result<(&str, &str), AppError> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err(AppError::BadRequest("Username must not be empty".to_string()));
        }
        if self.password.is_empty() {
            return Err(AppError::BadRequest("Password must not be empty".to_string()));
        }
        Ok((username, &self.password))
    }
}

pub async fn register(
    State(state): State<AppState>,
    Json(form): Json<Credentials>,
) -> Result<(StatusCode, Json<UserProfile>), AppError> {
    let (username, password) = form.validated()?;
    let profile = identity::register(state.repo(), username, password).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(form): Json<Credentials>,
) -> Result<Json<AccessToken>, AppError> {
    let (username, password) = form.validated()?;
    let token = identity::authenticate(state.repo(), state.tokens(), username, password).await?;
    Ok(Json(token))
}

/// The user behind the request's bearer token.
pub struct CurrentUser(pub UserRow);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::Unauthorized("Not authenticated"))?;

        let user =
            identity::resolve_current_user(state.repo(), state.tokens(), bearer.token()).await?;
        Ok(CurrentUser(user))
    }
}
