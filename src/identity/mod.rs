mod password;
mod token;

use serde::Serialize;
use tokio::task;
use tracing::{error, info};

use crate::{
    db::{Repository, StoreError, UserRow},
    error::AppError,
};

use password::{DUMMY_HASH, hash_password, verify_password};
pub use token::TokenKeys;

const INVALID_TOKEN: &str = "Could not validate credentials";
const INVALID_LOGIN: &str = "Incorrect username or password";

#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
}

impl From<UserRow> for UserProfile {
    fn from(user: UserRow) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: &'static str,
}

pub async fn register(
    repo: &dyn Repository,
    username: &str,
    password: &str,
) -> Result<UserProfile, AppError> {
    if repo.find_user_by_username(username).await?.is_some() {
        return Err(username_taken());
    }

    let owned = password.to_owned();
    let hashed = task::spawn_blocking(move || hash_password(&owned))
        .await
        .map_err(|err| {
            error!(?err, "password hashing task failed");
            AppError::Internal("failed to hash password".to_string())
        })?
        .map_err(|err| {
            error!(?err, "failed to hash password during registration");
            AppError::Internal("failed to hash password".to_string())
        })?;

    match repo.insert_user(username, &hashed).await {
        Ok(user) => {
            info!(user_id = user.id, "registered user");
            Ok(user.into())
        }
        Err(StoreError::Duplicate) => Err(username_taken()),
        Err(err) => Err(err.into()),
    }
}

pub async fn authenticate(
    repo: &dyn Repository,
    keys: &TokenKeys,
    username: &str,
    password: &str,
) -> Result<AccessToken, AppError> {
    let user = repo.find_user_by_username(username).await?;
    let stored = user.as_ref().map(|user| user.hashed_password.as_str());

    let verified = check_password(password, stored).await?;
    let Some(user) = user.filter(|_| verified) else {
        return Err(AppError::Unauthorized(INVALID_LOGIN));
    };

    let access_token = keys.issue(&user.username).map_err(|err| {
        error!(?err, "failed to sign access token");
        AppError::Internal("failed to issue token".to_string())
    })?;

    Ok(AccessToken {
        access_token,
        token_type: "bearer",
    })
}

/// Map a bearer token back to its user. Every failure collapses into the same
/// `Unauthorized` so callers never learn why a token was refused.
pub async fn resolve_current_user(
    repo: &dyn Repository,
    keys: &TokenKeys,
    token: &str,
) -> Result<UserRow, AppError> {
    let claims = keys
        .decode(token)
        .map_err(|_| AppError::Unauthorized(INVALID_TOKEN))?;

    let Some(username) = claims.sub.filter(|sub| !sub.is_empty()) else {
        return Err(AppError::Unauthorized(INVALID_TOKEN));
    };

    match repo.find_user_by_username(&username).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(AppError::Unauthorized(INVALID_TOKEN)),
        Err(err) => {
            error!(?err, "failed to load user for token");
            Err(AppError::Unauthorized(INVALID_TOKEN))
        }
    }
}

/// Runs argon2 off the async workers. Unknown users are checked against
/// `DUMMY_HASH` so a miss costs as much as a wrong password.
async fn check_password(password: &str, stored: Option<&str>) -> Result<bool, AppError> {
    let known = stored.is_some();
    let hash = stored.unwrap_or(DUMMY_HASH).to_owned();
    let password = password.to_owned();

    let verified = task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|err| {
            error!(?err, "password verification task failed");
            AppError::Internal("failed to verify password".to_string())
        })?;

    Ok(known && verified)
}

fn username_taken() -> AppError {
    AppError::Conflict("Username already registered".to_string())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use jsonwebtoken::Algorithm;

    use super::token::Claims;
    use super::*;
    use crate::{config::JwtSettings, db::memory::MemoryRepository};

    fn keys() -> TokenKeys {
        TokenKeys::new(&JwtSettings {
            secret: "test-secret".to_string(),
            algorithm: Algorithm::HS256,
            ttl_minutes: 30,
        })
    }

    #[tokio::test]
    async fn register_twice_conflicts() {
        let repo = MemoryRepository::new();
        let profile = register(&repo, "alice", "pw").await.expect("first");
        assert_eq!(profile.username, "alice");

        let err = register(&repo, "alice", "other").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn login_token_resolves_to_same_user() {
        let repo = MemoryRepository::new();
        let keys = keys();
        let profile = register(&repo, "alice", "pw").await.expect("register");

        let token = authenticate(&repo, &keys, "alice", "pw")
            .await
            .expect("login");
        assert_eq!(token.token_type, "bearer");

        let user = resolve_current_user(&repo, &keys, &token.access_token)
            .await
            .expect("resolve");
        assert_eq!(user.id, profile.id);
        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_are_unauthorized() {
        let repo = MemoryRepository::new();
        let keys = keys();
        register(&repo, "alice", "pw").await.expect("register");

        let wrong = authenticate(&repo, &keys, "alice", "nope").await;
        assert!(matches!(wrong, Err(AppError::Unauthorized(_))));

        let missing = authenticate(&repo, &keys, "bob", "pw").await;
        assert!(matches!(missing, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        let repo = MemoryRepository::new();
        let result = resolve_current_user(&repo, &keys(), "not.a.jwt").await;
        assert!(matches!(result, Err(AppError::Unauthorized(INVALID_TOKEN))));
    }

    #[tokio::test]
    async fn token_without_subject_is_unauthorized() {
        let repo = MemoryRepository::new();
        let keys = keys();
        let token = keys
            .sign(&Claims {
                sub: None,
                exp: (Utc::now() + Duration::minutes(5)).timestamp(),
            })
            .expect("sign");

        let result = resolve_current_user(&repo, &keys, &token).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn token_for_vanished_user_is_unauthorized() {
        let repo = MemoryRepository::new();
        let keys = keys();
        register(&repo, "ghost", "pw").await.expect("register");
        let token = authenticate(&repo, &keys, "ghost", "pw")
            .await
            .expect("login");

        repo.remove_user("ghost");

        let result = resolve_current_user(&repo, &keys, &token.access_token).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn token_expired_seconds_ago_is_unauthorized() {
        let repo = MemoryRepository::new();
        let keys = keys();
        register(&repo, "alice", "pw").await.expect("register");
        let token = keys
            .sign(&Claims {
                sub: Some("alice".into()),
                exp: (Utc::now() - Duration::seconds(30)).timestamp(),
            })
            .expect("sign");

        let result = resolve_current_user(&repo, &keys, &token).await;
        assert!(matches!(result, Err(AppError::Unauthorized(INVALID_TOKEN))));
    }

    #[tokio::test]
    async fn password_check_without_stored_hash_fails() {
        let hash = hash_password("pw").expect("hash");
        assert!(check_password("pw", Some(&hash)).await.expect("check"));
        assert!(!check_password("pw", Some("not-a-phc-string")).await.expect("check"));
        assert!(!check_password("pw", None).await.expect("check"));
        assert!(!check_password("", None).await.expect("check"));
    }
}
