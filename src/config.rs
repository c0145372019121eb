use std::{env, str::FromStr, time::Duration};

use anyhow::{Context, Result, anyhow, bail};
use jsonwebtoken::Algorithm;

pub const DEFAULT_SCRAPE_URL: &str = "https://docs.rockylinux.org/release_notes/";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_TOKEN_TTL_MINUTES: i64 = 30;
const DEFAULT_SCRAPE_TIMEOUT_SECS: u64 = 10;

/// Process-wide settings resolved once at startup.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub port: u16,
    pub jwt: JwtSettings,
    pub scrape: ScrapeSettings,
}

#[derive(Clone, Debug)]
pub struct JwtSettings {
    pub secret: String,
    pub algorithm: Algorithm,
    pub ttl_minutes: i64,
}

#[derive(Clone, Debug)]
pub struct ScrapeSettings {
    pub default_url: String,
    pub timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup so tests can avoid
    /// touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL env var is missing")?;

        let secret = lookup("JWT_SECRET_KEY").context("JWT_SECRET_KEY env var is missing")?;
        if secret.trim().is_empty() {
            bail!("JWT_SECRET_KEY must not be empty");
        }

        let algorithm = match lookup("JWT_ALGORITHM") {
            Some(raw) => parse_algorithm(&raw)?,
            None => Algorithm::HS256,
        };

        let ttl_minutes = parse_or(
            &lookup,
            "ACCESS_TOKEN_EXPIRE_MINUTES",
            DEFAULT_TOKEN_TTL_MINUTES,
        )?;
        if ttl_minutes <= 0 {
            bail!("ACCESS_TOKEN_EXPIRE_MINUTES must be positive");
        }

        let timeout_secs = parse_or(&lookup, "SCRAPE_TIMEOUT_SECS", DEFAULT_SCRAPE_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            bail!("SCRAPE_TIMEOUT_SECS must be positive");
        }

        Ok(Self {
            database_url,
            max_connections: parse_or(
                &lookup,
                "DATABASE_MAX_CONNECTIONS",
                DEFAULT_MAX_CONNECTIONS,
            )?,
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            jwt: JwtSettings {
                secret,
                algorithm,
                ttl_minutes,
            },
            scrape: ScrapeSettings {
                default_url: lookup("SCRAPE_DEFAULT_URL")
                    .unwrap_or_else(|| DEFAULT_SCRAPE_URL.to_string()),
                timeout: Duration::from_secs(timeout_secs),
            },
        })
    }
}

/// Only the HMAC family is accepted; the signing key is a shared secret.
fn parse_algorithm(raw: &str) -> Result<Algorithm> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => Err(anyhow!("unsupported JWT_ALGORITHM: {other}")),
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|err| anyhow!("invalid value for {key}: {err}")),
        None => Ok(default),
    }
}
