use std::sync::Arc;

use anyhow::{Context, Result};

use crate::{
    config::AppConfig,
    db::{PgRepository, Repository},
    identity::TokenKeys,
    scrape::ReleaseScraper,
};

#[derive(Clone)]
pub struct AppState {
    repo: Arc<dyn Repository>,
    tokens: TokenKeys,
    scraper: ReleaseScraper,
}

impl AppState {
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let repo = PgRepository::connect(&config.database_url, config.max_connections).await?;
        let scraper =
            ReleaseScraper::new(&config.scrape).context("failed to initialize scraper")?;

        Ok(Self::from_parts(
            Arc::new(repo),
            TokenKeys::new(&config.jwt),
            scraper,
        ))
    }

    pub fn from_parts(
        repo: Arc<dyn Repository>,
        tokens: TokenKeys,
        scraper: ReleaseScraper,
    ) -> Self {
        Self {
            repo,
            tokens,
            scraper,
        }
    }

    pub fn repo(&self) -> &dyn Repository {
        self.repo.as_ref()
    }

    pub fn tokens(&self) -> &TokenKeys {
        &self.tokens
    }

    pub fn scraper(&self) -> &ReleaseScraper {
        &self.scraper
    }
}
