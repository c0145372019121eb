//! Release-notes scraper.
//!
//! Fetches an HTML page and pulls `(minor version, release date)` pairs out of
//! the tables that follow each "Rocky" second-level heading.

use anyhow::{Context, Result};
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task;
use tracing::{debug, info};

use crate::{config::ScrapeSettings, error::AppError};

const HEADING_MARKER: &str = "Rocky";
const VERSION_PATTERN: &str = r"(\d+\.\d+)";
const DATE_PATTERN: &str = r"\d{4}-\d{2}-\d{2}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedVersion {
    pub minor_version: String,
    pub release_date: String,
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("{0}")]
    Upstream(#[from] reqwest::Error),

    #[error("{0}")]
    Internal(String),
}

impl From<ScrapeError> for AppError {
    fn from(err: ScrapeError) -> Self {
        match err {
            ScrapeError::Upstream(err) => AppError::Upstream(err.to_string()),
            ScrapeError::Internal(message) => AppError::Internal(message),
        }
    }
}

#[derive(Clone)]
pub struct ReleaseScraper {
    client: Client,
    default_url: String,
    patterns: Patterns,
}

#[derive(Clone)]
struct Patterns {
    version: Regex,
    date: Regex,
}

impl ReleaseScraper {
    pub fn new(settings: &ScrapeSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .context("failed to build scrape HTTP client")?;

        Ok(Self {
            client,
            default_url: settings.default_url.clone(),
            patterns: Patterns::compile()?,
        })
    }

    /// Fetch `url` (or the configured default) and extract every release row.
    /// Nothing is returned unless the fetch succeeds as a whole.
    pub async fn scrape(&self, url: Option<&str>) -> Result<Vec<ScrapedVersion>, ScrapeError> {
        let url = url.unwrap_or(self.default_url.as_str());
        info!(%url, "scraping release notes");

        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let patterns = self.patterns.clone();
        let releases = task::spawn_blocking(move || extract_releases(&body, &patterns))
            .await
            .map_err(|err| ScrapeError::Internal(format!("parser task failed: {err}")))??;

        debug!(count = releases.len(), "extracted release rows");
        Ok(releases)
    }
}

impl Patterns {
    fn compile() -> Result<Self> {
        Ok(Self {
            version: Regex::new(VERSION_PATTERN).context("invalid version pattern")?,
            date: Regex::new(DATE_PATTERN).context("invalid date pattern")?,
        })
    }
}

fn selector(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css)
        .map_err(|err| ScrapeError::Internal(format!("invalid selector {css}: {err}")))
}

fn extract_releases(html: &str, patterns: &Patterns) -> Result<Vec<ScrapedVersion>, ScrapeError> {
    let landmarks = selector("h2, table")?;
    let rows = selector("tr")?;
    let cells = selector("td")?;

    let document = Html::parse_document(html);
    // Selection order is document order, so the first table after a heading's
    // position is the table that follows it.
    let ordered: Vec<ElementRef<'_>> = document.select(&landmarks).collect();
    let mut releases = Vec::new();

    for (position, heading) in ordered.iter().enumerate() {
        if heading.value().name() != "h2" || !stripped_text(*heading).contains(HEADING_MARKER) {
            continue;
        }

        let Some(table) = ordered[position + 1..]
            .iter()
            .find(|element| element.value().name() == "table")
        else {
            continue;
        };

        for row in table.select(&rows).skip(1) {
            let columns: Vec<String> = row.select(&cells).take(2).map(stripped_text).collect();
            let [version_raw, date_raw] = columns.as_slice() else {
                continue;
            };

            let version = patterns
                .version
                .captures(version_raw)
                .and_then(|caps| caps.get(1));
            let date = patterns.date.find(date_raw);

            if let (Some(version), Some(date)) = (version, date) {
                releases.push(ScrapedVersion {
                    minor_version: version.as_str().to_string(),
                    release_date: date.as_str().to_string(),
                });
            }
        }
    }

    Ok(releases)
}

/// Text nodes trimmed individually and concatenated, skipping blank ones.
fn stripped_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .collect()
}
