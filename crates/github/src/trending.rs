//! Client for the trending-data provider
//!
//! The upstream is slow and unauthenticated; callers that care about
//! latency should read from the cache instead of calling this live.

use common::models::{Language, TrendingProject};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum TrendingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Trending upstream error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// Client for the trending-data provider
#[derive(Clone)]
pub struct TrendingClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct RawProject {
    #[serde(alias = "repositoryName")]
    name: String,
    #[serde(alias = "owner")]
    author: String,
    #[serde(default)]
    description: String,
}

impl TrendingClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("daily-github/0.1"));
        headers
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, TrendingError> {
        debug!("GET {}", url);
        let resp = self.client.get(url).headers(self.headers()).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(TrendingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.json().await?)
    }

    /// Fetch the catalog of languages the upstream knows about
    pub async fn languages(&self) -> Result<Vec<Language>, TrendingError> {
        let url = format!("{}/languages", self.base_url);
        self.get(&url).await
    }

    /// Fetch today's trending repositories, optionally filtered by a
    /// URL-safe language id (empty = unfiltered)
    pub async fn trending_today(
        &self,
        language: &str,
    ) -> Result<Vec<TrendingProject>, TrendingError> {
        let url = if language.is_empty() {
            format!("{}/repositories?since=daily", self.base_url)
        } else {
            format!(
                "{}/repositories?language={}&since=daily",
                self.base_url, language
            )
        };
        let raw: Vec<RawProject> = self.get(&url).await?;
        Ok(raw
            .into_iter()
            .map(|p| TrendingProject {
                name: p.name,
                author: p.author,
                description: p.description,
            })
            .collect())
    }
}
