//! Intent dispatch

use std::sync::Arc;

use cache::CacheStore;
use common::models::{Intent, ALL_LANGUAGES_KEY, DEFAULT_TRENDING_COUNT};
use common::Error;
use github::GitHubClient;
use tracing::{debug, warn};

use crate::Fulfillment;

/// Answers spoken intents. Trending data comes exclusively from the cache;
/// account-linked intents hit the GitHub API with the caller's token.
pub struct IntentHandler {
    store: Arc<dyn CacheStore>,
    github_base_url: String,
}

impl IntentHandler {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            github_base_url: "https://api.github.com".to_string(),
        }
    }

    /// GitHub API base override for tests
    pub fn with_github_base_url(store: Arc<dyn CacheStore>, github_base_url: String) -> Self {
        Self {
            store,
            github_base_url,
        }
    }

    pub async fn handle(
        &self,
        intent: Intent,
        access_token: Option<&str>,
    ) -> Result<Fulfillment, Error> {
        match intent {
            Intent::Summary => {
                let client = self.github_client(access_token)?;
                let profile = client
                    .profile()
                    .await
                    .map_err(|e| Error::GitHub(e.to_string()))?;
                Ok(Fulfillment::ProfileSummary(profile))
            }
            Intent::Trending { count, language } => self.trending(count, language).await,
            Intent::Notifications => {
                let client = self.github_client(access_token)?;
                let notifications = client
                    .notifications()
                    .await
                    .map_err(|e| Error::GitHub(e.to_string()))?;
                Ok(Fulfillment::Notifications(notifications))
            }
            Intent::AssignedIssues => {
                let client = self.github_client(access_token)?;
                let issues = client
                    .assigned_issues()
                    .await
                    .map_err(|e| Error::GitHub(e.to_string()))?;
                Ok(Fulfillment::Issues(issues))
            }
        }
    }

    fn github_client(&self, access_token: Option<&str>) -> Result<GitHubClient, Error> {
        let token = access_token.ok_or(Error::NotAuthorized)?;
        Ok(GitHubClient::with_base_url(
            token.to_string(),
            self.github_base_url.clone(),
        ))
    }

    async fn trending(
        &self,
        count: Option<usize>,
        language: Option<String>,
    ) -> Result<Fulfillment, Error> {
        let key = self.resolve_language_key(language.as_deref()).await;
        debug!("Trending intent reading cache key {}", key);

        let entry = self
            .store
            .get(&key)
            .await
            .map_err(|e| Error::Cache(e.to_string()))?;

        match entry {
            Some(set) => Ok(Fulfillment::Trending {
                projects: set.data,
                count: count.unwrap_or(DEFAULT_TRENDING_COUNT),
            }),
            None => Ok(Fulfillment::Text(
                "I don't have trending repository data yet. Please try again later.".to_string(),
            )),
        }
    }

    /// Map a spoken language name to a cache key. Unknown names (nothing
    /// cached under the normalized id) fall back to the unfiltered bucket.
    async fn resolve_language_key(&self, spoken: Option<&str>) -> String {
        let Some(spoken) = spoken.filter(|s| !s.is_empty()) else {
            return ALL_LANGUAGES_KEY.to_string();
        };

        let normalized = normalize_language(spoken);
        match self.store.get(&normalized).await {
            Ok(Some(_)) => normalized,
            Ok(None) => {
                debug!("No cached data for spoken language {:?}", spoken);
                ALL_LANGUAGES_KEY.to_string()
            }
            Err(e) => {
                warn!("Cache read failed resolving language {:?}: {}", spoken, e);
                ALL_LANGUAGES_KEY.to_string()
            }
        }
    }
}

/// Normalize a spoken language name into the upstream's URL-safe form:
/// lowercased, spaces replaced with hyphens.
pub fn normalize_language(spoken: &str) -> String {
    spoken.trim().to_lowercase().replace(' ', "-")
}
