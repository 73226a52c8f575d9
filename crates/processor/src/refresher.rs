//! Background refresh of the trending cache
//!
//! The upstream trending endpoint is slow and rate-sensitive, and the voice
//! platforms enforce a single-digit-second response ceiling, so live
//! requests only ever read the cache. This job repopulates it: one fetch
//! per known language plus the unfiltered bucket, shuffled, jittered, and
//! bounded by a semaphore so the upstream sees a steady trickle instead of
//! a burst.

use std::sync::Arc;
use std::time::Duration;

use cache::CacheStore;
use common::models::{Language, TrendingProjectSet};
use github::{TrendingClient, TrendingError};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum RefreshError {
    #[error("failed to fetch language catalog: {0}")]
    Catalog(#[from] TrendingError),
    #[error("refresh run exceeded its deadline")]
    DeadlineExceeded,
}

/// Configuration for one refresh run
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Maximum simultaneously in-flight upstream fetches
    pub max_concurrent: usize,
    /// Target average request rate across all workers (requests/sec)
    pub avg_requests_per_second: f64,
    /// Hard deadline for the whole run
    pub deadline: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 20,
            avg_requests_per_second: 0.5,
            deadline: Duration::from_secs(60 * 60),
        }
    }
}

/// Per-run outcome counts, returned to the task route
#[derive(Debug, Default, Clone, Serialize)]
pub struct RefreshSummary {
    pub written: usize,
    pub skipped_stale: usize,
    pub failed: usize,
}

enum KeyOutcome {
    Written,
    SkippedStale,
    Failed,
}

/// Drives one scatter-gather refresh of the trending cache
pub struct TrendingRefresher {
    trending: TrendingClient,
    store: Arc<dyn CacheStore>,
    config: RefreshConfig,
}

impl TrendingRefresher {
    pub fn new(trending: TrendingClient, store: Arc<dyn CacheStore>, config: RefreshConfig) -> Self {
        Self {
            trending,
            store,
            config,
        }
    }

    /// Run one full refresh. Fails only if the language catalog cannot be
    /// fetched or the deadline elapses; per-language failures are isolated
    /// and counted in the summary.
    pub async fn run(&self) -> Result<RefreshSummary, RefreshError> {
        let workers: Mutex<Vec<JoinHandle<KeyOutcome>>> = Mutex::new(Vec::new());
        match tokio::time::timeout(self.config.deadline, self.run_inner(&workers)).await {
            Ok(result) => result,
            Err(_) => {
                // In-flight fetches are abandoned, not left running;
                // writes that already landed stay.
                for handle in workers.lock().await.drain(..) {
                    handle.abort();
                }
                Err(RefreshError::DeadlineExceeded)
            }
        }
    }

    async fn run_inner(
        &self,
        workers: &Mutex<Vec<JoinHandle<KeyOutcome>>>,
    ) -> Result<RefreshSummary, RefreshError> {
        let mut languages = self.trending.languages().await?;
        languages.push(Language::all());

        info!("Refreshing trending cache for {} languages", languages.len());

        // Random order: no language is always first or last under time
        // pressure, and the upstream sees no predictable pattern.
        languages.shuffle(&mut rand::thread_rng());

        let jitter_window_secs = (self.config.max_concurrent as f64
            / self.config.avg_requests_per_second)
            .ceil() as u64;

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent));

        for language in languages {
            // Take the slot before spawning; the jitter sleep holds a
            // concurrency slot, which is what makes the aggregate rate
            // come out near max_concurrent / window.
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                break;
            };

            let trending = self.trending.clone();
            let store = Arc::clone(&self.store);
            let handle = tokio::spawn(async move {
                let _permit = permit;

                let secs = if jitter_window_secs > 0 {
                    rand::thread_rng().gen_range(0..jitter_window_secs)
                } else {
                    0
                };
                tokio::time::sleep(Duration::from_secs(secs)).await;

                refresh_one(&trending, store.as_ref(), &language).await
            });
            // Registered with the caller so a deadline expiry can abort
            // whatever is still running.
            workers.lock().await.push(handle);
        }

        // The run must not return while workers are still writing; the
        // triggering execution context may be torn down once we do.
        let mut summary = RefreshSummary::default();
        let mut workers = workers.lock().await;
        for handle in workers.iter_mut() {
            match handle.await {
                Ok(KeyOutcome::Written) => summary.written += 1,
                Ok(KeyOutcome::SkippedStale) => summary.skipped_stale += 1,
                Ok(KeyOutcome::Failed) => summary.failed += 1,
                Err(e) => {
                    error!("Refresh worker stopped abnormally: {}", e);
                    summary.failed += 1;
                }
            }
        }
        workers.clear();

        info!(
            "Refresh complete: {} written, {} skipped stale, {} failed",
            summary.written, summary.skipped_stale, summary.failed
        );
        Ok(summary)
    }
}

async fn refresh_one(
    trending: &TrendingClient,
    store: &dyn CacheStore,
    language: &Language,
) -> KeyOutcome {
    let key = language.cache_key();

    let projects = match trending.trending_today(&language.url_name).await {
        Ok(projects) => projects,
        Err(e) => {
            error!("Failed to fetch trending repos for {}: {}", key, e);
            return KeyOutcome::Failed;
        }
    };
    info!("Fetched {}: {} projects", key, projects.len());

    if projects.is_empty() {
        // An empty page against a key that already has data is treated as
        // a transient upstream failure, not "nothing trending today".
        // A failed cache read counts as no prior data and the write goes
        // ahead, so a bad read can't wedge a key.
        match store.get(key).await {
            Ok(Some(existing)) if !existing.is_empty() => {
                warn!(
                    "Skipping empty result for {}: cache already holds {} projects",
                    key,
                    existing.data.len()
                );
                return KeyOutcome::SkippedStale;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Cache read for {} failed ({}); treating as no prior data", key, e);
            }
        }
    }

    if let Err(e) = store.put(key, &TrendingProjectSet::new(projects)).await {
        error!("Failed to store trending data for {}: {}", key, e);
        return KeyOutcome::Failed;
    }
    KeyOutcome::Written
}

#[cfg(test)]
mod tests {
    use super::*;
    use cache::MemoryStore;
    use common::models::{TrendingProject, ALL_LANGUAGES_KEY};
    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn project(name: &str) -> serde_json::Value {
        serde_json::json!({"name": name, "author": "someone", "description": "a repo"})
    }

    fn set_of(names: &[&str]) -> TrendingProjectSet {
        TrendingProjectSet::new(
            names
                .iter()
                .map(|n| TrendingProject {
                    name: n.to_string(),
                    author: "someone".to_string(),
                    description: "a repo".to_string(),
                })
                .collect(),
        )
    }

    /// No jitter, short deadline; keeps tests fast
    fn test_config(max_concurrent: usize) -> RefreshConfig {
        RefreshConfig {
            max_concurrent,
            avg_requests_per_second: 1e6,
            deadline: Duration::from_secs(30),
        }
    }

    async fn mock_languages(server: &MockServer, languages: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/languages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(languages))
            .mount(server)
            .await;
    }

    async fn mock_trending(server: &MockServer, language: &str, response: ResponseTemplate) {
        let mock = Mock::given(method("GET")).and(path("/repositories"));
        let mock = if language.is_empty() {
            mock.and(query_param_is_missing("language"))
        } else {
            mock.and(query_param("language", language))
        };
        mock.respond_with(response).mount(server).await;
    }

    fn refresher(server: &MockServer, store: Arc<dyn CacheStore>, max: usize) -> TrendingRefresher {
        TrendingRefresher::new(TrendingClient::new(server.uri()), store, test_config(max))
    }

    #[tokio::test]
    async fn test_empty_result_does_not_clobber_existing_data() {
        let server = MockServer::start().await;
        mock_languages(&server, serde_json::json!([{"name": "Go", "urlname": "go"}])).await;
        mock_trending(&server, "go", ResponseTemplate::new(200).set_body_json(serde_json::json!([]))).await;
        mock_trending(&server, "", ResponseTemplate::new(200).set_body_json(serde_json::json!([]))).await;

        let store = Arc::new(MemoryStore::new());
        let prior = set_of(&["a", "b", "c"]);
        store.put("go", &prior).await.unwrap();

        let summary = refresher(&server, store.clone(), 20).run().await.unwrap();

        assert_eq!(store.get("go").await.unwrap().unwrap(), prior);
        assert_eq!(summary.skipped_stale, 1);
        // The unfiltered bucket had no prior data, so its empty write lands
        assert!(store
            .get(ALL_LANGUAGES_KEY)
            .await
            .unwrap()
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_empty_result_written_when_no_prior_entry() {
        let server = MockServer::start().await;
        mock_languages(&server, serde_json::json!([{"name": "Go", "urlname": "go"}])).await;
        mock_trending(&server, "go", ResponseTemplate::new(200).set_body_json(serde_json::json!([]))).await;
        mock_trending(&server, "", ResponseTemplate::new(200).set_body_json(serde_json::json!([]))).await;

        let store = Arc::new(MemoryStore::new());
        let summary = refresher(&server, store.clone(), 20).run().await.unwrap();

        assert!(store.get("go").await.unwrap().unwrap().is_empty());
        assert_eq!(summary.written, 2);
        assert_eq!(summary.skipped_stale, 0);
    }

    #[tokio::test]
    async fn test_partial_failure_is_isolated() {
        let server = MockServer::start().await;
        mock_languages(
            &server,
            serde_json::json!([
                {"name": "Go", "urlname": "go"},
                {"name": "Rust", "urlname": "rust"}
            ]),
        )
        .await;
        mock_trending(&server, "go", ResponseTemplate::new(500)).await;
        mock_trending(
            &server,
            "rust",
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([project("ripgrep"), project("tokio")])),
        )
        .await;
        mock_trending(
            &server,
            "",
            ResponseTemplate::new(200).set_body_json(serde_json::json!([project("linux")])),
        )
        .await;

        let store = Arc::new(MemoryStore::new());
        let prior_go = set_of(&["x", "y", "z"]);
        store.put("go", &prior_go).await.unwrap();

        let summary = refresher(&server, store.clone(), 20).run().await.unwrap();

        // go errored: prior data untouched
        assert_eq!(store.get("go").await.unwrap().unwrap(), prior_go);
        // rust succeeded: written
        assert_eq!(store.get("rust").await.unwrap().unwrap().data.len(), 2);
        // unfiltered bucket written under the sentinel key
        assert_eq!(
            store.get(ALL_LANGUAGES_KEY).await.unwrap().unwrap().data.len(),
            1
        );
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.written, 2);
    }

    #[tokio::test]
    async fn test_catalog_failure_aborts_run_without_writes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/languages"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        let result = refresher(&server, store.clone(), 20).run().await;

        assert!(matches!(result, Err(RefreshError::Catalog(_))));
        assert!(store.get(ALL_LANGUAGES_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrency_bound_serializes_fetches() {
        let server = MockServer::start().await;
        mock_languages(
            &server,
            serde_json::json!([
                {"name": "Go", "urlname": "go"},
                {"name": "Rust", "urlname": "rust"},
                {"name": "Zig", "urlname": "zig"}
            ]),
        )
        .await;
        let delayed = || {
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([project("p")]))
                .set_delay(Duration::from_millis(150))
        };
        mock_trending(&server, "go", delayed()).await;
        mock_trending(&server, "rust", delayed()).await;
        mock_trending(&server, "zig", delayed()).await;
        mock_trending(&server, "", delayed()).await;

        let store = Arc::new(MemoryStore::new());
        let start = std::time::Instant::now();
        let summary = refresher(&server, store, 1).run().await.unwrap();
        let elapsed = start.elapsed();

        assert_eq!(summary.written, 4);
        // With a bound of 1, the four 150 ms fetches cannot overlap
        assert!(
            elapsed >= Duration::from_millis(550),
            "fetches overlapped: {:?}",
            elapsed
        );
    }

    #[tokio::test]
    async fn test_deadline_aborts_in_flight_fetches() {
        let server = MockServer::start().await;
        mock_languages(&server, serde_json::json!([{"name": "Go", "urlname": "go"}])).await;
        mock_trending(
            &server,
            "go",
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([project("late")]))
                .set_delay(Duration::from_millis(400)),
        )
        .await;
        mock_trending(&server, "", ResponseTemplate::new(200).set_body_json(serde_json::json!([]))).await;

        let store = Arc::new(MemoryStore::new());
        let config = RefreshConfig {
            max_concurrent: 20,
            avg_requests_per_second: 1e6,
            deadline: Duration::from_millis(200),
        };
        let refresher =
            TrendingRefresher::new(TrendingClient::new(server.uri()), store.clone(), config);

        assert!(matches!(
            refresher.run().await,
            Err(RefreshError::DeadlineExceeded)
        ));

        // The go worker was aborted mid-fetch; its write must not land
        // even once the upstream delay elapses.
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(store.get("go").await.unwrap().is_none());
    }
}
