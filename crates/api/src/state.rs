//! Application state

use std::sync::Arc;

use cache::CacheStore;
use common::Config;
use github::TrendingClient;
use processor::{IntentHandler, RefreshConfig, TrendingRefresher};
use std::time::Duration;
use verifier::AlexaVerifier;

/// Shared application state, injected into every route
pub struct AppState {
    pub verifier: AlexaVerifier,
    pub handler: IntentHandler,
    pub refresher: TrendingRefresher,
}

impl AppState {
    pub fn new(config: &Config, store: Arc<dyn CacheStore>) -> Self {
        let trending = TrendingClient::new(config.trending_api_url.clone());
        let refresh_config = RefreshConfig {
            max_concurrent: config.refresh_concurrency,
            avg_requests_per_second: config.refresh_avg_rps,
            deadline: Duration::from_secs(config.refresh_deadline_secs),
        };
        let refresher = TrendingRefresher::new(trending, Arc::clone(&store), refresh_config);
        let handler = IntentHandler::new(store);
        Self {
            verifier: AlexaVerifier::new(),
            handler,
            refresher,
        }
    }
}
