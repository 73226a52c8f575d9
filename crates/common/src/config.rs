//! Application configuration

use std::env;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub redis_url: String,
    pub host: String,
    pub port: u16,
    /// Base URL of the trending-data provider
    pub trending_api_url: String,
    /// Maximum simultaneously in-flight trending fetches per refresh run
    pub refresh_concurrency: usize,
    /// Target average upstream request rate for a refresh run (requests/sec)
    pub refresh_avg_rps: f64,
    /// Hard deadline for a whole refresh run, in seconds
    pub refresh_deadline_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            trending_api_url: env::var("TRENDING_API_URL")
                .unwrap_or_else(|_| "https://api.gitterapp.com".to_string()),
            // A zero bound would stall every refresh run, so clamp to 1
            refresh_concurrency: env::var("REFRESH_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(20)
                .max(1),
            refresh_avg_rps: env::var("REFRESH_AVG_RPS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.5),
            refresh_deadline_secs: env::var("REFRESH_DEADLINE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60 * 60),
        }
    }
}
