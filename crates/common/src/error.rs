//! Error types

use thiserror::Error;

/// Main error type for DailyGithub
#[derive(Error, Debug)]
pub enum Error {
    #[error("GitHub API error: {0}")]
    GitHub(String),

    #[error("Trending upstream error: {0}")]
    Trending(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Request not authorized")]
    NotAuthorized,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
