//! HTTP clients: the GitHub REST API and the trending-data provider

pub mod client;
pub mod trending;

pub use client::{ClientError, GitHubClient, GithubIssue, GithubNotification, GithubProfile};
pub use trending::{TrendingClient, TrendingError};
