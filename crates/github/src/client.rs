//! GitHub REST API client for the account-linked intents

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("GitHub API error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// GitHub API client, authenticated with the voice user's OAuth token
pub struct GitHubClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

/// Authenticated user as returned by GitHub API
#[derive(Debug, Deserialize)]
pub struct GithubProfile {
    pub login: String,
    pub name: Option<String>,
    #[serde(default)]
    pub public_repos: i64,
    #[serde(default)]
    pub total_private_repos: i64,
    #[serde(default)]
    pub owned_private_repos: i64,
    #[serde(default)]
    pub followers: i64,
    #[serde(default)]
    pub following: i64,
}

/// Notification as returned by GitHub API
#[derive(Debug, Deserialize)]
pub struct GithubNotification {
    pub subject: NotificationSubject,
}

#[derive(Debug, Deserialize)]
pub struct NotificationSubject {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Issue as returned by GitHub API
#[derive(Debug, Deserialize)]
pub struct GithubIssue {
    pub title: String,
    pub user: IssueUser,
    pub created_at: DateTime<Utc>,
    pub repository: Option<IssueRepository>,
}

#[derive(Debug, Deserialize)]
pub struct IssueUser {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub struct IssueRepository {
    pub name: String,
}

impl GitHubClient {
    pub fn new(token: String) -> Self {
        Self::with_base_url(token, "https://api.github.com".to_string())
    }

    /// Base URL override for tests
    pub fn with_base_url(token: String, base_url: String) -> Self {
        let client = reqwest::Client::new();
        Self {
            client,
            token,
            base_url,
        }
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("daily-github/0.1"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        if let Ok(val) = HeaderValue::from_str(&format!("Bearer {}", self.token)) {
            headers.insert(AUTHORIZATION, val);
        }
        headers
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, ClientError> {
        debug!("GET {}", url);
        let resp = self.client.get(url).headers(self.headers()).send().await?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.json().await?)
    }

    /// Fetch the authenticated user's profile
    pub async fn profile(&self) -> Result<GithubProfile, ClientError> {
        let url = format!("{}/user", self.base_url);
        self.get(&url).await
    }

    /// Fetch the authenticated user's unread notifications
    pub async fn notifications(&self) -> Result<Vec<GithubNotification>, ClientError> {
        let url = format!("{}/notifications", self.base_url);
        self.get(&url).await
    }

    /// Fetch open issues assigned to the authenticated user
    pub async fn assigned_issues(&self) -> Result<Vec<GithubIssue>, ClientError> {
        let url = format!("{}/issues?filter=assigned&state=open", self.base_url);
        self.get(&url).await
    }
}
