//! Domain models

use serde::{Deserialize, Serialize};

/// Cache key for the unfiltered "all languages" bucket
pub const ALL_LANGUAGES_KEY: &str = "all";

/// How many trending repos to speak when the user doesn't ask for a count
pub const DEFAULT_TRENDING_COUNT: usize = 5;

/// A programming language known to the trending upstream
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Language {
    /// Display name, e.g. "Apollo Guidance Computer"
    pub name: String,
    /// URL-safe identifier, e.g. "apollo-guidance-computer".
    /// Empty for the sentinel "all languages" pseudo-language.
    #[serde(rename = "urlname")]
    pub url_name: String,
}

impl Language {
    /// Sentinel pseudo-language meaning "no language filter"
    pub fn all() -> Self {
        Self {
            name: String::new(),
            url_name: String::new(),
        }
    }

    /// Key under which this language's trending data is cached
    pub fn cache_key(&self) -> &str {
        if self.url_name.is_empty() {
            ALL_LANGUAGES_KEY
        } else {
            &self.url_name
        }
    }
}

/// One trending repository as returned by the upstream
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrendingProject {
    pub name: String,
    pub author: String,
    #[serde(default)]
    pub description: String,
}

/// Ordered trending repositories for one language-or-all, as cached
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrendingProjectSet {
    pub data: Vec<TrendingProject>,
}

impl TrendingProjectSet {
    pub fn new(data: Vec<TrendingProject>) -> Self {
        Self { data }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A spoken intent the backend knows how to answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Summary of the linked GitHub profile
    Summary,
    /// Trending repos, optionally limited and filtered by spoken language name
    Trending {
        count: Option<usize>,
        language: Option<String>,
    },
    /// Unread notifications
    Notifications,
    /// Open issues assigned to the user
    AssignedIssues,
}

impl Intent {
    /// Whether answering this intent needs the user's GitHub OAuth token
    pub fn requires_access_token(&self) -> bool {
        !matches!(self, Intent::Trending { .. })
    }
}
