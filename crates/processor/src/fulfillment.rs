//! Spoken-fulfillment building
//!
//! Each variant renders SSML speech (without the outer `<speak>` wrapper,
//! which the platform layer adds) plus plain display text.

use common::models::TrendingProject;
use github::{GithubIssue, GithubNotification, GithubProfile};

/// Speech and display text for one answered intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FulfillmentResponse {
    pub speech: String,
    pub display_text: String,
}

/// Everything the backend knows how to say
#[derive(Debug)]
pub enum Fulfillment {
    ProfileSummary(GithubProfile),
    Trending {
        projects: Vec<TrendingProject>,
        count: usize,
    },
    Notifications(Vec<GithubNotification>),
    Issues(Vec<GithubIssue>),
    Text(String),
}

impl Fulfillment {
    pub fn build(&self) -> FulfillmentResponse {
        match self {
            Fulfillment::ProfileSummary(profile) => {
                let name = profile.name.as_deref().unwrap_or(&profile.login);
                let summary = format!(
                    "Hello {}. You currently have {} public repos, {} private repos, \
                     and you own {} of these private repos. You have {} followers \
                     and are following {} people.",
                    name,
                    profile.public_repos,
                    profile.total_private_repos,
                    profile.owned_private_repos,
                    profile.followers,
                    profile.following
                );
                FulfillmentResponse {
                    speech: summary.clone(),
                    display_text: summary,
                }
            }
            Fulfillment::Trending { projects, count } => {
                let shown = projects.len().min(*count);
                let mut speech = format!(
                    "<p>Here are the top {} trending repositories:</p>",
                    shown
                );
                let mut text = String::new();
                for (i, project) in projects.iter().take(shown).enumerate() {
                    speech.push_str(&format!(
                        "<p>#{}. {} by {}: {}</p>",
                        i + 1,
                        project.name,
                        project.author,
                        project.description
                    ));
                    text.push_str(&format!(
                        "\n#{}. {} by {}: {}",
                        i + 1,
                        project.name,
                        project.author,
                        project.description
                    ));
                }
                FulfillmentResponse {
                    speech,
                    display_text: text,
                }
            }
            Fulfillment::Notifications(notifications) => {
                let mut speech = if notifications.is_empty() {
                    "You have no unread notifications.".to_string()
                } else {
                    "<p>Here are your unread notifications:</p>".to_string()
                };
                let mut text = String::new();
                for (i, notification) in notifications.iter().enumerate() {
                    let line = format!(
                        "#{}: This notification is on an {} and says: {}",
                        i + 1,
                        notification.subject.kind,
                        notification.subject.title
                    );
                    speech.push_str(&format!("<p>{}</p>", line));
                    text.push_str(&format!("\n{}", line));
                }
                FulfillmentResponse {
                    speech,
                    display_text: text,
                }
            }
            Fulfillment::Issues(issues) => {
                let mut speech = if issues.is_empty() {
                    "You have no open issues assigned to you.".to_string()
                } else {
                    "<p>Here are the open issues assigned to you:</p>".to_string()
                };
                let mut text = String::new();
                for (i, issue) in issues.iter().enumerate() {
                    let repo = issue
                        .repository
                        .as_ref()
                        .map(|r| r.name.as_str())
                        .unwrap_or("a repository");
                    let line = format!(
                        "#{}: Opened in {} on {} by {}: {}",
                        i + 1,
                        repo,
                        issue.created_at.format("%A, %B %-d"),
                        issue.user.login,
                        issue.title
                    );
                    speech.push_str(&format!("<p>{}</p>", line));
                    text.push_str(&format!("\n{}", line));
                }
                FulfillmentResponse {
                    speech,
                    display_text: text,
                }
            }
            Fulfillment::Text(text) => FulfillmentResponse {
                speech: text.clone(),
                display_text: text.clone(),
            },
        }
    }
}
