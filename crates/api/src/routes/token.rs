//! OAuth token proxy
//!
//! Both voice platforms require the skill to own its token endpoint, and
//! Alexa's token request lacks the `Accept: application/json` header that
//! makes GitHub respond with JSON instead of a query string. So we replay
//! the token exchange against GitHub with the header forced, and return
//! GitHub's JSON body as-is.

use axum::body::Bytes;
use axum::http::header::ACCEPT;
use tracing::warn;

use crate::error::{ApiError, ApiResult};

const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";

pub async fn proxy(body: Bytes) -> ApiResult<String> {
    let client = reqwest::Client::new();
    let resp = client
        .post(GITHUB_TOKEN_URL)
        .header(ACCEPT, "application/json")
        .body(body)
        .send()
        .await
        .map_err(|e| {
            warn!("Token proxy request failed: {}", e);
            ApiError::Upstream(e.to_string())
        })?;

    resp.text()
        .await
        .map_err(|e| ApiError::Upstream(format!("bad response from Github: {e}")))
}
