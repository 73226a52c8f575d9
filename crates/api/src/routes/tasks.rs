//! Scheduled-task routes
//!
//! An external scheduler (cron) POSTs here; it is responsible for not
//! overlapping invocations. Each call drives one full refresh run and
//! returns its summary.

use std::sync::Arc;

use axum::{extract::State, Json};
use processor::{RefreshError, RefreshSummary};
use tracing::error;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub async fn refresh_trending(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<RefreshSummary>> {
    match state.refresher.run().await {
        Ok(summary) => Ok(Json(summary)),
        Err(e @ RefreshError::Catalog(_)) => {
            error!("Trending refresh aborted: {}", e);
            Err(ApiError::Upstream(e.to_string()))
        }
        Err(e @ RefreshError::DeadlineExceeded) => {
            error!("Trending refresh timed out: {}", e);
            Err(ApiError::Internal(e.to_string()))
        }
    }
}
