//! Liveness route
//!
//! Returns enough for a load balancer or uptime probe to identify which
//! service answered; anything deeper (Redis reachability, upstream state)
//! belongs in the refresh-task summary, not a liveness check.

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct Liveness {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

pub async fn health() -> Json<Liveness> {
    Json(Liveness {
        status: "ok",
        service: "daily-github",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_liveness_identifies_service() {
        let resp = health().await;
        let json = serde_json::to_value(&resp.0).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["service"], "daily-github");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }
}
