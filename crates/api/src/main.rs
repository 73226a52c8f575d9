//! DailyGithub API server

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

mod error;
mod routes;
mod state;

use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api=debug".parse()?)
                .add_directive("processor=debug".parse()?)
                .add_directive("verifier=debug".parse()?),
        )
        .init();

    info!("Starting DailyGithub API");

    // Load configuration
    let config = common::Config::from_env();

    // Connect to the cache
    let store = cache::RedisStore::connect(&config.redis_url).await?;
    let store: Arc<dyn cache::CacheStore> = Arc::new(store);

    // Create app state: verifier, intent handler, and refresher are
    // injected explicitly rather than registered globally
    let state = Arc::new(AppState::new(&config, store));

    let app = Router::new()
        .route("/", post(routes::assistant::fulfill).get(routes::hello))
        .route("/alexa", post(routes::alexa::webhook).get(routes::hello))
        .route("/token", post(routes::token::proxy))
        .route(
            "/tasks/refresh-trending",
            post(routes::tasks::refresh_trending),
        )
        .route("/health", get(routes::health::health))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
