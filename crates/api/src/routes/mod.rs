//! API routes

pub mod alexa;
pub mod assistant;
pub mod health;
pub mod tasks;
pub mod token;

/// GET on the webhook roots, kept for quick manual checks
pub async fn hello() -> &'static str {
    "Hello, world"
}
