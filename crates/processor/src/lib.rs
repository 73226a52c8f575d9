//! Intent processing and the trending-cache refresh job

pub mod fulfillment;
pub mod handler;
pub mod refresher;

pub use fulfillment::{Fulfillment, FulfillmentResponse};
pub use handler::IntentHandler;
pub use refresher::{RefreshConfig, RefreshError, RefreshSummary, TrendingRefresher};
