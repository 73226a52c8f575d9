//! Common types and utilities for DailyGithub

pub mod config;
pub mod error;
pub mod models;

pub use config::Config;
pub use error::{Error, Result};
