//! Shelfmark Library Lending Platform
//!
//! A Rust REST API server for a lending library, built around a
//! date-based availability scheduler that lets members borrow books
//! immediately or reserve them for future dates.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod scheduler;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
    /// Held for the readiness probe; all other access goes through services
    pub pool: sqlx::PgPool,
}
