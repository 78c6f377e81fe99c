//! Registre - visitor sign-in register
//!
//! A small web service where visitors sign in on a kiosk form (identity,
//! host, reason, hand-drawn signature) and the site downloads a weekly
//! register as a paginated PDF table.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod report;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}

impl AppState {
    /// Wire the services over `store`
    pub fn new(config: AppConfig, store: Arc<dyn repository::RecordStore>) -> Self {
        let services = services::Services::new(store, &config.report);
        Self {
            config: Arc::new(config),
            services: Arc::new(services),
        }
    }
}
