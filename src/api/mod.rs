//! HTTP handlers and routing for the register

pub mod export;
pub mod health;
pub mod openapi;
pub mod pages;
pub mod visitors;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Kiosk form and report download
    let register = Router::new()
        .route("/", get(pages::index))
        .route("/confirmation", get(pages::confirmation))
        .route("/submit", post(visitors::submit))
        .route("/exit", post(visitors::exit))
        .route("/export", get(export::export_week))
        .with_state(state.clone());

    // API v1 routes
    let api_v1 = Router::new()
        .route("/health", get(health::health_check))
        .route("/visitors", get(visitors::list_visitors))
        .with_state(state);

    Router::new()
        .merge(register)
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
