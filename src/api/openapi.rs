//! OpenAPI documentation

use axum::{routing::get, Json, Router};
use utoipa::OpenApi;

use crate::api::{export, health, visitors};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Registre API",
        version = "1.0.0",
        description = "Visitor sign-in register with weekly PDF reports",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    paths(
        // Register forms
        visitors::submit,
        visitors::exit,
        export::export_week,
        // JSON API
        health::health_check,
        visitors::list_visitors,
    ),
    components(
        schemas(
            crate::models::visitor::SubmitVisitor,
            crate::models::visitor::ExitVisitor,
            crate::models::visitor::VisitorSummary,
            crate::models::visitor::WeekQuery,
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "register", description = "Visitor sign-in, sign-out and weekly export"),
        (name = "health", description = "Health check endpoints")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new().route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
}
