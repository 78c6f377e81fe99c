//! Weekly PDF export endpoint

use axum::{
    extract::{Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use chrono::Local;

use crate::{
    error::{AppError, AppResult},
    models::visitor::WeekQuery,
    report::PDF_CONTENT_TYPE,
    AppState,
};

/// Download the weekly register
#[utoipa::path(
    get,
    path = "/export",
    tag = "register",
    params(WeekQuery),
    responses(
        (status = 200, description = "Weekly register as an application/pdf attachment"),
        (status = 400, description = "Invalid week date", body = crate::error::ErrorResponse),
        (status = 500, description = "Unreadable register", body = crate::error::ErrorResponse)
    )
)]
pub async fn export_week(
    State(state): State<AppState>,
    Query(query): Query<WeekQuery>,
) -> AppResult<Response> {
    let day = query
        .anchor()?
        .unwrap_or_else(|| Local::now().date_naive());

    let export = state.services.reports.export_week(day).await?;

    let filename = &state.config.report.filename;
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
        .map_err(|_| AppError::Internal(format!("Invalid report filename: {}", filename)))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(PDF_CONTENT_TYPE)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.pdf,
    )
        .into_response())
}
