//! Sign-in / sign-out endpoints

use axum::{
    extract::{Query, State},
    response::Redirect,
    Form, Json,
};
use chrono::Local;

use crate::{
    error::AppResult,
    models::visitor::{ExitVisitor, SubmitVisitor, VisitorSummary, WeekQuery},
    AppState,
};

/// Sign a visitor in
#[utoipa::path(
    post,
    path = "/submit",
    tag = "register",
    request_body(content = SubmitVisitor, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Visitor recorded, redirect to the confirmation page")
    )
)]
pub async fn submit(
    State(state): State<AppState>,
    Form(form): Form<SubmitVisitor>,
) -> AppResult<Redirect> {
    let now = Local::now().naive_local();
    state.services.visitors.sign_in(form, now).await?;
    Ok(Redirect::to("/confirmation"))
}

/// Sign a visitor out
#[utoipa::path(
    post,
    path = "/exit",
    tag = "register",
    request_body(content = ExitVisitor, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Departure recorded (or already recorded), redirect to the form"),
        (status = 400, description = "Malformed identifier", body = crate::error::ErrorResponse)
    )
)]
pub async fn exit(
    State(state): State<AppState>,
    Form(form): Form<ExitVisitor>,
) -> AppResult<Redirect> {
    let arrival = form.parse_arrival()?;
    let now = Local::now().naive_local();
    state.services.visitors.sign_out(arrival, now).await?;
    Ok(Redirect::to("/"))
}

/// List the visitors of a week
#[utoipa::path(
    get,
    path = "/visitors",
    tag = "register",
    params(WeekQuery),
    responses(
        (status = 200, description = "Visitors of the week, oldest first", body = Vec<VisitorSummary>),
        (status = 400, description = "Invalid week date", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_visitors(
    State(state): State<AppState>,
    Query(query): Query<WeekQuery>,
) -> AppResult<Json<Vec<VisitorSummary>>> {
    let day = query
        .anchor()?
        .unwrap_or_else(|| Local::now().date_naive());

    let visitors = state
        .services
        .visitors
        .list_week(day, query.open_only)
        .await?;
    Ok(Json(visitors))
}
