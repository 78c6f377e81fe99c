//! Static HTML pages of the sign-in kiosk

use axum::response::Html;

const INDEX_PAGE: &str = include_str!("../../templates/index.html");
const CONFIRMATION_PAGE: &str = include_str!("../../templates/confirmation.html");

/// Sign-in form with the signature canvas
pub async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

/// Shown after a successful sign-in
pub async fn confirmation() -> Html<&'static str> {
    Html(CONFIRMATION_PAGE)
}
