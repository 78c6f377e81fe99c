//! API integration tests, run in-process against the router

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Local, NaiveDateTime};
use lopdf::{content::Content, Document, Object};
use serde_json::Value;
use tower::ServiceExt;

use registre_server::{
    api,
    models::visitor::VisitorRecord,
    report::WeekWindow,
    repository::{MemoryStore, RecordStore},
    AppConfig, AppState,
};

fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
}

fn visitor(arrival: &str, last_name: &str) -> VisitorRecord {
    VisitorRecord {
        arrival: at(arrival),
        departure: None,
        first_name: Some("Marie".to_string()),
        last_name: Some(last_name.to_string()),
        company: Some("ACME".to_string()),
        reason: Some("Audit".to_string()),
        host: Some("M. Martin".to_string()),
        phone: None,
        signature: None,
    }
}

/// Build an app over a shared in-memory store
fn app(records: Vec<VisitorRecord>) -> (Router, Arc<MemoryStore>) {
    app_with_config(AppConfig::default(), records)
}

fn app_with_config(config: AppConfig, records: Vec<VisitorRecord>) -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::with_records(records));
    let state = AppState::new(config, store.clone());
    (api::create_router(state), store)
}

/// Text shown by the first page of a PDF
fn first_page_texts(pdf: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(pdf).expect("Failed to read PDF");
    let page_id = *doc.get_pages().values().next().expect("PDF has no page");
    let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
    content
        .operations
        .iter()
        .filter(|op| op.operator == "Tj")
        .filter_map(|op| match op.operands.first() {
            Some(Object::String(bytes, _)) => Some(bytes.iter().map(|&b| b as char).collect()),
            _ => None,
        })
        .collect()
}

fn current_title() -> String {
    WeekWindow::containing(Local::now().date_naive())
        .unwrap()
        .title()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body")
        .to_vec()
}

fn form_post(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = app(Vec::new());

    let response = app
        .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_form_page() {
    let (app, _) = app(Vec::new());

    let response = app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(html.contains("action=\"/submit\""));
    assert!(html.contains("name=\"signature\""));
}

#[tokio::test]
async fn test_submit_records_visitor() {
    let (app, store) = app(Vec::new());

    let response = app
        .oneshot(form_post(
            "/submit",
            "first_name=Marie&last_name=Dupont&company=ACME&reason=Audit&host=M.+Martin&signature=",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/confirmation");

    let records = store.load_all().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].last_name.as_deref(), Some("Dupont"));
    assert_eq!(records[0].host.as_deref(), Some("M. Martin"));
    assert_eq!(records[0].signature, None);
    assert!(records[0].is_open());
}

#[tokio::test]
async fn test_confirmation_page() {
    let (app, _) = app(Vec::new());

    let response = app
        .oneshot(Request::get("/confirmation").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_export_empty_register() {
    let (app, _) = app(Vec::new());
    let title_before = current_title();

    let response = app
        .oneshot(Request::get("/export").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"registre.pdf\""
    );
    let pdf = body_bytes(response).await;
    assert!(pdf.starts_with(b"%PDF"));

    // The window comes from today's date even without any record
    let texts = first_page_texts(&pdf);
    let title_after = current_title();
    assert!(texts.contains(&title_before) || texts.contains(&title_after));
    assert!(!texts.iter().any(|t| t.contains(':')));
}

#[tokio::test]
async fn test_export_uses_configured_filename() {
    let mut config = AppConfig::default();
    config.report.filename = "semaine.pdf".to_string();
    let (app, _) = app_with_config(config, Vec::new());

    let response = app
        .oneshot(Request::get("/export").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"semaine.pdf\""
    );
}

#[tokio::test]
async fn test_export_requested_week() {
    let (app, _) = app(vec![visitor("2024-06-10T09:00:00", "Dupont")]);

    let response = app
        .oneshot(
            Request::get("/export?week=2024-06-12")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let pdf = body_bytes(response).await;
    let doc = Document::load_mem(&pdf).unwrap();
    assert_eq!(doc.get_pages().len(), 1);

    let texts = first_page_texts(&pdf);
    assert!(texts.contains(&"Registre de la semaine du 2024-06-10 au 2024-06-17".to_string()));
    assert!(texts.contains(&"2024-06-10 09:00".to_string()));
    assert!(texts.contains(&"Dupont".to_string()));
}

#[tokio::test]
async fn test_export_rejects_bad_week() {
    let (app, _) = app(Vec::new());

    let response = app
        .oneshot(
            Request::get("/export?week=12-06-2024")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["error"], "BadValue");
}

#[tokio::test]
async fn test_week_beyond_calendar_is_bad_request() {
    for uri in [
        "/export?week=%2B262142-12-31",
        "/api/v1/visitors?week=%2B262142-12-31",
    ] {
        let (app, _) = app(Vec::new());
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body["error"], "BadValue");
    }
}

#[tokio::test]
async fn test_exit_rejects_malformed_arrival() {
    let (app, store) = app(vec![visitor("2024-06-10T09:00:00", "Dupont")]);

    let response = app
        .oneshot(form_post("/exit", "arrival=hier"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["error"], "BadValue");
    assert!(store.load_all().await.unwrap()[0].is_open());
}

#[tokio::test]
async fn test_exit_closes_open_visit() {
    let (app, store) = app(vec![visitor("2024-06-10T09:00:00", "Dupont")]);

    let response = app
        .oneshot(form_post("/exit", "arrival=2024-06-10T09%3A00%3A00"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");

    let records = store.load_all().await.unwrap();
    assert!(records[0].departure.is_some());
}

#[tokio::test]
async fn test_exit_on_closed_visit_is_noop() {
    let mut closed = visitor("2024-06-10T09:00:00", "Dupont");
    closed.departure = Some(at("2024-06-10T10:00:00"));
    let (app, store) = app(vec![closed]);

    let response = app
        .oneshot(form_post("/exit", "arrival=2024-06-10T09%3A00%3A00"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let records = store.load_all().await.unwrap();
    assert_eq!(records[0].departure, Some(at("2024-06-10T10:00:00")));
}

#[tokio::test]
async fn test_list_week_visitors() {
    let mut left = visitor("2024-06-11T14:00:00", "Bernard");
    left.departure = Some(at("2024-06-11T15:00:00"));
    let (app, _) = app(vec![
        left,
        visitor("2024-06-10T09:00:00", "Dupont"),
        visitor("2024-06-17T09:00:00", "Leroy"),
    ]);

    let response = app
        .oneshot(
            Request::get("/api/v1/visitors?week=2024-06-12")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["last_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Dupont", "Bernard"]);
    assert_eq!(body[0]["signed"], false);
}

#[tokio::test]
async fn test_list_open_visitors_only() {
    let mut left = visitor("2024-06-11T14:00:00", "Bernard");
    left.departure = Some(at("2024-06-11T15:00:00"));
    let (app, _) = app(vec![left, visitor("2024-06-10T09:00:00", "Dupont")]);

    let response = app
        .oneshot(
            Request::get("/api/v1/visitors?week=2024-06-10&open_only=true")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["last_name"], "Dupont");
}

#[tokio::test]
async fn test_openapi_document() {
    let (app, _) = app(Vec::new());

    let response = app
        .oneshot(
            Request::get("/api-docs/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(body["paths"]["/export"].is_object());
}
