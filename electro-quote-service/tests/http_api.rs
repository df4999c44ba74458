mod common;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use common::{RecordingMailer, app_state};
use electro_quote_service::build_router;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

fn app(mailer: Arc<RecordingMailer>) -> Router {
    build_router(app_state(mailer))
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

#[tokio::test]
async fn health_check_answers_ok() {
    let app = app(Arc::new(RecordingMailer::default()));
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn chat_assigns_session_and_starts_dialog() {
    let app = app(Arc::new(RecordingMailer::default()));

    let (status, body) = post(&app, "/api/chat", json!({ "message": "нужны розетки" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["show_contact_form"], false);
    assert!(body["response"].as_str().unwrap().starts_with("Выберите тип объекта:"));

    let session_id = body["session_id"].as_str().unwrap().to_string();
    assert!(uuid::Uuid::parse_str(&session_id).is_ok());

    let (status, body) = get(&app, &format!("/api/session/{session_id}")).await;
    assert_eq!(status, StatusCode::OK);
    let session: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(session["calculator"], "socket");
    assert_eq!(session["awaiting_contact"], false);
}

#[tokio::test]
async fn finished_quote_shows_contact_form() {
    let app = app(Arc::new(RecordingMailer::default()));
    let mut body = Value::Null;
    for message in ["нужны розетки", "1", "2", "5", "0", "0", "2", "0", "0", "2"] {
        (_, body) = post(
            &app,
            "/api/chat",
            json!({ "message": message, "session_id": "web-1" }),
        )
        .await;
    }
    assert_eq!(body["show_contact_form"], true);
    assert!(!body["response"].as_str().unwrap().contains("[SHOW_CONTACT_FORM]"));
}

#[tokio::test]
async fn empty_message_is_rejected() {
    let app = app(Arc::new(RecordingMailer::default()));
    let (status, body) = post(&app, "/api/chat", json!({ "message": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Сообщение не может быть пустым");
}

#[tokio::test]
async fn contact_form_sends_request_and_clears_session() {
    let mailer = Arc::new(RecordingMailer::default());
    let app = app(mailer.clone());
    post(&app, "/api/chat", json!({ "message": "нужен щит", "session_id": "web-2" })).await;

    let (status, body) = post(
        &app,
        "/api/contact",
        json!({ "phone": "+79228258279", "name": "Анна", "session_id": "web-2" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "message": "Заявка отправлена!" }));
    assert_eq!(mailer.sent.lock().unwrap().len(), 1);

    let (status, _) = get(&app, "/api/session/web-2").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn contact_form_requires_phone() {
    let mailer = Arc::new(RecordingMailer::default());
    let app = app(mailer.clone());
    let (status, body) = post(
        &app,
        "/api/contact",
        json!({ "phone": "", "session_id": "web-3" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Номер телефона обязателен");
    assert!(mailer.sent.lock().unwrap().is_empty());
}
