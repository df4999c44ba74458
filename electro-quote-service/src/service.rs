use axum::{
    Router,
    extract::{Path, State},
    http::{HeaderValue, Request, StatusCode},
    middleware::{Next, from_fn},
    response::{Json, Response},
    routing::{get, post},
};
use dialog_flow::{ChatHistory, DialogRunner, InMemorySessionStorage};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Instrument, error, info, warn};
use uuid::Uuid;

use crate::{
    calculators::build_registry,
    config::Config,
    dispatcher::Dispatcher,
    email::{EmailClient, LogEmailClient, SmtpEmailClient},
    llm::{LlmClient, OfflineLlmClient, RigLlmClient, load_system_prompt},
    models::{ChatRequest, ChatResponse, ContactRequest, ContactResponse, SessionResponse},
    orchestrator::{ChatOrchestrator, split_contact_marker},
};

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<Value>)>;
type ApiError = (StatusCode, Json<Value>);

fn bad_request_error(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn not_found_error(message: &str, id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": message,
            "session_id": id
        })),
    )
}

fn internal_error(message: &str, details: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: ChatOrchestrator,
    /// Whether contact requests actually leave the building.
    pub email_enabled: bool,
}

pub fn create_app(config: &Config) -> Router {
    build_router(create_app_state(config))
}

pub fn create_app_state(config: &Config) -> AppState {
    let runner = DialogRunner::new(
        Arc::new(build_registry(&config.enabled_calculators)),
        Arc::new(InMemorySessionStorage::new()),
    );
    let (mailer, email_enabled) = create_mailer(config);

    let orchestrator = ChatOrchestrator::new(
        Dispatcher::new(runner),
        ChatHistory::with_max_messages(config.max_history_messages),
        create_llm_client(config),
        mailer,
        load_system_prompt(&config.system_prompt_path),
    );

    AppState {
        orchestrator,
        email_enabled,
    }
}

fn create_llm_client(config: &Config) -> Arc<dyn LlmClient> {
    match &config.openrouter_api_key {
        Some(key) => {
            info!(model = %config.llm_model, "Using OpenRouter language model");
            Arc::new(RigLlmClient::new(key, &config.llm_model, config.llm_timeout))
        }
        None => {
            warn!("OPENROUTER_API_KEY not set, answering with canned replies");
            Arc::new(OfflineLlmClient)
        }
    }
}

fn create_mailer(config: &Config) -> (Arc<dyn EmailClient>, bool) {
    if !config.email.enabled {
        info!("Email notifications disabled");
        return (Arc::new(LogEmailClient), false);
    }
    match SmtpEmailClient::new(&config.email) {
        Ok(client) => {
            info!(
                server = %config.email.smtp_server,
                port = config.email.smtp_port,
                "Email notifications enabled"
            );
            (Arc::new(client), true)
        }
        Err(e) => {
            error!(error = %e, "Invalid email settings, notifications disabled");
            (Arc::new(LogEmailClient), false)
        }
    }
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/api/chat", post(chat))
        .route("/api/contact", post(contact))
        .route("/api/session/{id}", get(get_session))
        .layer(from_fn(correlation_id_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Runs every request inside an `http_request` span tagged with a fresh correlation id.
async fn correlation_id_middleware(mut request: Request<axum::body::Body>, next: Next) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        request.headers_mut().insert("x-correlation-id", value);
    }

    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
    next.run(request).instrument(span).await
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Electrical Works Quote Assistant",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "POST /api/chat": "Send a chat message",
            "POST /api/contact": "Submit contact details",
            "GET /api/session/{id}": "Active calculator dialog",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> &'static str {
    "OK"
}

async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<ChatResponse> {
    let message = request.message.trim();
    if message.is_empty() {
        return Err(bad_request_error("Сообщение не может быть пустым"));
    }

    let session_id = request
        .session_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    info!(session_id = %session_id, length = message.len(), "Processing chat message");
    let reply = state.orchestrator.handle_turn(&session_id, message).await;
    let (response, show_contact_form) = split_contact_marker(&reply);

    Ok(Json(ChatResponse {
        response,
        session_id,
        show_contact_form,
    }))
}

async fn contact(
    State(state): State<AppState>,
    Json(request): Json<ContactRequest>,
) -> ApiResult<ContactResponse> {
    let phone = request.phone.trim();
    if phone.is_empty() {
        return Err(bad_request_error("Номер телефона обязателен"));
    }

    info!(session_id = %request.session_id, "Processing contact submission");
    let sent = state
        .orchestrator
        .handle_contact_submission(&request.session_id, phone, request.name, request.email)
        .await;

    let message = match (sent, state.email_enabled) {
        (true, true) => "Заявка отправлена!",
        (true, false) => "Данные сохранены!",
        (false, _) => "Ошибка отправки заявки",
    };
    Ok(Json(ContactResponse {
        success: sent,
        message: message.to_string(),
    }))
}

async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<SessionResponse> {
    match state
        .orchestrator
        .dispatcher()
        .runner()
        .active_session(&session_id)
        .await
    {
        Ok(Some(session)) => Ok(Json(SessionResponse {
            awaiting_contact: session.awaiting_contact(),
            session_id: session.id,
            calculator: session.calculator_id,
            stage: session.stage,
            answers: session.answers,
            calculation: session.calculation,
        })),
        Ok(None) => Err(not_found_error("Session not found", &session_id)),
        Err(e) => {
            error!(session_id = %session_id, error = %e, "Failed to load session");
            Err(internal_error("Failed to load session", &e.to_string()))
        }
    }
}
