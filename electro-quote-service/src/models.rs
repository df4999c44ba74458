use dialog_flow::{Answers, Calculation, Stage};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
    pub show_contact_form: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ContactRequest {
    pub phone: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
}

/// Active calculator dialog as reported by `GET /api/session/{id}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub calculator: String,
    pub stage: Stage,
    pub answers: Answers,
    pub calculation: Option<Calculation>,
    pub awaiting_contact: bool,
}
