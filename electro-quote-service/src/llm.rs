//! Language-model fallback for open conversation.
//!
//! Replies may carry a launch marker such as `ЗАПУСТИТЬ_КАЛЬКУЛЯТОР_РОЗЕТКИ`, which starts the
//! matching calculator, and the contact-form marker. Both are stripped before display.

use async_trait::async_trait;
use dialog_flow::{CONTACT_FORM_MARKER, ChatMessage, FlowError, MessageRole, Result};
use rig::{
    client::CompletionClient,
    completion::{Chat, Message},
    providers::openrouter,
};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Launch markers and the calculator each one starts.
pub const CALCULATOR_MARKERS: &[(&str, &str)] = &[
    ("ЗАПУСТИТЬ_КАЛЬКУЛЯТОР_РОЗЕТКИ", "socket"),
    ("ЗАПУСТИТЬ_КАЛЬКУЛЯТОР_ОСВЕЩЕНИЯ", "lighting"),
    ("ЗАПУСТИТЬ_КАЛЬКУЛЯТОР_ОСВЕЩЕНИЕ", "lighting"),
    ("ЗАПУСТИТЬ_КАЛЬКУЛЯТОР_ЩИТОВ", "panel"),
    ("ЗАПУСТИТЬ_КАЛЬКУЛЯТОР_ЩИТЫ", "panel"),
    ("ЗАПУСТИТЬ_КАЛЬКУЛЯТОР_КАБЕЛЕЙ", "cabling"),
    ("ЗАПУСТИТЬ_КАЛЬКУЛЯТОР_КАБЕЛЬ", "cabling"),
    ("ЗАПУСТИТЬ_МНОГОФУНКЦИОНАЛЬНЫЙ_КАЛЬКУЛЯТОР", "multi"),
    ("ЗАПУСТИТЬ_КАЛЬКУЛЯТОР", "general"),
];

pub const MODEL_UNAVAILABLE: &str = "Извините, я сейчас не могу обработать ваш запрос. \
Пожалуйста, попробуйте еще раз или свяжитесь с нами по телефону +7(909) 617-97-63.";
pub const EMPTY_REPLY: &str =
    "Извините, не смог сформировать ответ. Попробуйте переформулировать вопрос.";

pub const DEFAULT_SYSTEM_PROMPT: &str = "Ты виртуальный помощник компании САВБЕС, которая \
выполняет электромонтажные работы в Оренбурге. Отвечай кратко и по-русски. Рассказывай об \
услугах: монтаж розеток и выключателей, монтаж освещения, сборка и монтаж электрощитов, \
прокладка кабелей, электроснабжение промышленных объектов, электромонтаж по дизайн-проекту.\n\
Если клиент хочет узнать стоимость конкретной услуги, добавь в конец ответа одну команду: \
ЗАПУСТИТЬ_КАЛЬКУЛЯТОР_РОЗЕТКИ, ЗАПУСТИТЬ_КАЛЬКУЛЯТОР_ОСВЕЩЕНИЕ, ЗАПУСТИТЬ_КАЛЬКУЛЯТОР_ЩИТЫ, \
ЗАПУСТИТЬ_КАЛЬКУЛЯТОР_КАБЕЛЬ или ЗАПУСТИТЬ_МНОГОФУНКЦИОНАЛЬНЫЙ_КАЛЬКУЛЯТОР, если нужно \
несколько услуг сразу.\n\
Если клиент хочет связаться со специалистом, добавь в конец ответа [SHOW_CONTACT_FORM].";

/// One call to the language model.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub user_message: String,
    pub session_id: String,
    pub system_prompt: String,
    /// Earlier turns, oldest first, not including `user_message`.
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmReply {
    /// Raw model text, markers included.
    pub text: String,
    pub calculator_type: Option<String>,
    pub show_contact_form: bool,
}

impl LlmReply {
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            calculator_type: detect_marker(&text).map(|(_, tag)| tag.to_string()),
            show_contact_form: text.contains(CONTACT_FORM_MARKER),
            text,
        }
    }

    /// Text for the chat window, without any marker.
    pub fn display_text(&self) -> String {
        strip_markers(&self.text)
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Fails with [`FlowError::CollaboratorUnavailable`] when the model cannot answer.
    async fn complete(&self, request: LlmRequest) -> Result<LlmReply>;
}

/// Longest launch marker contained in `text`.
pub fn detect_marker(text: &str) -> Option<(&'static str, &'static str)> {
    CALCULATOR_MARKERS
        .iter()
        .filter(|(marker, _)| text.contains(marker))
        .max_by_key(|(marker, _)| marker.len())
        .copied()
}

pub fn strip_markers(text: &str) -> String {
    let mut text = text.replace(CONTACT_FORM_MARKER, "");
    while let Some((marker, _)) = detect_marker(&text) {
        text = text.replace(marker, "");
    }
    text.trim().to_string()
}

/// Prompt file contents, or [`DEFAULT_SYSTEM_PROMPT`] when it cannot be read.
pub fn load_system_prompt(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(prompt) if !prompt.trim().is_empty() => {
            info!(path = %path.display(), length = prompt.len(), "Loaded system prompt");
            prompt
        }
        Ok(_) => {
            warn!(path = %path.display(), "System prompt file is empty, using built-in prompt");
            DEFAULT_SYSTEM_PROMPT.to_string()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Using built-in system prompt");
            DEFAULT_SYSTEM_PROMPT.to_string()
        }
    }
}

fn to_rig_message(message: &ChatMessage) -> Message {
    match message.role {
        MessageRole::User => Message::user(message.content.clone()),
        MessageRole::Assistant => Message::assistant(message.content.clone()),
    }
}

/// OpenRouter-hosted model driven through a rig agent.
pub struct RigLlmClient {
    client: openrouter::Client,
    model: String,
    timeout: Duration,
}

impl RigLlmClient {
    pub fn new(api_key: &str, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: openrouter::Client::new(api_key),
            model: model.into(),
            timeout,
        }
    }
}

#[async_trait]
impl LlmClient for RigLlmClient {
    async fn complete(&self, request: LlmRequest) -> Result<LlmReply> {
        let agent = self
            .client
            .agent(&self.model)
            .preamble(&request.system_prompt)
            .build();
        let history: Vec<Message> = request.history.iter().map(to_rig_message).collect();

        info!(
            session_id = %request.session_id,
            model = %self.model,
            history = history.len(),
            "Calling language model"
        );
        let text = tokio::time::timeout(self.timeout, agent.chat(&request.user_message, history))
            .await
            .map_err(|_| {
                FlowError::CollaboratorUnavailable(format!(
                    "language model timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| FlowError::CollaboratorUnavailable(e.to_string()))?;

        let reply = LlmReply::from_text(text);
        debug!(
            session_id = %request.session_id,
            calculator = ?reply.calculator_type,
            contact_form = reply.show_contact_form,
            "Language model replied"
        );
        Ok(reply)
    }
}

/// Keyword-driven canned replies, used when no API key is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineLlmClient;

const OFFLINE_REPLIES: &[(&[&str], &str)] = &[
    (
        &["свет", "освещение", "светильник", "люстр"],
        "Я могу помочь вам рассчитать стоимость монтажа освещения. \
         ЗАПУСТИТЬ_КАЛЬКУЛЯТОР_ОСВЕЩЕНИЕ",
    ),
    (
        &["щит", "автомат", "узо", "электрощит"],
        "Давайте рассчитаем стоимость сборки и монтажа электрощита. ЗАПУСТИТЬ_КАЛЬКУЛЯТОР_ЩИТЫ",
    ),
    (
        &["розетк", "выключател", "проходной"],
        "Я помогу рассчитать стоимость установки розеток и выключателей. \
         ЗАПУСТИТЬ_КАЛЬКУЛЯТОР_РОЗЕТКИ",
    ),
    (
        &["кабел", "провод", "линия"],
        "Давайте рассчитаем стоимость кабельных работ. ЗАПУСТИТЬ_КАЛЬКУЛЯТОР_КАБЕЛЬ",
    ),
    (
        &["стоимость", "цена", "расчет", "посчитать"],
        "Я могу помочь рассчитать стоимость электромонтажных работ. ЗАПУСТИТЬ_КАЛЬКУЛЯТОР",
    ),
    (
        &["контакт", "телефон", "связаться"],
        "Для связи с нами, пожалуйста, оставьте свои контактные данные. [SHOW_CONTACT_FORM]",
    ),
    (
        &["привет", "здравствуй", "добрый", "здаров"],
        "Здравствуйте! Я виртуальный помощник компании САВБЕС. Мы предоставляем услуги \
         электромонтажа в Оренбурге. Чем могу помочь?",
    ),
];

const OFFLINE_INTRODUCTION: &str = "Я виртуальный помощник компании САВБЕС. Мы предоставляем \
услуги электромонтажа в Оренбурге. Могу рассказать о наших услугах или помочь рассчитать \
стоимость работ.";

#[async_trait]
impl LlmClient for OfflineLlmClient {
    async fn complete(&self, request: LlmRequest) -> Result<LlmReply> {
        let lowered = request.user_message.to_lowercase();
        let text = OFFLINE_REPLIES
            .iter()
            .find(|(words, _)| words.iter().any(|word| lowered.contains(word)))
            .map(|(_, reply)| *reply)
            .unwrap_or(OFFLINE_INTRODUCTION);
        debug!(session_id = %request.session_id, "Offline reply");
        Ok(LlmReply::from_text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(message: &str) -> LlmRequest {
        LlmRequest {
            user_message: message.to_string(),
            session_id: "s1".to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            history: Vec::new(),
        }
    }

    #[test]
    fn longest_marker_wins() {
        assert_eq!(
            detect_marker("Сейчас посчитаем. ЗАПУСТИТЬ_КАЛЬКУЛЯТОР_ЩИТОВ"),
            Some(("ЗАПУСТИТЬ_КАЛЬКУЛЯТОР_ЩИТОВ", "panel"))
        );
        assert_eq!(
            detect_marker("ЗАПУСТИТЬ_КАЛЬКУЛЯТОР"),
            Some(("ЗАПУСТИТЬ_КАЛЬКУЛЯТОР", "general"))
        );
        assert_eq!(detect_marker("Просто текст"), None);
    }

    #[test]
    fn markers_are_stripped_for_display() {
        let reply = LlmReply::from_text(
            "Оставьте телефон. [SHOW_CONTACT_FORM] ЗАПУСТИТЬ_МНОГОФУНКЦИОНАЛЬНЫЙ_КАЛЬКУЛЯТОР",
        );
        assert_eq!(reply.calculator_type.as_deref(), Some("multi"));
        assert!(reply.show_contact_form);
        assert_eq!(reply.display_text(), "Оставьте телефон.");
    }

    #[tokio::test]
    async fn offline_client_launches_calculators_by_keyword() {
        let reply = OfflineLlmClient.complete(request("Хочу повесить люстру")).await.unwrap();
        assert_eq!(reply.calculator_type.as_deref(), Some("lighting"));

        let reply = OfflineLlmClient.complete(request("Добрый день")).await.unwrap();
        assert!(reply.text.starts_with("Здравствуйте!"));
        assert_eq!(reply.calculator_type, None);
    }

    #[tokio::test]
    async fn service_questions_get_the_introduction() {
        let reply = OfflineLlmClient
            .complete(request("Какие услуги вы предоставляете?"))
            .await
            .unwrap();
        assert_eq!(reply.text, OFFLINE_INTRODUCTION);
        assert_eq!(reply.calculator_type, None);
    }

    #[test]
    fn missing_prompt_file_uses_built_in_prompt() {
        let prompt = load_system_prompt(Path::new("/nonexistent/system_prompt.txt"));
        assert_eq!(prompt, DEFAULT_SYSTEM_PROMPT);
    }
}
