//! One chat turn: calculator dialog, contact capture or language model.

use dialog_flow::{CONTACT_FORM_MARKER, Calculation, ChatHistory, ChatMessage, Session};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::{error, info, warn};

use crate::dispatcher::{Dispatcher, GENERAL, MULTI};
use crate::email::{ClientRequest, EmailClient};
use crate::llm::{EMPTY_REPLY, LlmClient, LlmRequest, MODEL_UNAVAILABLE};

pub const CANCELLED: &str = "Расчет стоимости отменен. Чем еще я могу вам помочь?";
pub const PHONE_REQUIRED: &str =
    "Пожалуйста, укажите номер телефона для связи. Например: +7 922 825 8279";

const CANCEL_WORDS: &[&str] = &["отмена", "стоп", "прервать", "отменить"];

/// Questions about the company that share vocabulary with price requests.
const EXCLUDED_PHRASES: &[&str] = &[
    "какие есть услуги",
    "что за услуги",
    "какие услуги",
    "перечень услуг",
    "список услуг",
    "виды услуг",
    "ваши услуги",
    "услуги компании",
    "какие работы",
    "что делаете",
    "чем занимаетесь",
];

const CALCULATION_PHRASES: &[&str] = &[
    "расчет стоимости",
    "рассчитать стоимость",
    "сколько стоит",
    "калькулятор",
    "цена за",
    "стоимость работ",
    "во сколько обойдется",
    "посчитайте стоимость",
    "хочу рассчитать",
    "нужен расчет",
];

const MULTI_SERVICE_PHRASES: &[&str] = &[
    "несколько услуг",
    "комплекс услуг",
    "разные услуги",
    "много услуг",
    "все услуги",
    "комплексный",
    "мне надо несколько",
    "нужно несколько",
    "хочу несколько",
];

const SPECIFIC_NEED_PHRASES: &[&str] = &[
    "нужны розетки",
    "нужно освещение",
    "нужен щит",
    "нужна проводка",
    "установить розетки",
    "поставить выключатели",
    "подключить светильники",
    "монтаж розеток",
    "монтаж освещения",
    "монтаж щита",
    "проложить кабель",
    "провести проводку",
];

static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\+7|8)?[\s\-]?\(?\d{3}\)?[\s\-]?\d{3}[\s\-]?\d{2}[\s\-]?\d{2}")
        .expect("Invalid regex")
});
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("Invalid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Small talk and questions, answered by the language model.
    Chat,
    Calculate,
    /// Several services at once.
    CalculateMulti,
}

/// Phrase-based intent. Exclusions are checked before anything else.
pub fn detect_intent(message: &str) -> Intent {
    let lowered = message.to_lowercase();
    let mentions = |phrases: &[&str]| phrases.iter().any(|phrase| lowered.contains(phrase));

    if mentions(EXCLUDED_PHRASES) {
        Intent::Chat
    } else if mentions(CALCULATION_PHRASES) {
        Intent::Calculate
    } else if mentions(MULTI_SERVICE_PHRASES) {
        Intent::CalculateMulti
    } else if mentions(SPECIFIC_NEED_PHRASES) {
        Intent::Calculate
    } else {
        Intent::Chat
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDetails {
    pub phone: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Phone, email and name from a free-text chat message. `None` without a phone number.
pub fn parse_contact_message(message: &str) -> Option<ContactDetails> {
    let phone = PHONE.find(message)?.as_str().trim().to_string();
    let email = EMAIL.find(message).map(|m| m.as_str().to_string());

    let rest = PHONE.replace_all(message, "");
    let rest = EMAIL.replace_all(&rest, "");
    let name = rest.trim_matches(|c: char| c == ',' || c.is_whitespace());

    Some(ContactDetails {
        phone,
        name: (!name.is_empty()).then(|| name.to_string()),
        email,
    })
}

/// `text` without the contact-form marker, and whether the marker was there.
pub fn split_contact_marker(text: &str) -> (String, bool) {
    if text.contains(CONTACT_FORM_MARKER) {
        (text.replace(CONTACT_FORM_MARKER, "").trim().to_string(), true)
    } else {
        (text.to_string(), false)
    }
}

fn thank_you(phone: &str) -> String {
    format!(
        "Спасибо! Ваша заявка принята. Наш специалист свяжется с вами по телефону {phone} в \
         ближайшее время для уточнения деталей и согласования времени выезда.\n\nЧем еще я могу \
         вам помочь?"
    )
}

/// Everything a chat turn needs: dialogs, history and the two outside collaborators.
#[derive(Clone)]
pub struct ChatOrchestrator {
    dispatcher: Dispatcher,
    history: ChatHistory,
    llm: Arc<dyn LlmClient>,
    mailer: Arc<dyn EmailClient>,
    system_prompt: Arc<str>,
}

impl ChatOrchestrator {
    pub fn new(
        dispatcher: Dispatcher,
        history: ChatHistory,
        llm: Arc<dyn LlmClient>,
        mailer: Arc<dyn EmailClient>,
        system_prompt: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            dispatcher,
            history,
            llm,
            mailer,
            system_prompt: system_prompt.into(),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    /// Answer one user message. The reply may end with [`CONTACT_FORM_MARKER`].
    pub async fn handle_turn(&self, session_id: &str, message: &str) -> String {
        let _guard = self.dispatcher.runner().lock(session_id).await;

        let earlier = self.history.get_all_messages(session_id).await;
        self.history.add_user_message(session_id, message).await;

        let reply = self.respond(session_id, message, earlier).await;
        if !reply.ended {
            let (shown, _) = split_contact_marker(&reply.text);
            self.history.add_assistant_message(session_id, shown).await;
        }
        reply.text
    }

    /// Contact form submission. Ends any active dialog; `false` when the email could not be sent.
    pub async fn handle_contact_submission(
        &self,
        session_id: &str,
        phone: &str,
        name: Option<String>,
        email: Option<String>,
    ) -> bool {
        let _guard = self.dispatcher.runner().lock(session_id).await;

        let calculation = match self.dispatcher.runner().active_session(session_id).await {
            Ok(session) => session.and_then(|session| session.calculation),
            Err(e) => {
                error!(session_id = %session_id, error = %e, "Failed to load session");
                None
            }
        };
        let contact = ContactDetails {
            phone: phone.trim().to_string(),
            name: name.filter(|name| !name.trim().is_empty()),
            email: email.filter(|email| !email.trim().is_empty()),
        };
        self.submit_contact(session_id, contact, calculation).await
    }

    async fn respond(&self, session_id: &str, message: &str, earlier: Vec<ChatMessage>) -> Reply {
        match self.dispatcher.runner().active_session(session_id).await {
            Ok(Some(session)) => return self.continue_session(&session, message).await,
            Ok(None) => {}
            Err(e) => error!(session_id = %session_id, error = %e, "Failed to load session"),
        }

        let text = match detect_intent(message) {
            Intent::Calculate => {
                let details = Dispatcher::extract_details(message);
                self.dispatcher
                    .route(details.calculator, session_id, details.answers)
                    .await
                    .response
            }
            Intent::CalculateMulti => {
                let details = Dispatcher::extract_details(message);
                self.dispatcher
                    .route(MULTI, session_id, details.answers)
                    .await
                    .response
            }
            Intent::Chat => self.ask_model(session_id, message, earlier).await,
        };
        Reply::open(text)
    }

    async fn continue_session(&self, session: &Session, message: &str) -> Reply {
        let session_id = session.id.as_str();
        if CANCEL_WORDS.contains(&message.trim().to_lowercase().as_str()) {
            info!(
                session_id = %session_id,
                calculator = %session.calculator_id,
                "Calculation cancelled"
            );
            self.end_session(session_id).await;
            return Reply::closing(CANCELLED);
        }

        if !session.awaiting_contact() {
            let result = self.dispatcher.continue_dialog(session_id, message).await;
            return Reply::open(result.response);
        }

        match parse_contact_message(message) {
            Some(contact) => {
                let phone = contact.phone.clone();
                self.submit_contact(session_id, contact, session.calculation.clone())
                    .await;
                Reply::closing(thank_you(&phone))
            }
            None => Reply::open(PHONE_REQUIRED),
        }
    }

    async fn ask_model(
        &self,
        session_id: &str,
        message: &str,
        history: Vec<ChatMessage>,
    ) -> String {
        let request = LlmRequest {
            user_message: message.to_string(),
            session_id: session_id.to_string(),
            system_prompt: self.system_prompt.to_string(),
            history,
        };

        let reply = match self.llm.complete(request).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Language model unavailable");
                return MODEL_UNAVAILABLE.to_string();
            }
        };

        if let Some(tag) = reply.calculator_type.as_deref() {
            let details = Dispatcher::extract_details(message);
            let tag = if tag == GENERAL { details.calculator } else { tag };
            info!(
                session_id = %session_id,
                calculator = %tag,
                "Language model launched calculator"
            );
            return self
                .dispatcher
                .route(tag, session_id, details.answers)
                .await
                .response;
        }

        let text = reply.display_text();
        if text.is_empty() {
            warn!(session_id = %session_id, "Language model returned an empty reply");
            return EMPTY_REPLY.to_string();
        }
        if reply.show_contact_form {
            format!("{text}{CONTACT_FORM_MARKER}")
        } else {
            text
        }
    }

    /// Caller holds the session lock.
    async fn submit_contact(
        &self,
        session_id: &str,
        contact: ContactDetails,
        calculation: Option<Calculation>,
    ) -> bool {
        let request = ClientRequest {
            phone: contact.phone,
            name: contact.name,
            email: contact.email,
            history: self.history.get_all_messages(session_id).await,
            calculation,
        };

        let sent = match self.mailer.send(request).await {
            Ok(()) => true,
            Err(e) => {
                error!(session_id = %session_id, error = %e, "Failed to send client request");
                false
            }
        };

        self.end_session(session_id).await;
        sent
    }

    /// Drop the dialog and the transcript of `session_id`. Caller holds the session lock.
    async fn end_session(&self, session_id: &str) {
        if let Err(e) = self.dispatcher.runner().discard(session_id).await {
            error!(session_id = %session_id, error = %e, "Failed to discard session");
        }
        self.history.clear(session_id).await;
    }
}

/// Reply text plus whether it closed the conversation.
struct Reply {
    text: String,
    ended: bool,
}

impl Reply {
    fn open(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ended: false,
        }
    }

    fn closing(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ended: true,
        }
    }
}
