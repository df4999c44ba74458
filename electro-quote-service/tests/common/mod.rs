#![allow(dead_code)]

use async_trait::async_trait;
use dialog_flow::{ChatHistory, DialogRunner, InMemorySessionStorage, Result};
use electro_quote_service::{
    AppState, ChatOrchestrator,
    calculators::{ALL_CALCULATORS, build_registry},
    dispatcher::Dispatcher,
    email::{ClientRequest, EmailClient},
    llm::{DEFAULT_SYSTEM_PROMPT, OfflineLlmClient},
};
use std::sync::{Arc, Mutex};

/// Keeps every request instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<ClientRequest>>,
}

#[async_trait]
impl EmailClient for RecordingMailer {
    async fn send(&self, request: ClientRequest) -> Result<()> {
        self.sent.lock().unwrap().push(request);
        Ok(())
    }
}

pub fn orchestrator(mailer: Arc<RecordingMailer>) -> ChatOrchestrator {
    let enabled: Vec<String> = ALL_CALCULATORS.iter().map(|tag| tag.to_string()).collect();
    let runner = DialogRunner::new(
        Arc::new(build_registry(&enabled)),
        Arc::new(InMemorySessionStorage::new()),
    );
    ChatOrchestrator::new(
        Dispatcher::new(runner),
        ChatHistory::new(),
        Arc::new(OfflineLlmClient),
        mailer,
        DEFAULT_SYSTEM_PROMPT,
    )
}

pub fn app_state(mailer: Arc<RecordingMailer>) -> AppState {
    AppState {
        orchestrator: orchestrator(mailer),
        email_enabled: true,
    }
}
