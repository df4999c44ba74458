use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    answer::{Answers, Calculation},
    error::Result,
};

/// Where a session currently is in its calculator's dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", content = "step", rename_all = "snake_case")]
pub enum Stage {
    /// Waiting for the answer to the named step.
    Step(String),
    /// Calculation is final; waiting for the user's phone number.
    AwaitingContact,
}

/// One user's in-progress calculator dialog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub calculator_id: String,
    pub stage: Stage,
    pub answers: Answers,
    pub calculation: Option<Calculation>,
    pub formatted: Option<String>,
}

impl Session {
    pub fn new_for_calculator(sid: impl Into<String>, calculator_id: &str) -> Self {
        Self {
            id: sid.into(),
            calculator_id: calculator_id.to_string(),
            stage: Stage::Step(String::new()),
            answers: Answers::new(),
            calculation: None,
            formatted: None,
        }
    }

    /// Key of the step waiting for an answer, if any.
    pub fn current_step(&self) -> Option<&str> {
        match &self.stage {
            Stage::Step(key) if !key.is_empty() => Some(key),
            _ => None,
        }
    }

    pub fn awaiting_contact(&self) -> bool {
        self.stage == Stage::AwaitingContact
    }
}

/// Trait for storing and retrieving dialog sessions
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn save(&self, session: Session) -> Result<()>;
    async fn get(&self, id: &str) -> Result<Option<Session>>;
    async fn delete(&self, id: &str) -> Result<()>;
}

/// In-memory implementation of SessionStorage
#[derive(Default)]
pub struct InMemorySessionStorage {
    sessions: Arc<DashMap<String, Session>>,
}

impl InMemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStorage for InMemorySessionStorage {
    async fn save(&self, session: Session) -> Result<()> {
        self.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Session>> {
        Ok(self.sessions.get(id).map(|entry| entry.clone()))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.sessions.remove(id);
        Ok(())
    }
}
