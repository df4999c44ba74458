//! DialogRunner – convenience wrapper that loads a session, applies exactly **one** dialog turn,
//! and persists the updated session back to storage.
//!
//! ## When should you use `DialogRunner`?
//! * **Chat services**: one inbound message is one turn. The runner looks up the calculator that
//!   owns the session, feeds it the message, and saves (or discards) the session for the next
//!   roundtrip.
//! * **Terminal demos**: keeps demo code tiny; no need to repeat the load-advance-save
//!   boilerplate.
//!
//! ## When should you use `DialogEngine` directly?
//! * **Tests and batch pricing** where a [`Session`] lives on the stack and never touches
//!   storage.
//! * **Custom persistence** where you want to inspect the intermediate `Session` before saving.
//!
//! ## Locking
//! The runner itself does not serialize turns. Callers that may receive concurrent messages for
//! the same session hold [`DialogRunner::lock`] for the whole turn:
//! ```rust,ignore
//! let _guard = runner.lock(&session_id).await;
//! let result = runner.advance(&session_id, &message).await?;
//! ```
//!
//! ## Session lifecycle
//! - `start` creates or overwrites the session record.
//! - `advance` saves the session after every turn, except when the turn failed; a failed dialog
//!   cannot continue, so its session is deleted.
//! - `discard` ends the flow explicitly (cancellation, contact details received).

use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    answer::Answers,
    engine::{DialogEngine, TurnResult, TurnStatus},
    error::{FlowError, Result},
    lock::{SessionGuard, SessionLocks},
    registry::CalculatorRegistry,
    storage::{Session, SessionStorage},
};

/// High-level helper that orchestrates the common _load → advance → save_ pattern.
#[derive(Clone)]
pub struct DialogRunner {
    registry: Arc<CalculatorRegistry>,
    storage: Arc<dyn SessionStorage>,
    locks: Arc<SessionLocks>,
}

impl DialogRunner {
    /// Create a new `DialogRunner` from the enabled calculators and any `SessionStorage`.
    pub fn new(registry: Arc<CalculatorRegistry>, storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            registry,
            storage,
            locks: Arc::new(SessionLocks::new()),
        }
    }

    pub fn registry(&self) -> &CalculatorRegistry {
        &self.registry
    }

    /// Wait for exclusive access to `session_id`.
    pub async fn lock(&self, session_id: &str) -> SessionGuard {
        self.locks.acquire(session_id).await
    }

    /// Start the calculator registered as `calculator_id` for `session_id`.
    ///
    /// Fails with [`FlowError::CalculatorNotFound`] when the tag is not enabled.
    pub async fn start(
        &self,
        calculator_id: &str,
        session_id: &str,
        initial: Answers,
    ) -> Result<TurnResult> {
        let calculator = self
            .registry
            .get(calculator_id)
            .ok_or_else(|| FlowError::CalculatorNotFound(calculator_id.to_string()))?;

        let (session, result) = DialogEngine::start(calculator.as_ref(), session_id, initial);
        self.persist(session, &result).await?;
        Ok(result)
    }

    /// Apply one user reply to the active dialog of `session_id`.
    ///
    /// Fails with [`FlowError::SessionNotFound`] when no dialog is active.
    pub async fn advance(&self, session_id: &str, input: &str) -> Result<TurnResult> {
        // 1. Load session
        let mut session = self
            .storage
            .get(session_id)
            .await?
            .ok_or_else(|| FlowError::SessionNotFound(session_id.to_string()))?;

        // 2. Apply exactly one turn with the calculator that owns the session
        let calculator = self
            .registry
            .get(&session.calculator_id)
            .ok_or_else(|| FlowError::CalculatorNotFound(session.calculator_id.clone()))?;
        let result = DialogEngine::advance(calculator.as_ref(), &mut session, input);

        // 3. Persist new state so the next call starts where we left off
        self.persist(session, &result).await?;
        Ok(result)
    }

    /// The active dialog for `session_id`, if any.
    pub async fn active_session(&self, session_id: &str) -> Result<Option<Session>> {
        self.storage.get(session_id).await
    }

    /// End the dialog for `session_id`.
    pub async fn discard(&self, session_id: &str) -> Result<()> {
        info!(session_id = %session_id, "Discarding dialog session");
        self.storage.delete(session_id).await
    }

    async fn persist(&self, session: Session, result: &TurnResult) -> Result<()> {
        if result.status == TurnStatus::Failed {
            debug!(session_id = %session.id, "Dialog failed, dropping session");
            return self.storage.delete(&session.id).await;
        }
        self.storage.save(session).await
    }
}
