use tracing::{debug, info, warn};

use crate::{
    answer::Answers,
    calculator::{Calculator, Step},
    storage::{Session, Stage},
};

/// Marker appended to a finished calculation; the chat widget replaces it with a contact form.
pub const CONTACT_FORM_MARKER: &str = "[SHOW_CONTACT_FORM]";

pub const CONTACT_REQUEST: &str = "\n\nХотите получить точный расчет и консультацию специалиста? \
Пожалуйста, оставьте свои контактные данные (имя, телефон, email), и наш мастер свяжется с вами \
в ближайшее время.";

pub const CALCULATION_FAILED: &str = "Произошла ошибка при расчете. Попробуйте еще раз.";
pub const BROKEN_STAGE: &str = "Ошибка состояния диалога. Начните заново.";
pub const RETRY_STEP: &str = "Не удалось распознать ответ. Попробуйте еще раз.";

/// Outcome of a single dialog turn
#[derive(Debug, Clone)]
pub struct TurnResult {
    pub response: String,
    pub status: TurnStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnStatus {
    /// A step prompt was returned
    AwaitingAnswer,
    /// The calculation is final and the session waits for contact details
    AwaitingContact,
    /// The dialog cannot continue; the session should be discarded
    Failed,
    /// No dialog is running and the reply only informs the user
    Unhandled,
}

impl TurnResult {
    fn awaiting_answer(response: String) -> Self {
        Self {
            response,
            status: TurnStatus::AwaitingAnswer,
        }
    }

    fn failed(response: &str) -> Self {
        Self {
            response: response.to_string(),
            status: TurnStatus::Failed,
        }
    }
}

/// Generic "ask, parse, advance or finish" driver shared by every calculator.
///
/// The engine is stateless; everything it needs lives on the [`Session`] it is handed.
pub struct DialogEngine;

impl DialogEngine {
    /// Create a session for `calculator`, pre-filled with any `initial` answers whose key is one
    /// of the calculator's steps, and return the first open question.
    pub fn start(
        calculator: &dyn Calculator,
        session_id: &str,
        initial: Answers,
    ) -> (Session, TurnResult) {
        let mut session = Session::new_for_calculator(session_id, calculator.id());
        session.answers = initial
            .into_iter()
            .filter(|(key, _)| calculator.steps().iter().any(|step| step.key == key.as_str()))
            .collect();

        info!(
            session_id = %session_id,
            calculator = %calculator.id(),
            known = session.answers.len(),
            "Starting calculator dialog"
        );

        let result = match Self::next_step(calculator, &session.answers) {
            Some(step) => {
                session.stage = Stage::Step(step.key.to_string());
                TurnResult::awaiting_answer(calculator.prompt(step, &session.answers))
            }
            None => Self::complete(calculator, &mut session),
        };
        (session, result)
    }

    /// Feed one user reply into the session's current step.
    pub fn advance(calculator: &dyn Calculator, session: &mut Session, input: &str) -> TurnResult {
        let Some(step_key) = session.current_step().map(str::to_string) else {
            warn!(session_id = %session.id, stage = ?session.stage, "Session has no open step");
            return TurnResult::failed(BROKEN_STAGE);
        };
        let Some(step) = calculator.steps().iter().find(|s| s.key == step_key) else {
            warn!(session_id = %session.id, step = %step_key, "Step is not part of calculator");
            return TurnResult::failed(BROKEN_STAGE);
        };

        let answer = match calculator.parse(step, input) {
            Ok(answer) => answer,
            Err(e) => {
                debug!(session_id = %session.id, step = %step.key, error = %e, "Answer rejected");
                let prompt = calculator.prompt(step, &session.answers);
                return TurnResult::awaiting_answer(format!("{RETRY_STEP}\n\n{prompt}"));
            }
        };

        debug!(session_id = %session.id, step = %step.key, answer = ?answer, "Answer stored");
        session.answers.insert(step.key.to_string(), answer);
        let acknowledgement = calculator.acknowledge(step, &session.answers);

        let mut result = match Self::next_step(calculator, &session.answers) {
            Some(next) => {
                session.stage = Stage::Step(next.key.to_string());
                TurnResult::awaiting_answer(calculator.prompt(next, &session.answers))
            }
            None => Self::complete(calculator, session),
        };
        if let Some(ack) = acknowledgement {
            result.response = format!("{ack}\n\n{}", result.response);
        }
        result
    }

    /// Compute and format the final quote. Any calculator error becomes the generic failure text.
    pub fn complete(calculator: &dyn Calculator, session: &mut Session) -> TurnResult {
        let formatted = calculator
            .calculate(&session.answers)
            .and_then(|calculation| {
                let text = calculator.format(&calculation)?;
                Ok((calculation, text))
            });

        match formatted {
            Ok((calculation, text)) if !calculation.is_empty() => {
                info!(
                    session_id = %session.id,
                    calculator = %calculator.id(),
                    total_price = calculation.total_price(),
                    "Calculation complete"
                );
                session.calculation = Some(calculation);
                session.formatted = Some(text.clone());
                session.stage = Stage::AwaitingContact;
                TurnResult {
                    response: format!("{text}{CONTACT_REQUEST}{CONTACT_FORM_MARKER}"),
                    status: TurnStatus::AwaitingContact,
                }
            }
            Ok(_) => {
                warn!(session_id = %session.id, calculator = %calculator.id(), "Empty calculation");
                TurnResult::failed(CALCULATION_FAILED)
            }
            Err(e) => {
                warn!(
                    session_id = %session.id,
                    calculator = %calculator.id(),
                    error = %e,
                    "Calculation failed"
                );
                TurnResult::failed(CALCULATION_FAILED)
            }
        }
    }

    /// First step, in list order, that applies and has no answer yet.
    pub fn next_step<'a>(calculator: &'a dyn Calculator, answers: &Answers) -> Option<&'a Step> {
        calculator
            .steps()
            .iter()
            .find(|step| !answers.contains_key(step.key) && calculator.applies(step, answers))
    }
}
