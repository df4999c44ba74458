use crate::{
    answer::{Answer, Answers, Calculation},
    error::Result,
};

/// One question in a calculator's dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Answer key; also the stage name stored on the session.
    pub key: &'static str,
    pub prompt: &'static str,
}

impl Step {
    pub const fn new(key: &'static str, prompt: &'static str) -> Self {
        Self { key, prompt }
    }
}

/// A priced-service dialog definition.
///
/// The engine only ever talks to this trait: it walks [`Calculator::steps`] in order, asks the
/// calculator to parse each answer, and once every applicable step is answered runs
/// [`Calculator::calculate`] followed by [`Calculator::format`].
pub trait Calculator: Send + Sync {
    /// Type tag used for routing, e.g. `"socket"`.
    fn id(&self) -> &str;

    /// Human readable service name.
    fn name(&self) -> &str;

    /// Ordered dialog steps.
    fn steps(&self) -> &[Step];

    /// Prompt for a step. Override when the question depends on earlier answers.
    fn prompt(&self, step: &Step, _answers: &Answers) -> String {
        step.prompt.to_string()
    }

    /// Whether `step` still has to be asked given the answers so far.
    fn applies(&self, _step: &Step, _answers: &Answers) -> bool {
        true
    }

    /// Parse a raw reply for `step`. Returns [`crate::FlowError::ParseFailure`] when the
    /// reply should be asked again.
    fn parse(&self, step: &Step, input: &str) -> Result<Answer>;

    /// Optional confirmation shown before the next prompt once `step` has been stored.
    fn acknowledge(&self, _step: &Step, _answers: &Answers) -> Option<String> {
        None
    }

    /// Turn the collected answers into a price breakdown. Must be a pure function of `answers`.
    fn calculate(&self, answers: &Answers) -> Result<Calculation>;

    /// Render a breakdown produced by [`Calculator::calculate`] as chat text.
    fn format(&self, calculation: &Calculation) -> Result<String>;
}
