pub mod answer;
pub mod calculator;
pub mod engine;
pub mod error;
pub mod history;
pub mod lock;
pub mod parse;
pub mod registry;
pub mod runner;
pub mod storage;

// Re-export commonly used types
pub use answer::{Answer, Answers, AnswersExt, Calculation, PRICE_KEY, TOTAL_PRICE_KEY};
pub use calculator::{Calculator, Step};
pub use engine::{CONTACT_FORM_MARKER, DialogEngine, TurnResult, TurnStatus};
pub use error::{FlowError, Result};
pub use history::{ChatHistory, ChatMessage, MessageRole};
pub use lock::{SessionGuard, SessionLocks};
pub use registry::{CalculatorRegistry, RegistryBuilder};
pub use runner::DialogRunner;
pub use storage::{InMemorySessionStorage, Session, SessionStorage, Stage};
