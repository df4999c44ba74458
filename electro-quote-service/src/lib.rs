pub mod calculators;
pub mod config;
pub mod dispatcher;
pub mod email;
pub mod llm;
pub mod models;
pub mod orchestrator;
pub mod pricing;
pub mod service;

pub use config::Config;
pub use orchestrator::ChatOrchestrator;
pub use service::{AppState, build_router, create_app, create_app_state};
