use dialog_flow::{ChatHistory, DialogRunner, InMemorySessionStorage};
use electro_quote_service::{
    ChatOrchestrator,
    calculators::{ALL_CALCULATORS, build_registry},
    dispatcher::Dispatcher,
    email::LogEmailClient,
    llm::{DEFAULT_SYSTEM_PROMPT, OfflineLlmClient},
    orchestrator::split_contact_marker,
};
use std::sync::Arc;

// A client asks for sockets, answers every question and leaves a phone number.
const SCRIPT: &[&str] = &[
    "Здравствуйте!",
    "нужны розетки",
    "1",  // apartment
    "2",  // brick
    "5",  // single sockets
    "0",  // double sockets
    "0",  // power sockets
    "2",  // single switches
    "0",  // double switches
    "0",  // other devices
    "2",  // standard complexity
    "Иван, +7 922 825 8279",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let enabled: Vec<String> = ALL_CALCULATORS.iter().map(|tag| tag.to_string()).collect();
    let runner = DialogRunner::new(
        Arc::new(build_registry(&enabled)),
        Arc::new(InMemorySessionStorage::new()),
    );
    let orchestrator = ChatOrchestrator::new(
        Dispatcher::new(runner),
        ChatHistory::new(),
        Arc::new(OfflineLlmClient),
        Arc::new(LogEmailClient),
        DEFAULT_SYSTEM_PROMPT,
    );

    let session_id = "demo_session";
    println!("Socket quote walkthrough, session {}\n", session_id);

    for message in SCRIPT {
        println!("-------");
        println!("Client: {}", message);
        let reply = orchestrator.handle_turn(session_id, message).await;
        let (text, show_contact_form) = split_contact_marker(&reply);
        println!("Bot: {}", text);
        if show_contact_form {
            println!("[contact form shown]");
        }
        println!();
    }

    let active = orchestrator
        .dispatcher()
        .runner()
        .active_session(session_id)
        .await?;
    println!("Active dialog after contact: {}", active.is_some());
    println!(
        "Messages kept after contact: {}",
        orchestrator.history().get_all_messages(session_id).await.len()
    );
    Ok(())
}
