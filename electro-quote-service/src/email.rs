//! Client request notifications for the sales inbox.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dialog_flow::{Calculation, ChatMessage, FlowError, Result};
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use std::fmt::Write;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::EmailSettings;
use crate::pricing::{PROPERTY_TYPE_NAMES, WALL_MATERIAL_NAMES, display_name};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Everything the sales team gets about one client.
#[derive(Debug, Clone)]
pub struct ClientRequest {
    pub phone: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub history: Vec<ChatMessage>,
    pub calculation: Option<Calculation>,
}

#[async_trait]
pub trait EmailClient: Send + Sync {
    /// Fails with [`FlowError::CollaboratorUnavailable`]; callers log and carry on.
    async fn send(&self, request: ClientRequest) -> Result<()>;
}

pub fn request_subject(request: &ClientRequest) -> String {
    format!("Новая заявка с сайта САВБЕС - Номер телефона: {}", request.phone)
}

pub fn request_body(request: &ClientRequest, requested_at: DateTime<Utc>) -> String {
    let mut client_info = format!("Номер телефона: {}\n", request.phone);
    if let Some(name) = request.name.as_deref().filter(|name| !name.is_empty()) {
        let _ = writeln!(client_info, "Имя: {}", name);
    }
    if let Some(email) = request.email.as_deref().filter(|email| !email.is_empty()) {
        let _ = writeln!(client_info, "Email: {}", email);
    }

    let calculation = request
        .calculation
        .as_ref()
        .filter(|calculation| !calculation.is_empty())
        .map(calculation_summary)
        .unwrap_or_default();

    let history = request
        .history
        .iter()
        .map(|message| {
            let author = if message.is_user() { "Клиент" } else { "Бот" };
            format!(
                "{} {}: {}",
                message.timestamp.format(TIME_FORMAT),
                author,
                message.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "\nНовая заявка с сайта САВБЕС!\n\n{}\nВремя заявки: {}\n{}\n\nИстория диалога:\n{}\n",
        client_info,
        requested_at.format(TIME_FORMAT),
        calculation,
        history
    )
}

fn calculation_summary(calculation: &Calculation) -> String {
    let mut text = format!(
        "\n\nРезультаты расчета:\n• Общая стоимость: {} руб.\n",
        calculation.total_price()
    );
    if let Some(code) = calculation.get_str("property_type") {
        let _ = writeln!(text, "• Тип объекта: {}", display_name(PROPERTY_TYPE_NAMES, code));
    }
    if let Some(area) = calculation.get_f64("area") {
        let _ = writeln!(text, "• Площадь: {} кв.м", area);
    }
    if let Some(code) = calculation.get_str("wall_material") {
        let _ = writeln!(text, "• Материал стен: {}", display_name(WALL_MATERIAL_NAMES, code));
    }
    text
}

/// Sends requests through an SMTP relay.
pub struct SmtpEmailClient {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
    recipient: Mailbox,
    timeout: Duration,
}

impl SmtpEmailClient {
    pub fn new(settings: &EmailSettings) -> Result<Self> {
        let sender: Mailbox = settings
            .sender
            .parse()
            .with_context(|| format!("invalid sender address '{}'", settings.sender))?;
        let recipient: Mailbox = settings
            .recipient
            .parse()
            .with_context(|| format!("invalid recipient address '{}'", settings.recipient))?;

        let builder = if settings.smtp_port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.smtp_server)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp_server)
        }
        .with_context(|| format!("invalid SMTP server '{}'", settings.smtp_server))?;

        let transport = builder
            .port(settings.smtp_port)
            .credentials(Credentials::new(
                settings.sender.clone(),
                settings.password.clone(),
            ))
            .timeout(Some(settings.timeout))
            .build();

        Ok(Self {
            transport,
            sender,
            recipient,
            timeout: settings.timeout,
        })
    }

    fn message(&self, request: &ClientRequest) -> anyhow::Result<Message> {
        Message::builder()
            .from(self.sender.clone())
            .to(self.recipient.clone())
            .subject(request_subject(request))
            .header(ContentType::TEXT_PLAIN)
            .body(request_body(request, Utc::now()))
            .context("failed to build message")
    }
}

#[async_trait]
impl EmailClient for SmtpEmailClient {
    async fn send(&self, request: ClientRequest) -> Result<()> {
        let message = self
            .message(&request)
            .map_err(|e| FlowError::CollaboratorUnavailable(format!("{e:#}")))?;

        tokio::time::timeout(self.timeout, self.transport.send(message))
            .await
            .map_err(|_| FlowError::CollaboratorUnavailable("SMTP send timed out".to_string()))?
            .map_err(|e| FlowError::CollaboratorUnavailable(e.to_string()))?;

        info!(phone = %request.phone, recipient = %self.recipient, "Client request emailed");
        Ok(())
    }
}

/// Logs requests instead of sending them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEmailClient;

#[async_trait]
impl EmailClient for LogEmailClient {
    async fn send(&self, request: ClientRequest) -> Result<()> {
        info!(
            phone = %request.phone,
            name = ?request.name,
            email = ?request.email,
            total_price = ?request.calculation.as_ref().map(Calculation::total_price),
            "Email notifications disabled, client request logged"
        );
        debug!(body = %request_body(&request, Utc::now()), "Client request");
        Ok(())
    }
}
