use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::calculators::ALL_CALCULATORS;

/// Service settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub port: u16,
    /// Without a key the service answers open questions with canned replies.
    pub openrouter_api_key: Option<String>,
    pub llm_model: String,
    pub llm_timeout: Duration,
    pub system_prompt_path: PathBuf,
    pub email: EmailSettings,
    pub enabled_calculators: Vec<String>,
    pub max_history_messages: usize,
}

#[derive(Clone)]
pub struct EmailSettings {
    pub enabled: bool,
    pub sender: String,
    pub password: String,
    pub recipient: String,
    pub smtp_server: String,
    /// 465 means implicit TLS, anything else STARTTLS.
    pub smtp_port: u16,
    pub timeout: Duration,
}

impl fmt::Debug for EmailSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailSettings")
            .field("enabled", &self.enabled)
            .field("sender", &self.sender)
            .field("password", &"***")
            .field("recipient", &self.recipient)
            .field("smtp_server", &self.smtp_server)
            .field("smtp_port", &self.smtp_port)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Config {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`; missing or invalid values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let text = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let number = |key: &str, default: u64| parse_or(key, text(key), default);

        let enabled_calculators = text("ENABLED_CALCULATORS")
            .map(|list| {
                list.split(',')
                    .map(|tag| tag.trim().to_lowercase())
                    .filter(|tag| !tag.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| ALL_CALCULATORS.iter().map(|tag| tag.to_string()).collect());

        Self {
            bind_addr: text("BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or("PORT", text("PORT"), 5000),
            openrouter_api_key: text("OPENROUTER_API_KEY"),
            llm_model: text("LLM_MODEL").unwrap_or_else(|| "openai/gpt-4o-mini".to_string()),
            llm_timeout: Duration::from_secs(number("LLM_TIMEOUT_SECS", 30)),
            system_prompt_path: text("SYSTEM_PROMPT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("system_prompt.txt")),
            email: EmailSettings {
                enabled: text("ENABLE_EMAIL_NOTIFICATIONS")
                    .is_some_and(|value| value.eq_ignore_ascii_case("true")),
                sender: text("EMAIL_SENDER").unwrap_or_default(),
                password: text("EMAIL_PASSWORD").unwrap_or_default(),
                recipient: text("EMAIL_RECIPIENT").unwrap_or_default(),
                smtp_server: text("EMAIL_SMTP_SERVER")
                    .unwrap_or_else(|| "smtp.gmail.com".to_string()),
                smtp_port: parse_or("EMAIL_SMTP_PORT", text("EMAIL_SMTP_PORT"), 587),
                timeout: Duration::from_secs(number("EMAIL_TIMEOUT_SECS", 30)),
            },
            enabled_calculators,
            max_history_messages: parse_or(
                "MAX_HISTORY_MESSAGES",
                text("MAX_HISTORY_MESSAGES"),
                dialog_flow::history::DEFAULT_MAX_MESSAGES,
            ),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_or<T: FromStr + fmt::Display>(key: &str, value: Option<String>, default: T) -> T {
    match value {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(key = %key, value = %raw, default = %default, "Invalid setting, using default");
            default
        }),
    }
}
