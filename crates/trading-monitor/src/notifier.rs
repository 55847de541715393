//! Notifier implementations.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;
use trading_core::error::NotifyError;
use trading_core::traits::Notifier;

/// Telegram bot settings.
#[derive(Clone)]
pub struct TelegramConfig {
    pub token: String,
    pub chat_id: String,
    /// Prepended to every message, e.g. the bot's name
    pub prefix: String,
    pub timeout: Duration,
    pub base_url: String,
}

impl TelegramConfig {
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            chat_id: chat_id.into(),
            prefix: "🤖 [Bot]".to_string(),
            timeout: Duration::from_secs(5),
            base_url: "https://api.telegram.org".to_string(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("chat_id", &self.chat_id)
            .field("prefix", &self.prefix)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends messages through the Telegram Bot API `sendMessage` call.
pub struct TelegramNotifier {
    config: TelegramConfig,
    client: Client,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn format(&self, message: &str) -> String {
        if self.config.prefix.is_empty() {
            message.to_string()
        } else {
            format!("{} {}", self.config.prefix, message)
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        let url = format!(
            "{}/bot{}/sendMessage",
            self.config.base_url.trim_end_matches('/'),
            self.config.token
        );
        let text = self.format(message);

        let resp = self
            .client
            .get(&url)
            .query(&[("chat_id", self.config.chat_id.as_str()), ("text", text.as_str())])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NotifyError::Timeout(self.config.timeout)
                } else {
                    // the URL carries the token
                    NotifyError::Transport(e.without_url().to_string())
                }
            })?;

        let status = resp.status();
        let body: TelegramResponse = resp
            .json()
            .await
            .map_err(|e| NotifyError::Transport(e.without_url().to_string()))?;

        if !status.is_success() || !body.ok {
            return Err(NotifyError::Rejected(format!(
                "{}: {}",
                status,
                body.description.unwrap_or_default()
            )));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "telegram"
    }
}

/// Writes notifications to the log instead of an external service.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        info!(target: "notification", "{}", message);
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Keeps every message in memory.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    messages: Mutex<Vec<String>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent so far, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        self.messages
            .lock()
            .map_err(|e| NotifyError::Transport(e.to_string()))?
            .push(message.to_string());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
