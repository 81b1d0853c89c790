//! Telegram chat interface.
//!
//! Long-polls the Bot API for updates and answers two commands:
//! `/start` (greeting) and `/points` (aggregated balances). Everything else
//! is ignored. Network errors are logged and polling resumes after a pause.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::ApiError;
use crate::points::PointAggregator;

// ============================================================================
// Constants
// ============================================================================

const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Long-poll duration passed to getUpdates
const POLL_TIMEOUT_SECS: u64 = 30;

/// Extra slack on top of the long-poll for the HTTP timeout
const HTTP_TIMEOUT_SLACK_SECS: u64 = 15;

/// Pause after a failed poll
const ERROR_BACKOFF_SECS: u64 = 5;

/// Telegram rejects messages longer than 4096 characters
const MAX_MESSAGE_CHARS: usize = 4000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Points,
}

impl Command {
    /// Parse `/points`, `/points@SomeBot` and friends; `None` for anything else
    pub fn parse(text: &str) -> Option<Self> {
        let first = text.split_whitespace().next()?;
        let name = first.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);
        match name.to_ascii_lowercase().as_str() {
            "start" | "hello" => Some(Self::Start),
            "points" | "point" => Some(Self::Points),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

pub struct Bot {
    client: Client,
    base_url: String,
    aggregator: PointAggregator,
}

impl Bot {
    pub fn new(token: &str, aggregator: PointAggregator) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(POLL_TIMEOUT_SECS + HTTP_TIMEOUT_SLACK_SECS))
            .build()
            .context("Failed to build bot HTTP client")?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{}", TELEGRAM_API_URL, token),
            aggregator,
        })
    }

    /// Poll until `shutdown` flips to true
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(accounts = self.aggregator.account_count(), "Chat bot started");
        tokio::select! {
            _ = self.poll_forever() => {}
            _ = shutdown.wait_for(|stop| *stop) => {
                info!("Chat bot stopped");
            }
        }
    }

    async fn poll_forever(&self) {
        let mut offset: i64 = 0;
        loop {
            match self.get_updates(offset).await {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        if let Err(e) = self.handle(update).await {
                            warn!(error = %format!("{:#}", e), "Failed to answer chat command");
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %format!("{:#}", e), retry_in_secs = ERROR_BACKOFF_SECS, "Polling for updates failed");
                    tokio::time::sleep(Duration::from_secs(ERROR_BACKOFF_SECS)).await;
                }
            }
        }
    }

    async fn handle(&self, update: Update) -> Result<()> {
        let Some(message) = update.message else {
            return Ok(());
        };
        let Some(command) = message.text.as_deref().and_then(Command::parse) else {
            return Ok(());
        };

        debug!(chat = message.chat.id, ?command, "Received command");
        let reply = self.reply_for(command).await;
        for chunk in split_message(&reply, MAX_MESSAGE_CHARS) {
            self.send_message(message.chat.id, &chunk).await?;
        }
        Ok(())
    }

    /// Text answering `command`
    pub async fn reply_for(&self, command: Command) -> String {
        match command {
            Command::Start => format!(
                "Hello! I'm keeping {} account(s) alive. Send /points for current balances.",
                self.aggregator.account_count()
            ),
            Command::Points => self.aggregator.summary().await,
        }
    }

    async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        let url = format!("{}/getUpdates", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("offset", offset.to_string()), ("timeout", POLL_TIMEOUT_SECS.to_string())])
            .send()
            .await
            .map_err(ApiError::from)
            .context("Failed to send getUpdates request")?;
        Self::unwrap_response(response).await
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let url = format!("{}/sendMessage", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&SendMessage { chat_id, text })
            .send()
            .await
            .map_err(ApiError::from)
            .context("Failed to send sendMessage request")?;
        Self::unwrap_response::<serde_json::Value>(response).await?;
        Ok(())
    }

    async fn unwrap_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await.context("Failed to read bot API response")?;
        if !status.is_success() {
            return Err(ApiError::from_status(status, &body).into());
        }
        parse_telegram_response(&body)
    }
}

fn parse_telegram_response<T: DeserializeOwned>(body: &str) -> Result<T> {
    let parsed: TelegramResponse<T> = serde_json::from_str(body)
        .map_err(|e| ApiError::InvalidResponse(format!("unexpected bot API payload: {}", e)))?;
    if !parsed.ok {
        return Err(ApiError::rejected(parsed.description.as_deref().unwrap_or_default()).into());
    }
    parsed
        .result
        .ok_or_else(|| ApiError::InvalidResponse("bot API response has no result".to_string()).into())
}

/// Split on line boundaries into chunks of at most `max_chars` characters.
/// A single over-long line is hard-split.
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.lines() {
        let mut line_chars: Vec<char> = line.chars().collect();
        while line_chars.len() > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = line_chars.split_off(max_chars);
            chunks.push(line_chars.into_iter().collect());
            line_chars = rest;
        }

        let len = line_chars.len();
        let needed = if current.is_empty() { len } else { len + 1 };
        if current_len + needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current.extend(line_chars);
        current_len += len;
    }

    if !current.is_empty() || chunks.is_empty() {
        chunks.push(current);
    }
    chunks
}
