// src/services/telegram.rs

//! Telegram Bot API notification sink.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::NotifyConfig;
use crate::services::NotificationSink;

/// Reply envelope of the Bot API.
#[derive(Debug, Deserialize)]
struct TelegramReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends each message to one chat via `sendMessage`.
pub struct TelegramSink {
    client: Client,
    endpoint: String,
    chat_id: String,
}

impl TelegramSink {
    /// Create a sink using an injected client.
    pub fn new(client: Client, config: &NotifyConfig) -> Self {
        Self {
            client,
            endpoint: format!(
                "{}/bot{}/sendMessage",
                config.api_base.trim_end_matches('/'),
                config.bot_token
            ),
            chat_id: config.chat_id.clone(),
        }
    }
}

/// 429 and 5xx are worth another attempt; everything else is final.
fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn interpret_reply(status: StatusCode, body: &str) -> Result<()> {
    match serde_json::from_str::<TelegramReply>(body) {
        Ok(reply) if reply.ok => Ok(()),
        Ok(reply) => Err(AppError::notify(
            format!(
                "HTTP {}: {}",
                status.as_u16(),
                reply.description.unwrap_or_else(|| "no description".into())
            ),
            is_transient_status(status),
        )),
        Err(_) => Err(AppError::notify(
            format!("HTTP {}: unreadable reply", status.as_u16()),
            is_transient_status(status),
        )),
    }
}

#[async_trait]
impl NotificationSink for TelegramSink {
    async fn deliver(&self, message: &str) -> Result<()> {
        // The endpoint embeds the bot token; keep it out of error messages.
        let response = self
            .client
            .post(&self.endpoint)
            .form(&[
                ("chat_id", self.chat_id.as_str()),
                ("text", message),
                ("parse_mode", "Markdown"),
            ])
            .send()
            .await
            .map_err(|e| AppError::Http(e.without_url()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Http(e.without_url()))?;

        interpret_reply(status, &body)?;
        log::debug!("Delivered message ({} chars)", message.chars().count());
        Ok(())
    }
}
