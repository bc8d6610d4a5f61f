//! Telegram Bot API notifier.
//!
//! API docs: https://core.telegram.org/bots/api#sendmessage
//! Auth: bot token embedded in the URL path.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use super::{Formatting, Notifier};
use crate::types::ScannerError;

const BASE_URL: &str = "https://api.telegram.org";
const CHANNEL_NAME: &str = "telegram";

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
}

pub struct TelegramNotifier {
    http: Client,
    token: SecretString,
    base_url: String,
}

impl TelegramNotifier {
    pub fn new(token: SecretString, timeout: Duration) -> Result<Self, ScannerError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| notify_error(format!("Failed to build HTTP client for Telegram: {e}")))?;

        Ok(Self {
            http,
            token,
            base_url: BASE_URL.to_string(),
        })
    }

    /// Point the client at a different API host (local bot server, tests).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn send_message_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.base_url, self.token.expose_secret())
    }
}

fn notify_error(message: String) -> ScannerError {
    ScannerError::Notify {
        channel: CHANNEL_NAME.to_string(),
        message,
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, chat_target: &str, text: &str, formatting: Formatting) -> Result<(), ScannerError> {
        let body = SendMessage {
            chat_id: chat_target,
            text,
            parse_mode: formatting.parse_mode(),
        };

        // reqwest errors carry the URL, which embeds the token.
        let resp = self
            .http
            .post(self.send_message_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| notify_error(format!("sendMessage request failed: {}", e.without_url())))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(notify_error(format!("sendMessage returned {status}: {body}")));
        }

        debug!(chat = chat_target, "Telegram message delivered");
        Ok(())
    }

    fn name(&self) -> &str {
        CHANNEL_NAME
    }
}
