//! Alert delivery.
//!
//! Defines the `Notifier` trait and provides a Telegram implementation
//! plus a log-only fallback for runs without credentials.

pub mod telegram;

use async_trait::async_trait;
use tracing::info;

use crate::types::ScannerError;

/// Text markup understood by the delivery channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Formatting {
    Plain,
    Markdown,
    Html,
}

impl Formatting {
    /// Telegram `parse_mode` value; `None` for plain text.
    pub fn parse_mode(&self) -> Option<&'static str> {
        match self {
            Formatting::Plain => None,
            Formatting::Markdown => Some("Markdown"),
            Formatting::Html => Some("HTML"),
        }
    }
}

/// Abstraction over an alert sink.
///
/// Delivery failures are returned to the caller, which logs them; they
/// never abort a scan pass.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, chat_target: &str, text: &str, formatting: Formatting) -> Result<(), ScannerError>;

    /// Channel name for logging.
    fn name(&self) -> &str;
}

/// Writes alerts to the log instead of delivering them.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, chat_target: &str, text: &str, _formatting: Formatting) -> Result<(), ScannerError> {
        info!(target_chat = chat_target, text, "[LOG ONLY] Alert");
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}
