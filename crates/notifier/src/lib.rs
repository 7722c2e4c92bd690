//! Notification delivery.
//!
//! [`MessageSender`] is the raw capability (send text to a chat, report
//! success or failure). [`Notifier`] wraps a sender and turns every delivery
//! failure into a logged `false`, so callers in the poll loop never have to
//! handle a delivery error themselves.

pub mod telegram;

use std::future::Future;

use thiserror::Error;

pub use telegram::TelegramClient;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Transport error: {0}")]
    Transport(reqwest::Error),

    #[error("Messaging API returned HTTP {status}: {description}")]
    Api { status: u16, description: String },

    #[error("Messaging API rejected the message: {0}")]
    Rejected(String),
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL embeds the bot token.
        NotifyError::Transport(err.without_url())
    }
}

/// A channel able to deliver a plain-text message to a destination.
pub trait MessageSender: Send + Sync {
    fn send_text(
        &self,
        chat_id: &str,
        text: &str,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// Best-effort delivery on top of a [`MessageSender`].
pub struct Notifier<S> {
    sender: S,
}

impl<S: MessageSender> Notifier<S> {
    pub fn new(sender: S) -> Self {
        Self { sender }
    }

    /// Deliver `text` to `chat_id`.
    ///
    /// Returns `true` on confirmed delivery. Failures are logged here and
    /// reported as `false`; they never propagate.
    pub async fn send_message(&self, chat_id: &str, text: &str) -> bool {
        match self.sender.send_text(chat_id, text).await {
            Ok(()) => {
                tracing::debug!(chat_id, text, "Message delivered");
                true
            }
            Err(e) => {
                tracing::error!(chat_id, error = %e, "Failed to deliver message");
                false
            }
        }
    }
}
