//! Telegram Bot API delivery (`sendMessage`).

use serde::{Deserialize, Serialize};

use crate::{MessageSender, NotifyError};

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Plain-text Telegram client.
pub struct TelegramClient {
    http: reqwest::Client,
    api_url: String,
    bot_token: String,
}

impl TelegramClient {
    /// `api_url` is the Bot API base, e.g. `https://api.telegram.org`.
    /// Request timeouts are taken from `http`.
    pub fn new(
        http: reqwest::Client,
        api_url: impl Into<String>,
        bot_token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_url: api_url.into(),
            bot_token: bot_token.into(),
        }
    }

    fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_url.trim_end_matches('/'),
            self.bot_token
        )
    }
}

impl MessageSender for TelegramClient {
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<(), NotifyError> {
        let response = self
            .http
            .post(self.send_message_url())
            .json(&SendMessageRequest { chat_id, text })
            .send()
            .await?;

        let status = response.status();
        let body: Option<TelegramResponse> = response.json().await.ok();

        if !status.is_success() {
            return Err(NotifyError::Api {
                status: status.as_u16(),
                description: body
                    .and_then(|b| b.description)
                    .unwrap_or_else(|| status.to_string()),
            });
        }

        match body {
            Some(TelegramResponse { ok: true, .. }) => Ok(()),
            Some(TelegramResponse { description, .. }) => Err(NotifyError::Rejected(
                description.unwrap_or_else(|| "ok=false without description".to_string()),
            )),
            None => Err(NotifyError::Rejected(
                "response body is not a Bot API result".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_message_url_strips_trailing_slash() {
        let client = TelegramClient::new(
            reqwest::Client::new(),
            "https://api.telegram.org/",
            "123:abc",
        );
        assert_eq!(
            client.send_message_url(),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn test_request_serialization() {
        let body = serde_json::to_value(SendMessageRequest {
            chat_id: "42",
            text: "hi",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "chat_id": "42", "text": "hi" }));
    }
}
