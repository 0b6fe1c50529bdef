//! Telegram Bot API client — long polling + message sending.

use async_trait::async_trait;
use futures::stream::Stream;
use irisfarm_core::config::TelegramConfig;
use irisfarm_core::error::{FarmError, Result};
use irisfarm_core::transport::CommandTransport;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::types::{ApiResponse, Chat, Message, Update, User};

/// Long-poll timeout for the steady-state update loop.
const LONG_POLL_SECS: u64 = 30;

/// Telegram Bot API client.
///
/// Clones share the HTTP connection pool; each clone tracks its own update
/// offset, so exactly one clone should poll for updates.
#[derive(Clone)]
pub struct TelegramClient {
    config: TelegramConfig,
    client: reqwest::Client,
    last_update_id: i64,
}

impl TelegramClient {
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            last_update_id: 0,
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "https://api.telegram.org/bot{}/{}",
            self.config.bot_token, method
        )
    }

    /// Validate the session token and fetch our own account.
    pub async fn get_me(&self) -> Result<User> {
        let response = self
            .client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map_err(|e| FarmError::Transport(format!("getMe failed: {e}")))?;
        let body: ApiResponse<User> = response
            .json()
            .await
            .map_err(|e| FarmError::Transport(format!("Invalid getMe response: {e}")))?;
        body.into_result()
    }

    /// Resolve a chat by id.
    pub async fn get_chat(&self, chat_id: i64) -> Result<Chat> {
        let response = self
            .client
            .get(self.api_url("getChat"))
            .query(&[("chat_id", chat_id.to_string())])
            .send()
            .await
            .map_err(|e| FarmError::Transport(format!("getChat failed: {e}")))?;
        let body: ApiResponse<Chat> = response
            .json()
            .await
            .map_err(|e| FarmError::Transport(format!("Invalid getChat response: {e}")))?;
        body.into_result().map_err(|e| match e {
            FarmError::Transport(msg) => {
                FarmError::ChatAccess(format!("getChat({chat_id}): {msg}"))
            }
            other => other,
        })
    }

    /// Send a text message.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });

        let response = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&body)
            .send()
            .await
            .map_err(|e| FarmError::Transport(format!("sendMessage failed: {e}")))?;

        let result: ApiResponse<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| FarmError::Transport(format!("Invalid send response: {e}")))?;

        result.into_result().map(|_| ())
    }

    /// Get updates using long polling.
    pub async fn get_updates(&mut self) -> Result<Vec<Update>> {
        self.get_updates_with_timeout(LONG_POLL_SECS).await
    }

    /// Fetch and confirm whatever is already queued, without waiting.
    ///
    /// Called once at startup so the polling loop only ever sees messages
    /// that arrived after this process came up; the returned backlog still
    /// feeds entity resolution and chat diagnostics.
    pub async fn drain_pending(&mut self) -> Result<Vec<Update>> {
        self.get_updates_with_timeout(0).await
    }

    async fn get_updates_with_timeout(&mut self, timeout_secs: u64) -> Result<Vec<Update>> {
        let response = self
            .client
            .get(self.api_url("getUpdates"))
            .query(&[
                ("offset", (self.last_update_id + 1).to_string()),
                ("timeout", timeout_secs.to_string()),
                ("allowed_updates", "[\"message\"]".into()),
            ])
            .send()
            .await
            .map_err(|e| FarmError::Transport(format!("getUpdates failed: {e}")))?;

        let body: ApiResponse<Vec<Update>> = response
            .json()
            .await
            .map_err(|e| FarmError::Transport(format!("Invalid getUpdates response: {e}")))?;

        let updates = body.into_result()?;
        if let Some(last) = updates.last() {
            self.last_update_id = last.update_id;
        }
        Ok(updates)
    }

    /// Start the polling loop — returns a stream of inbound messages.
    ///
    /// Every message with the filter left to the caller: the listener decides
    /// which senders and chats matter.
    pub fn start_polling(self) -> MessageStream {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut client = self;
            tracing::info!("Telegram polling loop started");

            loop {
                match client.get_updates().await {
                    Ok(updates) => {
                        for update in updates {
                            if let Some(msg) = update.message
                                && tx.send(msg).is_err()
                            {
                                tracing::info!("Telegram polling stopped (receiver dropped)");
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!("Telegram polling error: {e}");
                        tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;
                    }
                }

                tokio::time::sleep(tokio::time::Duration::from_secs(
                    client.config.poll_interval,
                ))
                .await;
            }
        });

        MessageStream { rx }
    }
}

/// Stream of inbound Telegram messages from polling.
pub struct MessageStream {
    rx: tokio::sync::mpsc::UnboundedReceiver<Message>,
}

impl Stream for MessageStream {
    type Item = Message;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Unpin for MessageStream {}

#[async_trait]
impl CommandTransport for TelegramClient {
    async fn send_command(&self, chat_id: i64, text: &str) -> Result<()> {
        self.send_message(chat_id, text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> TelegramClient {
        TelegramClient::new(TelegramConfig {
            bot_token: "123:abc".into(),
            poll_interval: 1,
        })
    }

    #[test]
    fn test_api_url() {
        let client = test_client();
        assert_eq!(
            client.api_url("sendMessage"),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn test_clone_keeps_offset() {
        let mut client = test_client();
        client.last_update_id = 99;
        let clone = client.clone();
        assert_eq!(clone.last_update_id, 99);
    }
}
