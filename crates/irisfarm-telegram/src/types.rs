//! Telegram Bot API wire types.

use irisfarm_core::error::{FarmError, Result};
use serde::{Deserialize, Serialize};

/// Envelope every Bot API method returns.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
    pub parameters: Option<ResponseParameters>,
}

/// Extra error detail; `retry_after` carries the flood-control wait.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseParameters {
    pub retry_after: Option<u64>,
    pub migrate_to_chat_id: Option<i64>,
}

impl<T> ApiResponse<T> {
    /// Unwrap the envelope, mapping API failures onto [`FarmError`].
    pub fn into_result(self) -> Result<T> {
        if self.ok {
            return self
                .result
                .ok_or_else(|| FarmError::Transport("empty result".into()));
        }
        if let Some(retry_after) = self.parameters.and_then(|p| p.retry_after) {
            return Err(FarmError::RateLimited { retry_after });
        }
        Err(FarmError::Transport(
            self.description
                .unwrap_or_else(|| "unknown Telegram API error".into()),
        ))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
    pub date: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub chat_type: String,
    pub title: Option<String>,
    pub username: Option<String>,
}

impl Chat {
    /// Best human-readable name for diagnostics.
    pub fn display_name(&self) -> &str {
        self.title
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or("<unnamed>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_update() {
        let raw = r#"{
            "ok": true,
            "result": [{
                "update_id": 7,
                "message": {
                    "message_id": 42,
                    "from": {"id": 707693258, "is_bot": true, "first_name": "Iris", "username": "iris_cm_bot"},
                    "chat": {"id": -1001234567890, "type": "supergroup", "title": "Farm chat"},
                    "text": "ЗАЧЁТ! Отлично!",
                    "date": 1754500000
                }
            }]
        }"#;
        let body: ApiResponse<Vec<Update>> = serde_json::from_str(raw).unwrap();
        let updates = body.into_result().unwrap();
        assert_eq!(updates.len(), 1);
        let msg = updates[0].message.as_ref().unwrap();
        assert_eq!(msg.chat.id, -1001234567890);
        assert!(msg.from.as_ref().unwrap().is_bot);
        assert_eq!(msg.text.as_deref(), Some("ЗАЧЁТ! Отлично!"));
    }

    #[test]
    fn test_flood_wait_maps_to_rate_limited() {
        let raw = r#"{
            "ok": false,
            "error_code": 429,
            "description": "Too Many Requests: retry after 30",
            "parameters": {"retry_after": 30}
        }"#;
        let body: ApiResponse<serde_json::Value> = serde_json::from_str(raw).unwrap();
        match body.into_result() {
            Err(FarmError::RateLimited { retry_after }) => assert_eq!(retry_after, 30),
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[test]
    fn test_plain_error_maps_to_transport() {
        let raw = r#"{"ok": false, "error_code": 400, "description": "Bad Request: chat not found"}"#;
        let body: ApiResponse<serde_json::Value> = serde_json::from_str(raw).unwrap();
        match body.into_result() {
            Err(FarmError::Transport(msg)) => assert!(msg.contains("chat not found")),
            other => panic!("expected Transport, got {other:?}"),
        }
    }

    #[test]
    fn test_chat_display_name() {
        let chat = Chat {
            id: 1,
            chat_type: "group".into(),
            title: None,
            username: Some("farmers".into()),
        };
        assert_eq!(chat.display_name(), "farmers");
    }
}
