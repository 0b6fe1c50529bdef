//! Transport seam — what the farmer needs from a messaging platform.

use async_trait::async_trait;

use crate::error::Result;

/// Message delivery as the command sender sees it.
///
/// Implementations report platform flood control as
/// [`FarmError::RateLimited`](crate::error::FarmError::RateLimited) so the
/// caller can reschedule with the signaled wait instead of treating it as a
/// failure.
#[async_trait]
pub trait CommandTransport: Send + Sync {
    /// Deliver `text` to the chat identified by `chat_id`.
    async fn send_command(&self, chat_id: i64, text: &str) -> Result<()>;
}
