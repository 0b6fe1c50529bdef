//! # IrisFarm Telegram
//! Telegram Bot API transport — long polling + message sending.

pub mod client;
pub mod types;

pub use client::{MessageStream, TelegramClient};
