/// Telegram boundary for NeonFlow.
///
/// Two concerns live here: verifying the signed init-data payload the WebApp
/// runtime hands to the client (pure, no I/O), and talking to the Bot API for
/// chat metadata, membership checks and message delivery.
pub mod client;
pub mod init_data;

pub use client::{ChannelAuthority, ChatInfo, SentMessage, TelegramClient, TelegramError};
pub use init_data::{InitDataError, validate_init_data};
