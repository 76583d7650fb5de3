use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{ChannelBinding, Post, Role};

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    /// Signed payload issued by the Telegram WebApp runtime.
    #[serde(default)]
    pub init_data: Option<String>,
    /// Plain identity, honored only when test auth is enabled.
    #[serde(default)]
    pub user: Option<TelegramUser>,
}

/// Telegram's own user object shape, as embedded in init data under the
/// `user` key and as sent directly in test mode.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub role: Role,
    pub telegram_id: String,
}

// -- Channels --

/// Clients may send a channel reference as a numeric id or as a string
/// (canonical id or @handle).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ChannelRef {
    Id(i64),
    Name(String),
}

impl fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelRef::Id(id) => write!(f, "{id}"),
            ChannelRef::Name(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectChannelRequest {
    #[serde(default)]
    pub channel_id: Option<ChannelRef>,
}

#[derive(Debug, Serialize)]
pub struct ConnectChannelResponse {
    pub channel: ChannelBinding,
}

#[derive(Debug, Serialize)]
pub struct ChannelsResponse {
    pub channels: Vec<ChannelBinding>,
}

// -- Publish --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    #[serde(default)]
    pub channel_id: Option<ChannelRef>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResponse {
    pub message_id: i64,
    pub post_id: String,
}

// -- Posts / stats --

#[derive(Debug, Serialize)]
pub struct PostsResponse {
    pub posts: Vec<Post>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub users: u64,
    pub channels: u64,
    pub posts: u64,
}

// -- Generation --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub generated_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_ref_accepts_number_or_string() {
        let req: ConnectChannelRequest =
            serde_json::from_str(r#"{"channelId": -100555}"#).unwrap();
        assert_eq!(req.channel_id.unwrap().to_string(), "-100555");

        let req: ConnectChannelRequest =
            serde_json::from_str(r#"{"channelId": "@news"}"#).unwrap();
        assert_eq!(req.channel_id.unwrap().to_string(), "@news");

        let req: ConnectChannelRequest = serde_json::from_str("{}").unwrap();
        assert!(req.channel_id.is_none());
    }

    #[test]
    fn auth_request_reads_camel_case_init_data() {
        let req: AuthRequest =
            serde_json::from_str(r#"{"initData": "auth_date=1&hash=ab"}"#).unwrap();
        assert_eq!(req.init_data.as_deref(), Some("auth_date=1&hash=ab"));
        assert!(req.user.is_none());
    }
}
