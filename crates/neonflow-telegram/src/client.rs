use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;
use tokio::sync::OnceCell;

const API_BASE: &str = "https://api.telegram.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Telegram request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The authority answered `ok: false`; carries its description.
    #[error("{0}")]
    Api(String),
    #[error("Malformed Telegram response")]
    Malformed,
}

/// Every Bot API response wraps its result in this envelope.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

fn unwrap_envelope<T>(envelope: ApiEnvelope<T>) -> Result<T, TelegramError> {
    if !envelope.ok {
        return Err(TelegramError::Api(
            envelope
                .description
                .unwrap_or_else(|| "Telegram API error".into()),
        ));
    }
    envelope.result.ok_or(TelegramError::Malformed)
}

#[derive(Debug, Clone)]
pub struct ChatInfo {
    /// Canonical channel id, stringified.
    pub channel_id: String,
    pub title: String,
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SentMessage {
    pub message_id: i64,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatMember {
    status: String,
}

#[derive(Debug, Deserialize)]
struct BotProfile {
    id: i64,
}

/// The channel operations the binding and publish flows depend on, so they
/// can run against a stub in tests.
#[async_trait]
pub trait ChannelAuthority: Send + Sync {
    /// Resolve a user-supplied channel reference (id or @handle) to its
    /// canonical identity and metadata.
    async fn get_chat(&self, chat_ref: &str) -> Result<ChatInfo, TelegramError>;

    /// Whether the service account holds admin rights on the channel.
    async fn is_bot_admin(&self, channel_id: &str) -> Result<bool, TelegramError>;

    async fn send_message(&self, channel_id: &str, text: &str) -> Result<SentMessage, TelegramError>;
}

pub struct TelegramClient {
    http: Client,
    token: String,
    api_base: String,
    /// The bot's own id, fetched once per process. Concurrent first calls may
    /// race to populate; the cell keeps a single value.
    bot_id: OnceCell<String>,
}

impl TelegramClient {
    pub fn new(token: impl Into<String>) -> Result<Self, TelegramError> {
        Self::with_api_base(token, API_BASE)
    }

    /// Point the client at another base URL. Lets tests stand in for the API.
    pub fn with_api_base(
        token: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Result<Self, TelegramError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            token: token.into(),
            api_base: api_base.into(),
            bot_id: OnceCell::new(),
        })
    }

    pub async fn bot_id(&self) -> Result<&str, TelegramError> {
        self.bot_id
            .get_or_try_init(|| async {
                let me: BotProfile = self.call("getMe", json!({})).await?;
                Ok(me.id.to_string())
            })
            .await
            .map(String::as_str)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: serde_json::Value,
    ) -> Result<T, TelegramError> {
        let url = format!("{}/bot{}/{}", self.api_base, self.token, method);
        let response = self.http.post(url).json(&payload).send().await?;
        let envelope: ApiEnvelope<T> = response.json().await?;
        unwrap_envelope(envelope)
    }
}

#[async_trait]
impl ChannelAuthority for TelegramClient {
    async fn get_chat(&self, chat_ref: &str) -> Result<ChatInfo, TelegramError> {
        let chat: Chat = self.call("getChat", json!({ "chat_id": chat_ref })).await?;
        Ok(ChatInfo {
            channel_id: chat.id.to_string(),
            title: chat.title.unwrap_or_default(),
            username: chat.username.unwrap_or_default(),
        })
    }

    async fn is_bot_admin(&self, channel_id: &str) -> Result<bool, TelegramError> {
        let bot_id = self.bot_id().await?.to_string();
        let member: ChatMember = self
            .call(
                "getChatMember",
                json!({ "chat_id": channel_id, "user_id": bot_id }),
            )
            .await?;
        Ok(is_admin_status(&member.status))
    }

    async fn send_message(&self, channel_id: &str, text: &str) -> Result<SentMessage, TelegramError> {
        self.call("sendMessage", json!({ "chat_id": channel_id, "text": text }))
            .await
    }
}

fn is_admin_status(status: &str) -> bool {
    matches!(status, "administrator" | "creator")
}
