use axum::{Extension, Json, extract::State};
use chrono::Utc;
use uuid::Uuid;

use neonflow_db::Database;
use neonflow_telegram::ChannelAuthority;
use neonflow_types::api::{ChannelsResponse, ConnectChannelRequest, ConnectChannelResponse};
use neonflow_types::models::ChannelBinding;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::CurrentUser;

pub async fn list_channels(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ChannelsResponse>, ApiError> {
    let rows = state.db.list_channels(&user.telegram_id)?;
    Ok(Json(ChannelsResponse {
        channels: rows.into_iter().map(|row| row.into_binding()).collect(),
    }))
}

pub async fn connect_channel(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<ConnectChannelRequest>,
) -> Result<Json<ConnectChannelResponse>, ApiError> {
    let channel_ref = req
        .channel_id
        .map(|channel_id| channel_id.to_string())
        .unwrap_or_default();

    let channel = bind_channel(&state.db, &state.telegram, &user.telegram_id, &channel_ref).await?;
    Ok(Json(ConnectChannelResponse { channel }))
}

/// The connect state machine: validate, resolve, authorize, persist.
/// Terminal on first failure; the admin check runs against the resolved
/// canonical id, never the raw reference, and nothing is written unless it
/// passed. Re-invocation for the same pair refreshes the existing binding.
pub async fn bind_channel<A: ChannelAuthority>(
    db: &Database,
    authority: &A,
    telegram_id: &str,
    channel_ref: &str,
) -> Result<ChannelBinding, ApiError> {
    if channel_ref.trim().is_empty() {
        return Err(ApiError::InvalidInput("Channel id is required".into()));
    }

    let info = authority.get_chat(channel_ref).await?;

    if !authority.is_bot_admin(&info.channel_id).await? {
        return Err(ApiError::InvalidInput("Bot is not admin in channel".into()));
    }

    let row = db.upsert_channel(
        &Uuid::new_v4().to_string(),
        &info.channel_id,
        &info.title,
        &info.username,
        telegram_id,
        Utc::now(),
    )?;

    Ok(row.into_binding())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use neonflow_telegram::{ChatInfo, SentMessage, TelegramError};

    /// Authority double: resolves every reference to one canonical channel
    /// and answers the admin check with a fixed verdict.
    struct StubAuthority {
        canonical_id: &'static str,
        is_admin: bool,
    }

    #[async_trait]
    impl ChannelAuthority for StubAuthority {
        async fn get_chat(&self, _chat_ref: &str) -> Result<ChatInfo, TelegramError> {
            Ok(ChatInfo {
                channel_id: self.canonical_id.to_string(),
                title: "News".into(),
                username: "news".into(),
            })
        }

        async fn is_bot_admin(&self, channel_id: &str) -> Result<bool, TelegramError> {
            // The binding flow must authorize against the resolved id.
            assert_eq!(channel_id, self.canonical_id);
            Ok(self.is_admin)
        }

        async fn send_message(
            &self,
            _channel_id: &str,
            _text: &str,
        ) -> Result<SentMessage, TelegramError> {
            unreachable!("connect never sends messages")
        }
    }

    /// Authority that fails every call, for the lookup-failure path.
    struct DownAuthority;

    #[async_trait]
    impl ChannelAuthority for DownAuthority {
        async fn get_chat(&self, _chat_ref: &str) -> Result<ChatInfo, TelegramError> {
            Err(TelegramError::Api("Bad Request: chat not found".into()))
        }

        async fn is_bot_admin(&self, _channel_id: &str) -> Result<bool, TelegramError> {
            Err(TelegramError::Api("unreachable".into()))
        }

        async fn send_message(
            &self,
            _channel_id: &str,
            _text: &str,
        ) -> Result<SentMessage, TelegramError> {
            Err(TelegramError::Api("unreachable".into()))
        }
    }

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[tokio::test]
    async fn connect_persists_the_canonical_identity() {
        let db = db();
        let authority = StubAuthority { canonical_id: "-100555", is_admin: true };

        let binding = bind_channel(&db, &authority, "42", "@news").await.unwrap();

        assert_eq!(binding.channel_id, "-100555");
        assert_eq!(binding.title, "News");
        assert!(binding.bot_is_admin);
        assert_eq!(binding.added_by, "42");
    }

    #[tokio::test]
    async fn connect_twice_keeps_a_single_binding() {
        let db = db();
        let authority = StubAuthority { canonical_id: "-100555", is_admin: true };

        let first = bind_channel(&db, &authority, "42", "@news").await.unwrap();
        let second = bind_channel(&db, &authority, "-100555", "@news").await.unwrap();

        assert_eq!(db.count_channels().unwrap(), 1);
        assert_eq!(second.id, first.id);
        assert!(second.created_at >= first.created_at);
    }

    #[tokio::test]
    async fn connect_without_admin_rights_writes_nothing() {
        let db = db();
        let authority = StubAuthority { canonical_id: "-100555", is_admin: false };

        let err = bind_channel(&db, &authority, "42", "@news").await.unwrap_err();

        assert!(matches!(err, ApiError::InvalidInput(ref reason) if reason.contains("not admin")));
        assert_eq!(db.count_channels().unwrap(), 0);
    }

    #[tokio::test]
    async fn empty_reference_fails_before_any_lookup() {
        let db = db();

        let err = bind_channel(&db, &DownAuthority, "42", "  ").await.unwrap_err();

        assert!(matches!(err, ApiError::InvalidInput(_)));
        assert_eq!(db.count_channels().unwrap(), 0);
    }

    #[tokio::test]
    async fn lookup_failure_surfaces_the_authority_description() {
        let db = db();

        let err = bind_channel(&db, &DownAuthority, "42", "@gone").await.unwrap_err();

        match err {
            ApiError::Authority(description) => {
                assert_eq!(description, "Bad Request: chat not found");
            }
            other => panic!("expected Authority error, got {other:?}"),
        }
        assert_eq!(db.count_channels().unwrap(), 0);
    }
}
