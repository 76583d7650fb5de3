use axum::{Extension, Json, extract::State};
use chrono::Utc;
use tracing::error;
use uuid::Uuid;

use neonflow_db::Database;
use neonflow_telegram::ChannelAuthority;
use neonflow_types::api::{PublishRequest, PublishResponse};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::CurrentUser;

/// Publish a drafted text to a connected channel. The super-admin gate runs
/// in middleware before this handler is reached.
pub async fn publish(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<PublishRequest>,
) -> Result<Json<PublishResponse>, ApiError> {
    let channel_id = req
        .channel_id
        .map(|channel_id| channel_id.to_string())
        .unwrap_or_default();
    let text = req.text.unwrap_or_default();
    let prompt = req.prompt.unwrap_or_default();

    let (message_id, post_id) = publish_post(
        &state.db,
        &state.telegram,
        &user.telegram_id,
        &channel_id,
        &text,
        &prompt,
    )
    .await?;

    Ok(Json(PublishResponse { message_id, post_id }))
}

/// Deliver first, record second. A failed delivery writes no Post; each
/// successful call appends a new one (a retry is a new broadcast, not a
/// replay).
pub async fn publish_post<A: ChannelAuthority>(
    db: &Database,
    authority: &A,
    telegram_id: &str,
    channel_id: &str,
    text: &str,
    prompt: &str,
) -> Result<(i64, String), ApiError> {
    if channel_id.is_empty() || text.is_empty() {
        return Err(ApiError::InvalidInput("Channel id and text are required".into()));
    }

    let message = authority
        .send_message(channel_id, text)
        .await
        .map_err(|e| ApiError::Authority(format!("Publish failed: {e}")))?;

    let post_id = Uuid::new_v4().to_string();
    if let Err(err) = db.insert_post(
        &post_id,
        prompt,
        text,
        channel_id,
        &message.message_id.to_string(),
        telegram_id,
        Utc::now(),
    ) {
        // The message is live in the channel but the local record is not;
        // this needs manual reconciliation, so it gets its own log line.
        error!(
            "post record lost after message {} was delivered to {}: {:#}",
            message.message_id, channel_id, err
        );
        return Err(ApiError::Internal(err));
    }

    Ok((message.message_id, post_id))
}
