use std::sync::Arc;

use axum::{Json, extract::State};
use chrono::Utc;

use neonflow_db::Database;
use neonflow_telegram::{TelegramClient, validate_init_data};
use neonflow_types::api::{AuthRequest, AuthResponse, TelegramUser};
use neonflow_types::models::Role;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub telegram: TelegramClient,
    pub bot_token: String,
    pub super_admin_id: String,
    pub allow_test_auth: bool,
}

/// Authenticate a mini-app user.
///
/// Production path verifies the signed init-data payload; the plain `user`
/// object is honored only when test auth is enabled. Either way the identity
/// is upserted and only `{role, telegramId}` goes back out.
pub async fn telegram_auth(
    State(state): State<AppState>,
    Json(req): Json<AuthRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    if state.allow_test_auth {
        if let Some(test_user) = &req.user {
            return resolve_identity(&state, test_user).map(Json);
        }
    }

    let init_data = req.init_data.unwrap_or_default();
    let fields = validate_init_data(&init_data, &state.bot_token)
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

    let user_raw = fields
        .get("user")
        .ok_or_else(|| ApiError::InvalidInput("Missing user data".into()))?;
    let user: TelegramUser = serde_json::from_str(user_raw)
        .map_err(|_| ApiError::InvalidInput("Malformed user data".into()))?;

    resolve_identity(&state, &user).map(Json)
}

/// Upsert the account and derive its role. The role check runs on every
/// authentication so a changed super-admin configuration takes effect on the
/// next login, not just at first creation.
fn resolve_identity(state: &AppState, user: &TelegramUser) -> Result<AuthResponse, ApiError> {
    let telegram_id = user.id.to_string();
    let role = Role::derive(&telegram_id, &state.super_admin_id);

    let row = state.db.upsert_user(
        &telegram_id,
        user.first_name.as_deref().unwrap_or(""),
        user.last_name.as_deref().unwrap_or(""),
        user.username.as_deref().unwrap_or(""),
        role.as_str(),
        Utc::now(),
    )?;

    Ok(AuthResponse {
        role: Role::from(row.role.as_str()),
        telegram_id: row.telegram_id,
    })
}
