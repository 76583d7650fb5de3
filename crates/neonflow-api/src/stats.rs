use axum::{Json, extract::State};

use neonflow_types::api::StatsResponse;

use crate::auth::AppState;
use crate::error::ApiError;

pub async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let users = state.db.count_users()?;
    let channels = state.db.count_channels()?;
    let posts = state.db.count_posts()?;

    Ok(Json(StatsResponse { users, channels, posts }))
}
