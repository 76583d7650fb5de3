use axum::{Extension, Json, extract::State};

use neonflow_types::api::PostsResponse;
use neonflow_types::models::Role;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::CurrentUser;

/// Super admins see every post; everyone else sees their own.
pub async fn list_posts(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<PostsResponse>, ApiError> {
    let publisher = match user.role {
        Role::SuperAdmin => None,
        Role::User => Some(user.telegram_id.as_str()),
    };

    let rows = state.db.list_posts(publisher)?;
    Ok(Json(PostsResponse {
        posts: rows.into_iter().map(|row| row.into_post()).collect(),
    }))
}
