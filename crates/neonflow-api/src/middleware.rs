use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use neonflow_types::models::{Role, User};

use crate::auth::AppState;
use crate::error::ApiError;

/// The authenticated account for the current request, inserted by
/// [`require_user`] and read by handlers and [`require_super_admin`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Resolve the caller from the `x-telegram-id` header.
///
/// The header is the identity issued at authentication time, re-presented by
/// the client on each call; no signature is re-verified here.
pub async fn require_user(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let telegram_id = req
        .headers()
        .get("x-telegram-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .ok_or_else(|| ApiError::Unauthorized("Missing telegram id".into()))?;

    let row = state
        .db
        .get_user(&telegram_id)?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;

    req.extensions_mut().insert(CurrentUser(row.into_user()));
    Ok(next.run(req).await)
}

/// Capability gate for publish and stats. Runs after [`require_user`].
pub async fn require_super_admin(req: Request, next: Next) -> Result<Response, ApiError> {
    let is_super_admin = req
        .extensions()
        .get::<CurrentUser>()
        .is_some_and(|current| current.0.role == Role::SuperAdmin);

    if !is_super_admin {
        return Err(ApiError::Forbidden("Super admin only".into()));
    }

    Ok(next.run(req).await)
}
