//! In-app notification inbox.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    app::AppState,
    error::AppError,
    models::{notification::Notification, user::AuthUser},
};

/// `GET /api/v1/notifications`: the caller's notifications, newest first.
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<Notification>>, AppError> {
    let notifications = state.store.list_notifications(auth.user_id).await?;
    Ok(Json(notifications))
}

/// `POST /api/v1/notifications/{id}/read`
///
/// Returns 204 No Content, or 404 if the notification does not belong to
/// the caller.
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(notification_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state
        .store
        .mark_notification_read(auth.user_id, notification_id)
        .await?
    {
        return Err(AppError::NotFound("Notification"));
    }
    Ok(StatusCode::NO_CONTENT)
}
