//! HTTP handlers for webhook endpoint management.
//!
//! Admin-only endpoints to register, list, and delete the endpoints that
//! receive signed `order.approved` events.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::AppError;
use crate::models::user::AuthUser;
use crate::models::webhook::{WebhookEndpointRequest, WebhookEndpointResponse};
use crate::services::webhook_service;

/// Register a new webhook endpoint.
///
/// # Request Body
///
/// ```json
/// {
///   "url": "https://example.com/webhook"
/// }
/// ```
///
/// # Response
///
/// Returns 201 Created with the webhook endpoint details.
/// The `secret` is only returned once during creation.
///
/// ```json
/// {
///   "id": "550e8400-e29b-41d4-a716-446655440000",
///   "url": "https://example.com/webhook",
///   "secret": "a1b2c3d4e5f6...",
///   "is_active": true,
///   "created_at": "2025-01-15T10:30:00Z"
/// }
/// ```
///
/// # Security
///
/// - HTTPS URLs required (HTTP localhost allowed for development)
/// - Secret is 64-character hex string for HMAC-SHA256
pub async fn create_webhook(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<WebhookEndpointRequest>,
) -> Result<impl IntoResponse, AppError> {
    let endpoint =
        webhook_service::create_webhook_endpoint(state.store.as_ref(), auth.user_id, request)
            .await?;

    Ok((StatusCode::CREATED, Json(endpoint)))
}

/// List all active webhook endpoints. Secrets are never returned here.
pub async fn list_webhooks(
    State(state): State<AppState>,
) -> Result<Json<Vec<WebhookEndpointResponse>>, AppError> {
    let webhooks = webhook_service::list_webhook_endpoints(state.store.as_ref()).await?;

    Ok(Json(webhooks))
}

/// Delete a webhook endpoint (soft delete).
///
/// Returns 204 No Content, or 404 if the endpoint is unknown or already
/// inactive. Event history is kept.
pub async fn delete_webhook(
    State(state): State<AppState>,
    Path(webhook_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    webhook_service::delete_webhook_endpoint(state.store.as_ref(), webhook_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
