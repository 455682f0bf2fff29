//! Webhook service for managing endpoints and sending order events.
//!
//! This module handles webhook endpoint registration, event delivery,
//! and HMAC signature generation for secure webhook verification.

use crate::error::AppError;
use crate::models::order::Order;
use crate::models::webhook::{
    NewWebhookEvent, WebhookEndpoint, WebhookEndpointRequest, WebhookEndpointResponse,
    WebhookPayload,
};
use crate::store::ShopStore;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Create a new webhook endpoint.
///
/// # Process
///
/// 1. Validate URL format
/// 2. Generate cryptographically secure secret (32 bytes)
/// 3. Store endpoint
/// 4. Return endpoint with secret (only shown once)
pub async fn create_webhook_endpoint(
    store: &dyn ShopStore,
    admin_id: Uuid,
    request: WebhookEndpointRequest,
) -> Result<WebhookEndpointResponse, AppError> {
    validate_webhook_url(&request.url)?;

    let secret = generate_secret();

    let endpoint = store
        .insert_webhook_endpoint(admin_id, &request.url, &secret)
        .await?;

    tracing::info!(endpoint_id = %endpoint.id, url = %endpoint.url, "webhook endpoint registered");

    Ok(WebhookEndpointResponse::from(endpoint).with_secret(secret))
}

/// List active webhook endpoints. Secrets are not returned.
pub async fn list_webhook_endpoints(
    store: &dyn ShopStore,
) -> Result<Vec<WebhookEndpointResponse>, AppError> {
    let endpoints = store.list_active_webhook_endpoints().await?;
    Ok(endpoints.into_iter().map(Into::into).collect())
}

/// Delete a webhook endpoint (soft delete, event history is kept).
pub async fn delete_webhook_endpoint(
    store: &dyn ShopStore,
    endpoint_id: Uuid,
) -> Result<(), AppError> {
    if !store.deactivate_webhook_endpoint(endpoint_id).await? {
        return Err(AppError::NotFound("Webhook endpoint"));
    }
    Ok(())
}

/// Send an `order.approved` event to all active endpoints.
///
/// Individual delivery failures are logged and do not stop the loop.
pub async fn notify_order_webhooks(
    store: &dyn ShopStore,
    client: &reqwest::Client,
    order: &Order,
) -> Result<(), AppError> {
    let endpoints = store.list_active_webhook_endpoints().await?;

    for endpoint in endpoints {
        if let Err(e) = send_webhook(store, client, &endpoint, order).await {
            tracing::error!(order_id = %order.id, url = %endpoint.url, error = ?e, "failed to send webhook");
        }
    }

    Ok(())
}

/// Send a single signed webhook and record the attempt.
///
/// # Headers Sent
///
/// - `Content-Type: application/json`
/// - `X-Webhook-Signature: sha256=<hex>`
/// - `X-Webhook-Event-Id: <uuid>`
async fn send_webhook(
    store: &dyn ShopStore,
    client: &reqwest::Client,
    endpoint: &WebhookEndpoint,
    order: &Order,
) -> Result<(), AppError> {
    let event_id = Uuid::new_v4();

    let payload = WebhookPayload::order_approved(event_id, order);
    let payload_value = serde_json::to_value(&payload)
        .map_err(|e| AppError::Internal(format!("Failed to serialize payload: {e}")))?;
    let payload_json = payload_value.to_string();

    let signature = generate_signature(&endpoint.secret, &payload_json)?;

    let response = client
        .post(&endpoint.url)
        .header("Content-Type", "application/json")
        .header("X-Webhook-Signature", &signature)
        .header("X-Webhook-Event-Id", event_id.to_string())
        .body(payload_json)
        .send()
        .await;

    let (status, body) = match response {
        Ok(resp) => {
            let status = resp.status().as_u16() as i32;
            let body = resp.text().await.ok();
            (Some(status), body)
        }
        Err(e) => {
            let error_msg = format!("Request failed: {e}");
            tracing::warn!(url = %endpoint.url, "{}", error_msg);
            (None, Some(error_msg))
        }
    };

    store
        .record_webhook_event(NewWebhookEvent {
            id: event_id,
            webhook_endpoint_id: endpoint.id,
            order_id: order.id,
            payload: payload_value,
            response_status: status,
            response_body: body,
        })
        .await
}

/// HMAC-SHA256 signature in the `sha256=<hex>` format.
///
/// Receivers recompute HMAC-SHA256(secret, request_body) and compare in
/// constant time.
pub fn generate_signature(secret: &str, payload: &str) -> Result<String, AppError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(format!("Invalid HMAC key: {e}")))?;
    mac.update(payload.as_bytes());
    Ok(format!("sha256={}", hex::encode(mac.finalize().into_bytes())))
}

/// 64 hex characters (32 random bytes).
fn generate_secret() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

/// Validate webhook URL format.
///
/// # Rules
///
/// - Must be valid URL
/// - Must be HTTPS (HTTP localhost allowed for development)
/// - Maximum 2048 characters
fn validate_webhook_url(url: &str) -> Result<(), AppError> {
    if url.len() > 2048 {
        return Err(AppError::InvalidWebhookUrl(
            "URL exceeds 2048 characters".to_string(),
        ));
    }

    let parsed = url::Url::parse(url)
        .map_err(|_| AppError::InvalidWebhookUrl("Invalid URL format".to_string()))?;

    match parsed.scheme() {
        "https" => Ok(()),
        "http" => {
            if matches!(
                parsed.host_str(),
                Some("localhost") | Some("127.0.0.1") | Some("0.0.0.0")
            ) {
                Ok(())
            } else {
                Err(AppError::InvalidWebhookUrl(
                    "HTTP is only allowed for localhost. Use HTTPS for production.".to_string(),
                ))
            }
        }
        _ => Err(AppError::InvalidWebhookUrl(
            "URL must use HTTP or HTTPS".to_string(),
        )),
    }
}
