//! Webhook models for endpoint registration and event delivery.
//!
//! # Webhook Flow
//!
//! 1. An admin registers an endpoint via `POST /api/v1/admin/webhooks`
//! 2. The service generates a secret for HMAC signature verification
//! 3. When an order is approved, every active endpoint receives a signed payload
//! 4. The receiver verifies the signature using the secret
//!
//! # Security
//!
//! - Secrets are only shown once during registration
//! - Payloads are signed using HMAC-SHA256
//! - HTTPS is required outside localhost

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::{catalog::ItemKind, order::Order};

/// Webhook endpoint registered by an admin.
///
/// The `secret` is stored in plaintext (required for HMAC generation)
/// but never returned in list operations.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WebhookEndpoint {
    pub id: Uuid,
    pub created_by: Uuid,
    pub url: String,
    pub secret: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Request to register a new webhook endpoint.
///
/// ```json
/// { "url": "https://example.com/webhook" }
/// ```
#[derive(Debug, Deserialize)]
pub struct WebhookEndpointRequest {
    pub url: String,
}

/// Response when registering or listing webhook endpoints.
///
/// `secret` is ONLY included when creating a new endpoint.
#[derive(Debug, Serialize)]
pub struct WebhookEndpointResponse {
    pub id: Uuid,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<WebhookEndpoint> for WebhookEndpointResponse {
    fn from(endpoint: WebhookEndpoint) -> Self {
        Self {
            id: endpoint.id,
            url: endpoint.url,
            secret: None,
            is_active: endpoint.is_active,
            created_at: endpoint.created_at,
        }
    }
}

impl WebhookEndpointResponse {
    /// Create response with secret included (only for registration).
    pub fn with_secret(mut self, secret: String) -> Self {
        self.secret = Some(secret);
        self
    }
}

/// A delivery attempt to be recorded in `webhook_events`.
#[derive(Debug, Clone)]
pub struct NewWebhookEvent {
    pub id: Uuid,
    pub webhook_endpoint_id: Uuid,
    pub order_id: Uuid,
    pub payload: serde_json::Value,
    pub response_status: Option<i32>,
    pub response_body: Option<String>,
}

/// Webhook payload sent to registered endpoints.
///
/// ```json
/// {
///   "event_type": "order.approved",
///   "event_id": "550e8400-e29b-41d4-a716-446655440000",
///   "created_at": "2025-01-15T10:30:00Z",
///   "data": {
///     "order": {
///       "id": "...",
///       "item_kind": "game_account",
///       "item_id": "...",
///       "coin_amount": 150,
///       "commission": 5,
///       "seller_amount": 145
///     }
///   }
/// }
/// ```
///
/// The request carries an `X-Webhook-Signature: sha256=<hex>` header computed
/// as HMAC-SHA256(secret, json_body).
#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub event_type: String,
    pub event_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub data: WebhookData,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookData {
    pub order: OrderWebhookData,
}

/// Subset of the order relevant to webhook consumers.
#[derive(Debug, Serialize, Deserialize)]
pub struct OrderWebhookData {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub item_kind: ItemKind,
    pub item_id: Uuid,
    pub item_title: String,
    pub coin_amount: i64,
    pub commission: i64,
    pub seller_amount: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Order> for OrderWebhookData {
    fn from(o: &Order) -> Self {
        Self {
            id: o.id,
            buyer_id: o.buyer_id,
            seller_id: o.seller_id,
            item_kind: o.item_kind,
            item_id: o.item_id,
            item_title: o.item_title.clone(),
            coin_amount: o.coin_amount,
            commission: o.commission,
            seller_amount: o.seller_amount,
            status: o.status.clone(),
            created_at: o.created_at,
        }
    }
}

impl WebhookPayload {
    pub fn order_approved(event_id: Uuid, order: &Order) -> Self {
        Self {
            event_type: "order.approved".to_string(),
            event_id,
            created_at: Utc::now(),
            data: WebhookData {
                order: order.into(),
            },
        }
    }
}
