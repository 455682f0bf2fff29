//! Storage seam for every table the service touches.
//!
//! Services depend on `dyn ShopStore` so the purchase and review flows can be
//! exercised against the in-memory store in tests and against PostgreSQL in
//! production.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        catalog::{GameAccount, Product},
        notification::{NewNotification, Notification},
        order::{NewOrder, Order},
        request::{NewServiceRequest, RequestDecision, RequestFilter, ServiceRequest},
        user::User,
        webhook::{NewWebhookEvent, WebhookEndpoint},
    },
};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgShopStore;

#[async_trait]
pub trait ShopStore: Send + Sync {
    /// Cheap connectivity check used by `/health`.
    async fn ping(&self) -> Result<(), AppError>;

    // --- users & sessions ---

    /// User owning an active session with this token hash.
    async fn find_session_user(&self, token_hash: &str) -> Result<Option<User>, AppError>;

    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, AppError>;

    /// Case-insensitive lookup.
    async fn find_user_by_referral_code(&self, code: &str) -> Result<Option<User>, AppError>;

    /// Links `user_id` to `referrer_id` and credits the referrer `reward`
    /// coins as one unit. `None` when the user was already referred; on error
    /// neither write is kept.
    async fn redeem_referral(
        &self,
        user_id: Uuid,
        referrer_id: Uuid,
        reward: i64,
    ) -> Result<Option<i64>, AppError>;

    // --- coin ledger ---

    /// Buyer coin balance; a user without a ledger row has 0.
    async fn coin_balance(&self, user_id: Uuid) -> Result<i64, AppError>;

    /// Writes `new` only if the stored balance still equals `expected`.
    async fn compare_and_set_balance(
        &self,
        user_id: Uuid,
        expected: i64,
        new: i64,
    ) -> Result<bool, AppError>;

    /// Adds coins, creating the ledger row if needed. Returns the new balance.
    async fn credit_coins(&self, user_id: Uuid, amount: i64) -> Result<i64, AppError>;

    async fn seller_balance(&self, seller_id: Uuid) -> Result<i64, AppError>;

    async fn credit_seller(&self, seller_id: Uuid, amount: i64) -> Result<i64, AppError>;

    /// Subtracts from the seller ledger only when enough is available.
    async fn debit_seller_checked(&self, seller_id: Uuid, amount: i64) -> Result<bool, AppError>;

    // --- catalog ---

    async fn find_game_account(&self, id: Uuid) -> Result<Option<GameAccount>, AppError>;

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, AppError>;

    /// Flips an available account to sold. Returns whether a row changed.
    async fn mark_account_sold(&self, id: Uuid) -> Result<bool, AppError>;

    // --- orders ---

    async fn insert_order(&self, order: NewOrder) -> Result<Order, AppError>;

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>, AppError>;

    async fn list_orders_for_buyer(&self, buyer_id: Uuid) -> Result<Vec<Order>, AppError>;

    // --- service requests ---

    async fn insert_request(&self, request: NewServiceRequest)
    -> Result<ServiceRequest, AppError>;

    async fn find_request(&self, id: Uuid) -> Result<Option<ServiceRequest>, AppError>;

    async fn list_requests_for_user(&self, user_id: Uuid)
    -> Result<Vec<ServiceRequest>, AppError>;

    async fn list_requests(&self, filter: &RequestFilter) -> Result<Vec<ServiceRequest>, AppError>;

    /// Moves a pending request to the decided status. `None` when the request
    /// was no longer pending.
    async fn resolve_request(
        &self,
        id: Uuid,
        decision: &RequestDecision,
    ) -> Result<Option<ServiceRequest>, AppError>;

    /// Returns an approved request to pending after its ledger effect failed.
    async fn reopen_request(&self, id: Uuid) -> Result<bool, AppError>;

    // --- notifications ---

    async fn insert_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, AppError>;

    async fn list_notifications(&self, user_id: Uuid) -> Result<Vec<Notification>, AppError>;

    async fn mark_notification_read(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError>;

    // --- webhooks ---

    async fn insert_webhook_endpoint(
        &self,
        created_by: Uuid,
        url: &str,
        secret: &str,
    ) -> Result<WebhookEndpoint, AppError>;

    async fn list_active_webhook_endpoints(&self) -> Result<Vec<WebhookEndpoint>, AppError>;

    /// Soft delete. Returns whether an active endpoint was found.
    async fn deactivate_webhook_endpoint(&self, id: Uuid) -> Result<bool, AppError>;

    async fn record_webhook_event(&self, event: NewWebhookEvent) -> Result<(), AppError>;
}
