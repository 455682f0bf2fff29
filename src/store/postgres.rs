//! PostgreSQL implementation of `ShopStore` using sqlx.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        catalog::{ACCOUNT_AVAILABLE, ACCOUNT_SOLD, GameAccount, Product},
        notification::{NewNotification, Notification},
        order::{NewOrder, ORDER_APPROVED, Order},
        request::{NewServiceRequest, RequestDecision, RequestFilter, ServiceRequest},
        user::User,
        webhook::{NewWebhookEvent, WebhookEndpoint},
    },
    store::ShopStore,
};

const USER_COLUMNS: &str =
    "u.id, u.email, u.display_name, u.role, u.referral_code, u.referred_by, u.is_banned, u.created_at";

#[derive(Clone)]
pub struct PgShopStore {
    pool: DbPool,
}

impl PgShopStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShopStore for PgShopStore {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_session_user(&self, token_hash: &str) -> Result<Option<User>, AppError> {
        let sql = format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM user_sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token_hash = $1
              AND s.revoked_at IS NULL
              AND (s.expires_at IS NULL OR s.expires_at > NOW())
              AND u.is_banned = false
            "#
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_referral_code(&self, code: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE UPPER(u.referral_code) = UPPER($1)");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn redeem_referral(
        &self,
        user_id: Uuid,
        referrer_id: Uuid,
        reward: i64,
    ) -> Result<Option<i64>, AppError> {
        let mut tx = self.pool.begin().await?;

        let linked = sqlx::query(
            "UPDATE users SET referred_by = $2 WHERE id = $1 AND referred_by IS NULL",
        )
        .bind(user_id)
        .bind(referrer_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if linked == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let balance: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO coin_balances (user_id, balance)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE
            SET balance = coin_balances.balance + EXCLUDED.balance,
                updated_at = NOW()
            RETURNING balance
            "#,
        )
        .bind(referrer_id)
        .bind(reward)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(balance))
    }

    async fn coin_balance(&self, user_id: Uuid) -> Result<i64, AppError> {
        let balance: Option<i64> =
            sqlx::query_scalar("SELECT balance FROM coin_balances WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(balance.unwrap_or(0))
    }

    async fn compare_and_set_balance(
        &self,
        user_id: Uuid,
        expected: i64,
        new: i64,
    ) -> Result<bool, AppError> {
        // The balance read earlier is the version: no row changes if anyone
        // wrote in between.
        let updated = sqlx::query(
            r#"
            UPDATE coin_balances
            SET balance = $3,
                updated_at = NOW()
            WHERE user_id = $1 AND balance = $2
            "#,
        )
        .bind(user_id)
        .bind(expected)
        .bind(new)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(updated == 1)
    }

    async fn credit_coins(&self, user_id: Uuid, amount: i64) -> Result<i64, AppError> {
        let balance: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO coin_balances (user_id, balance)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE
            SET balance = coin_balances.balance + EXCLUDED.balance,
                updated_at = NOW()
            RETURNING balance
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .fetch_one(&self.pool)
        .await?;
        Ok(balance)
    }

    async fn seller_balance(&self, seller_id: Uuid) -> Result<i64, AppError> {
        let balance: Option<i64> =
            sqlx::query_scalar("SELECT balance FROM seller_balances WHERE seller_id = $1")
                .bind(seller_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(balance.unwrap_or(0))
    }

    async fn credit_seller(&self, seller_id: Uuid, amount: i64) -> Result<i64, AppError> {
        let balance: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO seller_balances (seller_id, balance)
            VALUES ($1, $2)
            ON CONFLICT (seller_id) DO UPDATE
            SET balance = seller_balances.balance + EXCLUDED.balance,
                updated_at = NOW()
            RETURNING balance
            "#,
        )
        .bind(seller_id)
        .bind(amount)
        .fetch_one(&self.pool)
        .await?;
        Ok(balance)
    }

    async fn debit_seller_checked(&self, seller_id: Uuid, amount: i64) -> Result<bool, AppError> {
        let updated = sqlx::query(
            r#"
            UPDATE seller_balances
            SET balance = balance - $2,
                updated_at = NOW()
            WHERE seller_id = $1 AND balance >= $2
            "#,
        )
        .bind(seller_id)
        .bind(amount)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(updated == 1)
    }

    async fn find_game_account(&self, id: Uuid) -> Result<Option<GameAccount>, AppError> {
        let account = sqlx::query_as::<_, GameAccount>(
            "SELECT id, seller_id, title, price_vnd, is_free, status, created_at FROM game_accounts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT id, seller_id, name, price_vnd, is_free, is_active, created_at FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    async fn mark_account_sold(&self, id: Uuid) -> Result<bool, AppError> {
        let updated = sqlx::query(
            "UPDATE game_accounts SET status = $2, sold_at = NOW() WHERE id = $1 AND status = $3",
        )
        .bind(id)
        .bind(ACCOUNT_SOLD)
        .bind(ACCOUNT_AVAILABLE)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(updated == 1)
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, AppError> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (
                buyer_id,
                seller_id,
                item_kind,
                item_id,
                item_title,
                coin_amount,
                commission,
                seller_amount,
                status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(order.buyer_id)
        .bind(order.seller_id)
        .bind(order.item_kind.as_str())
        .bind(order.item_id)
        .bind(order.item_title)
        .bind(order.coin_amount)
        .bind(order.commission)
        .bind(order.seller_amount)
        .bind(ORDER_APPROVED)
        .fetch_one(&self.pool)
        .await?;
        Ok(order)
    }

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>, AppError> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(order)
    }

    async fn list_orders_for_buyer(&self, buyer_id: Uuid) -> Result<Vec<Order>, AppError> {
        let orders = sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE buyer_id = $1 ORDER BY created_at DESC",
        )
        .bind(buyer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    async fn insert_request(
        &self,
        request: NewServiceRequest,
    ) -> Result<ServiceRequest, AppError> {
        let created = sqlx::query_as::<_, ServiceRequest>(
            r#"
            INSERT INTO service_requests (kind, user_id, coin_amount, amount_vnd, details, status)
            VALUES ($1, $2, $3, $4, $5, 'pending')
            RETURNING *
            "#,
        )
        .bind(request.kind.as_str())
        .bind(request.user_id)
        .bind(request.coin_amount)
        .bind(request.amount_vnd)
        .bind(request.details)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn find_request(&self, id: Uuid) -> Result<Option<ServiceRequest>, AppError> {
        let request =
            sqlx::query_as::<_, ServiceRequest>("SELECT * FROM service_requests WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(request)
    }

    async fn list_requests_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ServiceRequest>, AppError> {
        let requests = sqlx::query_as::<_, ServiceRequest>(
            "SELECT * FROM service_requests WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(requests)
    }

    async fn list_requests(&self, filter: &RequestFilter) -> Result<Vec<ServiceRequest>, AppError> {
        let requests = sqlx::query_as::<_, ServiceRequest>(
            r#"
            SELECT * FROM service_requests
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::text IS NULL OR kind = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.kind.map(|k| k.as_str()))
        .fetch_all(&self.pool)
        .await?;
        Ok(requests)
    }

    async fn resolve_request(
        &self,
        id: Uuid,
        decision: &RequestDecision,
    ) -> Result<Option<ServiceRequest>, AppError> {
        let resolved = sqlx::query_as::<_, ServiceRequest>(
            r#"
            UPDATE service_requests
            SET status = $2,
                reviewed_by = $3,
                review_note = $4,
                reviewed_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(decision.status.as_str())
        .bind(decision.reviewer_id)
        .bind(decision.note.as_deref())
        .fetch_optional(&self.pool)
        .await?;
        Ok(resolved)
    }

    async fn reopen_request(&self, id: Uuid) -> Result<bool, AppError> {
        let updated = sqlx::query(
            r#"
            UPDATE service_requests
            SET status = 'pending',
                reviewed_by = NULL,
                review_note = NULL,
                reviewed_at = NULL
            WHERE id = $1 AND status = 'approved'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(updated == 1)
    }

    async fn insert_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, AppError> {
        let created = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, title, body)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(notification.user_id)
        .bind(notification.title)
        .bind(notification.body)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn list_notifications(&self, user_id: Uuid) -> Result<Vec<Notification>, AppError> {
        let notifications = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC LIMIT 100",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(notifications)
    }

    async fn mark_notification_read(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let updated =
            sqlx::query("UPDATE notifications SET is_read = true WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(&self.pool)
                .await?
                .rows_affected();
        Ok(updated == 1)
    }

    async fn insert_webhook_endpoint(
        &self,
        created_by: Uuid,
        url: &str,
        secret: &str,
    ) -> Result<WebhookEndpoint, AppError> {
        let endpoint = sqlx::query_as::<_, WebhookEndpoint>(
            r#"
            INSERT INTO webhook_endpoints (created_by, url, secret)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(created_by)
        .bind(url)
        .bind(secret)
        .fetch_one(&self.pool)
        .await?;
        Ok(endpoint)
    }

    async fn list_active_webhook_endpoints(&self) -> Result<Vec<WebhookEndpoint>, AppError> {
        let endpoints = sqlx::query_as::<_, WebhookEndpoint>(
            "SELECT * FROM webhook_endpoints WHERE is_active = true ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(endpoints)
    }

    async fn deactivate_webhook_endpoint(&self, id: Uuid) -> Result<bool, AppError> {
        let updated = sqlx::query(
            "UPDATE webhook_endpoints SET is_active = false WHERE id = $1 AND is_active = true",
        )
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(updated == 1)
    }

    async fn record_webhook_event(&self, event: NewWebhookEvent) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO webhook_events (
                id,
                webhook_endpoint_id,
                order_id,
                payload,
                response_status,
                response_body
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(event.id)
        .bind(event.webhook_endpoint_id)
        .bind(event.order_id)
        .bind(event.payload)
        .bind(event.response_status)
        .bind(event.response_body)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
