//! Outbound order notifications: email relay, Telegram and signed webhooks.
//!
//! Delivery is fire-and-forget. `order_approved` returns immediately and the
//! work runs on a spawned task, so a slow or failing receiver never affects
//! the purchase response.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use crate::{
    config::Config, error::AppError, models::order::Order, services::webhook_service,
    store::ShopStore,
};

/// Sink for committed orders.
pub trait OrderNotifier: Send + Sync {
    /// Must not block on network I/O.
    fn order_approved(&self, order: &Order);
}

/// Production notifier talking to the outside world over HTTP.
#[derive(Clone)]
pub struct OutboundNotifier {
    client: reqwest::Client,
    store: Arc<dyn ShopStore>,
    email_webhook_url: Option<String>,
    telegram_api_url: String,
    telegram: Option<(String, String)>,
}

impl OutboundNotifier {
    pub fn new(config: &Config, store: Arc<dyn ShopStore>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.outbound_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            store,
            email_webhook_url: config.email_webhook_url.clone().filter(|u| !u.is_empty()),
            telegram_api_url: config.telegram_api_url.trim_end_matches('/').to_string(),
            telegram: config
                .telegram()
                .map(|(token, chat)| (token.to_string(), chat.to_string())),
        })
    }

    async fn deliver(&self, order: Order) {
        if let Err(e) = self.send_email(&order).await {
            tracing::warn!(order_id = %order.id, error = ?e, "order email failed");
        }
        if let Err(e) = self.send_telegram(&order).await {
            tracing::warn!(order_id = %order.id, error = ?e, "telegram alert failed");
        }
        if let Err(e) =
            webhook_service::notify_order_webhooks(self.store.as_ref(), &self.client, &order).await
        {
            tracing::warn!(order_id = %order.id, error = ?e, "order webhooks failed");
        }
    }

    async fn send_email(&self, order: &Order) -> Result<(), AppError> {
        let Some(url) = &self.email_webhook_url else {
            return Ok(());
        };
        let Some(buyer) = self.store.find_user(order.buyer_id).await? else {
            return Ok(());
        };

        let body = json!({
            "to": buyer.email,
            "subject": format!("BonzShop order {}", order.id),
            "text": order_email_text(&buyer.display_name, order),
        });

        self.client
            .post(url)
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::Internal(format!("email relay: {e}")))?;
        Ok(())
    }

    async fn send_telegram(&self, order: &Order) -> Result<(), AppError> {
        let Some((token, chat_id)) = &self.telegram else {
            return Ok(());
        };

        let url = format!("{}/bot{token}/sendMessage", self.telegram_api_url);
        let body = json!({
            "chat_id": chat_id,
            "text": telegram_text(order),
        });

        self.client
            .post(url)
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::Internal(format!("telegram: {e}")))?;
        Ok(())
    }
}

impl OrderNotifier for OutboundNotifier {
    fn order_approved(&self, order: &Order) {
        let notifier = self.clone();
        let order = order.clone();
        tokio::spawn(async move {
            notifier.deliver(order).await;
        });
    }
}

fn order_email_text(display_name: &str, order: &Order) -> String {
    format!(
        "Hi {display_name},\n\nYour purchase of \"{}\" is complete.\nOrder: {}\nPaid: {} coins\n\nThank you for shopping at BonzShop.",
        order.item_title, order.id, order.coin_amount
    )
}

fn telegram_text(order: &Order) -> String {
    format!(
        "New order {}\nItem: {} ({})\nAmount: {} coins\nCommission: {} coins\nSeller payout: {} coins",
        order.id,
        order.item_title,
        order.item_kind.as_str(),
        order.coin_amount,
        order.commission,
        order.seller_amount
    )
}
