//! Order models and purchase request/response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::catalog::ItemKind;

/// Orders created by the coin purchase flow are approved immediately.
pub const ORDER_APPROVED: &str = "approved";

/// Represents an order record from the `orders` table.
///
/// `coin_amount = commission + seller_amount` always holds.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Order {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,

    #[sqlx(try_from = "String")]
    pub item_kind: ItemKind,

    pub item_id: Uuid,

    /// Title snapshot at purchase time
    pub item_title: String,

    /// Coins debited from the buyer
    pub coin_amount: i64,

    /// Flat platform fee retained from the sale
    pub commission: i64,

    /// Coins credited to the seller
    pub seller_amount: i64,

    pub status: String,

    pub created_at: DateTime<Utc>,
}

/// Values for a new `orders` row.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub item_kind: ItemKind,
    pub item_id: Uuid,
    pub item_title: String,
    pub coin_amount: i64,
    pub commission: i64,
    pub seller_amount: i64,
}

/// Request body for `POST /api/v1/purchases`.
///
/// # JSON Example
///
/// ```json
/// {
///   "coin_amount": 150,
///   "account_id": "550e8400-e29b-41d4-a716-446655440000"
/// }
/// ```
///
/// Exactly one of `account_id` and `product_id` must be present.
#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    pub coin_amount: i64,

    #[serde(default)]
    pub account_id: Option<Uuid>,

    #[serde(default)]
    pub product_id: Option<Uuid>,
}

/// Result of a successful purchase.
#[derive(Debug, Serialize)]
pub struct PurchaseReceipt {
    pub order: Order,

    /// Buyer balance right after the debit
    pub new_balance: i64,
}
