//! Coin wallet response types.

use serde::Serialize;
use uuid::Uuid;

/// Response body for `GET /api/v1/wallet`.
///
/// # JSON Example
///
/// ```json
/// {
///   "user_id": "550e8400-e29b-41d4-a716-446655440000",
///   "coin_balance": 120,
///   "seller_balance": 45
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct WalletResponse {
    pub user_id: Uuid,

    /// Coins available for purchases
    pub coin_balance: i64,

    /// Coins earned from marketplace sales, withdrawable
    pub seller_balance: i64,
}
