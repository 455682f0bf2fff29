//! Service request models: coin top-ups, bot rentals and withdrawals.
//!
//! All three share one `service_requests` table and one review workflow:
//! a request is created `pending` and an admin moves it to `approved` or
//! `rejected` exactly once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// Buy coins with a bank transfer, credited on approval
    CoinPurchase,
    /// Rent a bot for a number of days, paid in coins on approval
    BotRental,
    /// Cash out seller earnings, debited on approval
    Withdrawal,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::CoinPurchase => "coin_purchase",
            RequestKind::BotRental => "bot_rental",
            RequestKind::Withdrawal => "withdrawal",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RequestKind::CoinPurchase => "Coin top-up",
            RequestKind::BotRental => "Bot rental",
            RequestKind::Withdrawal => "Withdrawal",
        }
    }
}

impl TryFrom<String> for RequestKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "coin_purchase" => Ok(RequestKind::CoinPurchase),
            "bot_rental" => Ok(RequestKind::BotRental),
            "withdrawal" => Ok(RequestKind::Withdrawal),
            other => Err(format!("unknown request kind '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }
}

impl TryFrom<String> for RequestStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(RequestStatus::Pending),
            "approved" => Ok(RequestStatus::Approved),
            "rejected" => Ok(RequestStatus::Rejected),
            other => Err(format!("unknown request status '{other}'")),
        }
    }
}

/// Represents a row of the `service_requests` table.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ServiceRequest {
    pub id: Uuid,

    #[sqlx(try_from = "String")]
    pub kind: RequestKind,

    pub user_id: Uuid,

    /// Coins credited (top-up) or debited (rental, withdrawal) on approval
    pub coin_amount: i64,

    /// Bank transfer amount for top-ups
    pub amount_vnd: Option<i64>,

    /// Kind-specific details (bot name and duration, bank info)
    pub details: serde_json::Value,

    #[sqlx(try_from = "String")]
    pub status: RequestStatus,

    pub review_note: Option<String>,

    pub reviewed_by: Option<Uuid>,

    pub created_at: DateTime<Utc>,

    pub reviewed_at: Option<DateTime<Utc>>,
}

/// Values for a new `service_requests` row.
#[derive(Debug, Clone)]
pub struct NewServiceRequest {
    pub kind: RequestKind,
    pub user_id: Uuid,
    pub coin_amount: i64,
    pub amount_vnd: Option<i64>,
    pub details: serde_json::Value,
}

/// Admin decision applied to a pending request.
#[derive(Debug, Clone)]
pub struct RequestDecision {
    pub status: RequestStatus,
    pub reviewer_id: Uuid,
    pub note: Option<String>,
}

/// Body of `POST /api/v1/requests/coin-purchases`.
#[derive(Debug, Deserialize)]
pub struct CoinPurchaseRequest {
    pub amount_vnd: i64,

    /// Bank transfer reference shown to the admin
    #[serde(default)]
    pub transfer_note: Option<String>,
}

/// Body of `POST /api/v1/requests/bot-rentals`.
#[derive(Debug, Deserialize)]
pub struct BotRentalRequest {
    pub bot_name: String,
    pub duration_days: i32,
    pub coin_amount: i64,
}

/// Body of `POST /api/v1/requests/withdrawals`.
#[derive(Debug, Deserialize)]
pub struct WithdrawalRequest {
    pub coin_amount: i64,
    pub bank_info: String,
}

/// Body of `POST /api/v1/admin/requests/{id}/reject`.
#[derive(Debug, Default, Deserialize)]
pub struct RejectRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

/// Query string of `GET /api/v1/admin/requests`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RequestFilter {
    #[serde(default)]
    pub status: Option<RequestStatus>,

    #[serde(default)]
    pub kind: Option<RequestKind>,
}
