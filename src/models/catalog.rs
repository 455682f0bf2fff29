//! Marketplace catalog entities: game accounts and digital products.
//!
//! Prices are stored in VND; the coin price is derived by `pricing::coin_price`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of a listed game account.
pub const ACCOUNT_AVAILABLE: &str = "available";
pub const ACCOUNT_SOLD: &str = "sold";

/// Which catalog table a purchased item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    GameAccount,
    Product,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::GameAccount => "game_account",
            ItemKind::Product => "product",
        }
    }
}

impl TryFrom<String> for ItemKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "game_account" => Ok(ItemKind::GameAccount),
            "product" => Ok(ItemKind::Product),
            other => Err(format!("unknown item kind '{other}'")),
        }
    }
}

/// A single game account listed by a seller. Sold at most once.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct GameAccount {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub title: String,
    pub price_vnd: i64,
    pub is_free: bool,
    /// `available` or `sold`
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// A digital product that can be sold repeatedly while active.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Product {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub name: String,
    pub price_vnd: i64,
    pub is_free: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// The purchasable view of either catalog entity.
#[derive(Debug, Clone)]
pub struct CatalogItem {
    pub kind: ItemKind,
    pub id: Uuid,
    pub seller_id: Uuid,
    pub title: String,
    pub price_vnd: i64,
    pub is_free: bool,
    /// Sold account or deactivated product
    pub is_unavailable: bool,
}

impl From<GameAccount> for CatalogItem {
    fn from(account: GameAccount) -> Self {
        Self {
            kind: ItemKind::GameAccount,
            id: account.id,
            seller_id: account.seller_id,
            title: account.title,
            price_vnd: account.price_vnd,
            is_free: account.is_free,
            is_unavailable: account.status != ACCOUNT_AVAILABLE,
        }
    }
}

impl From<Product> for CatalogItem {
    fn from(product: Product) -> Self {
        Self {
            kind: ItemKind::Product,
            id: product.id,
            seller_id: product.seller_id,
            title: product.name,
            price_vnd: product.price_vnd,
            is_free: product.is_free,
            is_unavailable: !product.is_active,
        }
    }
}
