//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, auth extension)
//! 2. Delegates to a service or the store
//! 3. Returns HTTP response (JSON, status code)

/// Liveness and database connectivity
pub mod health;
/// In-app notification inbox
pub mod notifications;
/// Order history
pub mod orders;
/// Coin purchases of catalog items
pub mod purchases;
/// Referral code lookup and redemption
pub mod referrals;
/// Top-up, bot rental and withdrawal review queue
pub mod requests;
/// Coin and seller balances
pub mod wallet;
/// Admin webhook endpoint management
pub mod webhooks;
