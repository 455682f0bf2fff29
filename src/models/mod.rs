//! Data models representing database entities and API bodies.

/// Game accounts and digital products
pub mod catalog;
/// In-app notifications
pub mod notification;
/// Orders and purchase bodies
pub mod order;
/// Top-up, bot rental and withdrawal requests
pub mod request;
/// Users and sessions
pub mod user;
/// Coin wallet views
pub mod wallet;
/// Outbound webhook endpoints and payloads
pub mod webhook;
