//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! They validate input, talk to the store and decide which failures are
//! fatal and which are only logged.

pub mod notifier;
pub mod pricing;
pub mod purchase_service;
pub mod referral_service;
pub mod request_service;
pub mod webhook_service;
