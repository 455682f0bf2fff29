//! HTTP middleware components.

/// Session authentication and admin gate
pub mod auth;
