//! Storefront user and session models.
//!
//! Sessions are issued by the identity provider; this service only stores
//! the SHA-256 hash of each bearer token in `user_sessions`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a storefront user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Seller,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Seller => "seller",
            UserRole::Admin => "admin",
        }
    }
}

impl TryFrom<String> for UserRole {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "user" => Ok(UserRole::User),
            "seller" => Ok(UserRole::Seller),
            "admin" => Ok(UserRole::Admin),
            other => Err(format!("unknown user role '{other}'")),
        }
    }
}

/// Represents a user record from the `users` table.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct User {
    pub id: Uuid,

    pub email: String,

    pub display_name: String,

    #[sqlx(try_from = "String")]
    pub role: UserRole,

    /// Unique, upper-case code other users redeem to reward this user.
    pub referral_code: String,

    /// Referrer, set once on the first successful redemption.
    pub referred_by: Option<Uuid>,

    /// Banned users cannot authenticate.
    pub is_banned: bool,

    pub created_at: DateTime<Utc>,
}

/// Authentication context attached to authenticated requests.
///
/// Inserted into request extensions by the auth middleware and extracted by
/// handlers with `Extension<AuthUser>`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            role: user.role,
        }
    }
}
