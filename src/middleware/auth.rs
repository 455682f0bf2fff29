//! Session token authentication middleware.
//!
//! This middleware intercepts every protected request to:
//! 1. Extract the bearer token from the Authorization header
//! 2. Hash it and look up an active session for a non-banned user
//! 3. Inject `AuthUser` into the request
//! 4. Reject unauthorized requests with HTTP 401
//!
//! `require_admin` is layered inside it for the back-office routes.

use crate::{
    app::AppState,
    error::AppError,
    models::user::AuthUser,
};
use axum::{
    Extension,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};

/// SHA-256 hex digest of a session token, as stored in `user_sessions`.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Session authentication middleware function.
///
/// # Headers
///
/// ```text
/// Authorization: Bearer <session token>
/// ```
///
/// # Returns
///
/// - `Ok(Response)` if authenticated successfully (calls next handler)
/// - `Err(AppError::Unauthorized)` otherwise (returns 401)
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Unauthorized)?;

    let user = state
        .store
        .find_session_user(&hash_token(token))
        .await?
        .ok_or(AppError::Unauthorized)?;

    // Handlers extract this with Extension<AuthUser>
    request.extensions_mut().insert(AuthUser::from(user));

    Ok(next.run(request).await)
}

/// Rejects authenticated callers that are not admins with 403.
pub async fn require_admin(
    Extension(auth): Extension<AuthUser>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !auth.is_admin() {
        tracing::warn!(
            user_id = %auth.user_id,
            role = auth.role.as_str(),
            "non-admin attempted back-office access"
        );
        return Err(AppError::Forbidden);
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_hash_is_lowercase_sha256_hex() {
        let hash = hash_token("abc");
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
