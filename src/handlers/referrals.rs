//! Referral program endpoints.

use axum::{Extension, Json, extract::State};
use serde::Deserialize;

use crate::{
    app::AppState,
    error::AppError,
    models::user::AuthUser,
    services::referral_service::{self, RedeemResponse, ReferralCodeResponse},
};

#[derive(Debug, Deserialize)]
pub struct RedeemRequest {
    pub code: String,
}

/// `GET /api/v1/referrals/code`
pub async fn get_referral_code(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<ReferralCodeResponse>, AppError> {
    let response = referral_service::referral_code(state.store.as_ref(), auth.user_id).await?;
    Ok(Json(response))
}

/// Redeem another user's referral code.
///
/// # Endpoint
///
/// `POST /api/v1/referrals/redeem`
///
/// # Request Body
///
/// ```json
/// { "code": "BONZ3FA9C1" }
/// ```
///
/// Each account may redeem once. The referrer is credited with the
/// configured reward (`REFERRAL_REWARD_COINS`).
pub async fn redeem_referral(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<RedeemRequest>,
) -> Result<Json<RedeemResponse>, AppError> {
    let response = referral_service::redeem(
        state.store.as_ref(),
        state.config.referral_reward_coins,
        auth.user_id,
        &request.code,
    )
    .await?;

    Ok(Json(response))
}
