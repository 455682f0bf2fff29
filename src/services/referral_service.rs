//! Referral program: each user has a code; redeeming someone's code once
//! credits that referrer with a fixed coin reward.

use serde::Serialize;
use uuid::Uuid;

use crate::{error::AppError, models::notification::NewNotification, store::ShopStore};

#[derive(Debug, Serialize)]
pub struct ReferralCodeResponse {
    pub referral_code: String,
    pub referred_by: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct RedeemResponse {
    pub referrer_display_name: String,
    pub reward_coins: i64,
}

pub async fn referral_code(
    store: &dyn ShopStore,
    user_id: Uuid,
) -> Result<ReferralCodeResponse, AppError> {
    let user = store
        .find_user(user_id)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    Ok(ReferralCodeResponse {
        referral_code: user.referral_code,
        referred_by: user.referred_by,
    })
}

/// Redeem a referral code for `user_id`.
///
/// # Errors
///
/// - `InvalidRequest`: empty code, own code, or the user already redeemed one
/// - `NotFound`: no user has this code
pub async fn redeem(
    store: &dyn ShopStore,
    reward_coins: i64,
    user_id: Uuid,
    code: &str,
) -> Result<RedeemResponse, AppError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(AppError::InvalidRequest("code is required".to_string()));
    }

    let referrer = store
        .find_user_by_referral_code(code)
        .await?
        .ok_or(AppError::NotFound("Referral code"))?;
    if referrer.id == user_id {
        return Err(AppError::InvalidRequest(
            "You cannot redeem your own referral code".to_string(),
        ));
    }

    let Some(balance) = store
        .redeem_referral(user_id, referrer.id, reward_coins)
        .await?
    else {
        return Err(AppError::InvalidRequest(
            "A referral code was already redeemed for this account".to_string(),
        ));
    };
    tracing::info!(referrer_id = %referrer.id, %user_id, reward_coins, balance, "referral redeemed");

    let notification = NewNotification::new(
        referrer.id,
        "Referral reward",
        format!("Someone joined with your code. You earned {reward_coins} coins."),
    );
    if let Err(e) = store.insert_notification(notification).await {
        tracing::warn!(referrer_id = %referrer.id, error = ?e, "failed to insert referral notification");
    }

    Ok(RedeemResponse {
        referrer_display_name: referrer.display_name,
        reward_coins,
    })
}
