//! Wallet balance endpoint.

use axum::{Extension, Json, extract::State};

use crate::{
    app::AppState,
    error::AppError,
    models::{user::AuthUser, wallet::WalletResponse},
};

/// Get the caller's balances.
///
/// # Endpoint
///
/// `GET /api/v1/wallet`
///
/// Users without a balance row read as 0 coins.
pub async fn get_wallet(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<WalletResponse>, AppError> {
    let coin_balance = state.store.coin_balance(auth.user_id).await?;
    let seller_balance = state.store.seller_balance(auth.user_id).await?;

    Ok(Json(WalletResponse {
        user_id: auth.user_id,
        coin_balance,
        seller_balance,
    }))
}
