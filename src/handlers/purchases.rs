//! Coin purchase endpoint.

use axum::{Extension, Json, extract::State};

use crate::{
    app::AppState,
    error::AppError,
    models::{
        order::{PurchaseReceipt, PurchaseRequest},
        user::AuthUser,
    },
    services::purchase_service,
};

/// Buy a game account or product with coins.
///
/// # Endpoint
///
/// `POST /api/v1/purchases`
///
/// # Request Body
///
/// ```json
/// {
///   "coin_amount": 120,
///   "account_id": "550e8400-e29b-41d4-a716-446655440000"
/// }
/// ```
///
/// Exactly one of `account_id` or `product_id` must be present, and
/// `coin_amount` must equal the item's current coin price.
///
/// # Response
///
/// - **Success (200 OK)**: the approved order and the buyer's new balance
/// - **Error (400)**: invalid amount, missing or duplicate item id, own item
/// - **Error (404)**: item not found
/// - **Error (409)**: balance changed concurrently, safe to retry
/// - **Error (422)**: insufficient balance, item unavailable, price mismatch
///
/// ```json
/// {
///   "order": {
///     "id": "6f1c...",
///     "item_kind": "game_account",
///     "coin_amount": 120,
///     "commission": 5,
///     "seller_amount": 115,
///     "status": "approved"
///   },
///   "new_balance": 180
/// }
/// ```
pub async fn create_purchase(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<PurchaseRequest>,
) -> Result<Json<PurchaseReceipt>, AppError> {
    let receipt = purchase_service::purchase(
        state.store.as_ref(),
        state.notifier.as_ref(),
        auth.user_id,
        request,
    )
    .await?;

    Ok(Json(receipt))
}
