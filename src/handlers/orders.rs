//! Order history endpoints.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::{
    app::AppState,
    error::AppError,
    models::{order::Order, user::AuthUser},
};

/// List the caller's orders as buyer, newest first.
///
/// `GET /api/v1/orders`
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<Order>>, AppError> {
    let orders = state.store.list_orders_for_buyer(auth.user_id).await?;
    Ok(Json(orders))
}

/// Get a single order.
///
/// `GET /api/v1/orders/{id}`
///
/// Visible to the order's buyer and seller. Anyone else gets 404 so order
/// ids cannot be probed.
pub async fn get_order(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = state
        .store
        .find_order(order_id)
        .await?
        .filter(|o| o.buyer_id == auth.user_id || o.seller_id == auth.user_id)
        .ok_or(AppError::NotFound("Order"))?;

    Ok(Json(order))
}
