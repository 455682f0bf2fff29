//! Review queue HTTP handlers.
//!
//! User side:
//! - POST /api/v1/requests/coin-purchases - Submit a bank-transfer top-up
//! - POST /api/v1/requests/bot-rentals - Rent a bot for coins
//! - POST /api/v1/requests/withdrawals - Withdraw seller earnings
//! - GET /api/v1/requests - List own requests
//!
//! Admin side:
//! - GET /api/v1/admin/requests - Filtered listing
//! - POST /api/v1/admin/requests/{id}/approve
//! - POST /api/v1/admin/requests/{id}/reject

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    app::AppState,
    error::AppError,
    models::{
        request::{
            BotRentalRequest, CoinPurchaseRequest, RejectRequest, RequestFilter, ServiceRequest,
            WithdrawalRequest,
        },
        user::AuthUser,
    },
    services::request_service,
};

/// Submit a coin top-up paid by bank transfer.
///
/// # Request Body
///
/// ```json
/// {
///   "amount_vnd": 100000,
///   "transfer_note": "BONZ LAN 0912"
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: the pending request, `coin_amount` = floor(amount_vnd / 1000)
/// - **Error (400)**: amount below 1 coin
pub async fn create_coin_purchase(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<CoinPurchaseRequest>,
) -> Result<impl IntoResponse, AppError> {
    let created =
        request_service::submit_coin_purchase(state.store.as_ref(), auth.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Submit a bot rental paid in coins. Coins are only taken on approval.
///
/// # Request Body
///
/// ```json
/// {
///   "bot_name": "farm-bot",
///   "duration_days": 30,
///   "coin_amount": 150
/// }
/// ```
pub async fn create_bot_rental(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<BotRentalRequest>,
) -> Result<impl IntoResponse, AppError> {
    let created =
        request_service::submit_bot_rental(state.store.as_ref(), auth.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Request a payout of seller earnings.
///
/// Fails with 422 if the seller balance is already lower than `coin_amount`;
/// the balance is checked again when the request is approved.
pub async fn create_withdrawal(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<WithdrawalRequest>,
) -> Result<impl IntoResponse, AppError> {
    let created =
        request_service::submit_withdrawal(state.store.as_ref(), auth.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_my_requests(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<ServiceRequest>>, AppError> {
    let requests = state.store.list_requests_for_user(auth.user_id).await?;
    Ok(Json(requests))
}

/// Admin listing, optionally filtered by `status` and `kind`.
///
/// `GET /api/v1/admin/requests?status=pending&kind=withdrawal`
pub async fn admin_list_requests(
    State(state): State<AppState>,
    Query(filter): Query<RequestFilter>,
) -> Result<Json<Vec<ServiceRequest>>, AppError> {
    let requests = state.store.list_requests(&filter).await?;
    Ok(Json(requests))
}

/// Approve a pending request and apply its ledger effect.
///
/// # Response
///
/// - **Success (200 OK)**: the approved request
/// - **Error (400)**: request already decided (`invalid_transition`)
/// - **Error (404)**: unknown request
/// - **Error (409 / 422)**: the ledger effect failed; the request stays pending
pub async fn approve_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(request_id): Path<Uuid>,
) -> Result<Json<ServiceRequest>, AppError> {
    let approved = request_service::approve(state.store.as_ref(), auth.user_id, request_id).await?;
    Ok(Json(approved))
}

/// Reject a pending request with an optional reason.
///
/// The body may be omitted entirely.
pub async fn reject_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(request_id): Path<Uuid>,
    body: Option<Json<RejectRequest>>,
) -> Result<Json<ServiceRequest>, AppError> {
    let reason = body.and_then(|Json(b)| b.reason);
    let rejected =
        request_service::reject(state.store.as_ref(), auth.user_id, request_id, reason).await?;
    Ok(Json(rejected))
}
