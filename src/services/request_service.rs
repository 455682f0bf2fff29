//! Review queue for coin top-ups, bot rentals and withdrawals.
//!
//! Every request starts `pending`. Approval first claims the request with a
//! conditional status flip, then applies the ledger effect; if the effect
//! fails the claim is released back to `pending`. Rejection only flips the
//! status.

use serde_json::json;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        notification::NewNotification,
        request::{
            BotRentalRequest, CoinPurchaseRequest, NewServiceRequest, RequestDecision,
            RequestKind, RequestStatus, ServiceRequest, WithdrawalRequest,
        },
    },
    services::pricing,
    store::ShopStore,
};

const MAX_RENTAL_DAYS: i32 = 365;

pub async fn submit_coin_purchase(
    store: &dyn ShopStore,
    user_id: Uuid,
    request: CoinPurchaseRequest,
) -> Result<ServiceRequest, AppError> {
    let coins = pricing::coins_for_topup(request.amount_vnd);
    if coins < 1 {
        return Err(AppError::InvalidRequest(format!(
            "Minimum top-up is {} VND",
            pricing::VND_PER_COIN
        )));
    }

    let created = store
        .insert_request(NewServiceRequest {
            kind: RequestKind::CoinPurchase,
            user_id,
            coin_amount: coins,
            amount_vnd: Some(request.amount_vnd),
            details: json!({ "transfer_note": request.transfer_note }),
        })
        .await?;

    tracing::info!(request_id = %created.id, %user_id, coins, "coin top-up submitted");
    Ok(created)
}

pub async fn submit_bot_rental(
    store: &dyn ShopStore,
    user_id: Uuid,
    request: BotRentalRequest,
) -> Result<ServiceRequest, AppError> {
    let bot_name = request.bot_name.trim();
    if bot_name.is_empty() {
        return Err(AppError::InvalidRequest("bot_name is required".to_string()));
    }
    if !(1..=MAX_RENTAL_DAYS).contains(&request.duration_days) {
        return Err(AppError::InvalidRequest(format!(
            "duration_days must be between 1 and {MAX_RENTAL_DAYS}"
        )));
    }
    if request.coin_amount <= 0 {
        return Err(AppError::InvalidRequest(
            "coin_amount must be a positive integer".to_string(),
        ));
    }

    let created = store
        .insert_request(NewServiceRequest {
            kind: RequestKind::BotRental,
            user_id,
            coin_amount: request.coin_amount,
            amount_vnd: None,
            details: json!({
                "bot_name": bot_name,
                "duration_days": request.duration_days,
            }),
        })
        .await?;

    tracing::info!(request_id = %created.id, %user_id, bot = bot_name, "bot rental submitted");
    Ok(created)
}

pub async fn submit_withdrawal(
    store: &dyn ShopStore,
    user_id: Uuid,
    request: WithdrawalRequest,
) -> Result<ServiceRequest, AppError> {
    if request.coin_amount <= 0 {
        return Err(AppError::InvalidRequest(
            "coin_amount must be a positive integer".to_string(),
        ));
    }
    let bank_info = request.bank_info.trim();
    if bank_info.is_empty() {
        return Err(AppError::InvalidRequest("bank_info is required".to_string()));
    }
    if store.seller_balance(user_id).await? < request.coin_amount {
        return Err(AppError::InsufficientBalance);
    }

    let created = store
        .insert_request(NewServiceRequest {
            kind: RequestKind::Withdrawal,
            user_id,
            coin_amount: request.coin_amount,
            amount_vnd: Some(request.coin_amount * pricing::VND_PER_COIN),
            details: json!({ "bank_info": bank_info }),
        })
        .await?;

    tracing::info!(request_id = %created.id, %user_id, coins = request.coin_amount, "withdrawal submitted");
    Ok(created)
}

/// Approve a pending request and apply its ledger effect.
pub async fn approve(
    store: &dyn ShopStore,
    reviewer_id: Uuid,
    request_id: Uuid,
) -> Result<ServiceRequest, AppError> {
    let decision = RequestDecision {
        status: RequestStatus::Approved,
        reviewer_id,
        note: None,
    };
    let claimed = claim(store, request_id, &decision).await?;

    if let Err(e) = apply_effect(store, &claimed).await {
        match store.reopen_request(claimed.id).await {
            Ok(_) => {
                tracing::warn!(request_id = %claimed.id, error = ?e, "approval effect failed, request reopened");
            }
            Err(reopen_err) => {
                tracing::error!(
                    request_id = %claimed.id,
                    error = ?e,
                    reopen_error = ?reopen_err,
                    "approval effect failed and request could not be reopened"
                );
            }
        }
        return Err(e);
    }

    tracing::info!(
        request_id = %claimed.id,
        kind = claimed.kind.as_str(),
        user_id = %claimed.user_id,
        coins = claimed.coin_amount,
        %reviewer_id,
        "request approved"
    );
    notify_decision(store, &claimed).await;
    Ok(claimed)
}

/// Reject a pending request. No ledger effect.
pub async fn reject(
    store: &dyn ShopStore,
    reviewer_id: Uuid,
    request_id: Uuid,
    reason: Option<String>,
) -> Result<ServiceRequest, AppError> {
    let decision = RequestDecision {
        status: RequestStatus::Rejected,
        reviewer_id,
        note: reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty()),
    };
    let rejected = claim(store, request_id, &decision).await?;

    tracing::info!(request_id = %rejected.id, kind = rejected.kind.as_str(), %reviewer_id, "request rejected");
    notify_decision(store, &rejected).await;
    Ok(rejected)
}

/// Conditional `pending -> decided` flip.
async fn claim(
    store: &dyn ShopStore,
    request_id: Uuid,
    decision: &RequestDecision,
) -> Result<ServiceRequest, AppError> {
    let current = store
        .find_request(request_id)
        .await?
        .ok_or(AppError::NotFound("Request"))?;
    if current.status != RequestStatus::Pending {
        return Err(AppError::InvalidTransition(
            current.status.as_str().to_string(),
        ));
    }

    match store.resolve_request(request_id, decision).await? {
        Some(resolved) => Ok(resolved),
        None => {
            // Another reviewer got there between our read and our write.
            let status = store
                .find_request(request_id)
                .await?
                .map(|r| r.status.as_str().to_string())
                .unwrap_or_else(|| "gone".to_string());
            Err(AppError::InvalidTransition(status))
        }
    }
}

async fn apply_effect(store: &dyn ShopStore, request: &ServiceRequest) -> Result<(), AppError> {
    match request.kind {
        RequestKind::CoinPurchase => {
            store
                .credit_coins(request.user_id, request.coin_amount)
                .await?;
        }
        RequestKind::BotRental => {
            let balance = store.coin_balance(request.user_id).await?;
            if balance < request.coin_amount {
                return Err(AppError::InsufficientBalance);
            }
            if !store
                .compare_and_set_balance(
                    request.user_id,
                    balance,
                    balance - request.coin_amount,
                )
                .await?
            {
                return Err(AppError::BalanceConflict);
            }
        }
        RequestKind::Withdrawal => {
            if !store
                .debit_seller_checked(request.user_id, request.coin_amount)
                .await?
            {
                return Err(AppError::InsufficientBalance);
            }
        }
    }
    Ok(())
}

async fn notify_decision(store: &dyn ShopStore, request: &ServiceRequest) {
    let verdict = match request.status {
        RequestStatus::Approved => "approved",
        RequestStatus::Rejected => "rejected",
        RequestStatus::Pending => return,
    };
    let mut body = format!(
        "Your {} request for {} coins was {verdict}.",
        request.kind.label().to_lowercase(),
        request.coin_amount
    );
    if let Some(note) = &request.review_note {
        body.push_str(&format!(" Reason: {note}"));
    }

    let notification = NewNotification::new(
        request.user_id,
        format!("{} {verdict}", request.kind.label()),
        body,
    );
    if let Err(e) = store.insert_notification(notification).await {
        tracing::warn!(request_id = %request.id, error = ?e, "failed to insert decision notification");
    }
}
