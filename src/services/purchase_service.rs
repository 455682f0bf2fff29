//! Coin purchase flow.
//!
//! A purchase is a chain of checks followed by one guarded write:
//!
//! 1. validate the request (positive amount, exactly one item id)
//! 2. read the buyer balance
//! 3. re-fetch the item and check availability and price
//! 4. compare-and-set the buyer balance from the value read in step 2
//! 5. insert the approved order, reversing the debit if that fails
//!
//! Everything after step 5 (marking the account sold, paying the seller,
//! notifications) is best-effort: failures are logged and the buyer still
//! gets a successful response because the order is already committed.

use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        catalog::{CatalogItem, ItemKind},
        notification::NewNotification,
        order::{NewOrder, Order, PurchaseReceipt, PurchaseRequest},
    },
    services::{notifier::OrderNotifier, pricing},
    store::ShopStore,
};

/// Item the buyer asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemRef {
    Account(Uuid),
    Product(Uuid),
}

impl ItemRef {
    fn from_request(request: &PurchaseRequest) -> Result<Self, AppError> {
        match (request.account_id, request.product_id) {
            (Some(id), None) => Ok(ItemRef::Account(id)),
            (None, Some(id)) => Ok(ItemRef::Product(id)),
            (None, None) => Err(AppError::InvalidRequest(
                "Either account_id or product_id is required".to_string(),
            )),
            (Some(_), Some(_)) => Err(AppError::InvalidRequest(
                "Only one of account_id or product_id may be given".to_string(),
            )),
        }
    }
}

/// Buy a catalog item with coins.
///
/// # Errors
///
/// - `InvalidRequest`: non-positive amount, missing/both ids, own item
/// - `InsufficientBalance`: balance lower than `coin_amount`
/// - `NotFound`: item does not exist
/// - `ItemUnavailable`: item sold, inactive or free
/// - `PriceMismatch`: `coin_amount` differs from the current coin price
/// - `BalanceConflict`: the balance changed between read and write; retry
/// - any store error from the order insert (the debit is reversed first)
pub async fn purchase(
    store: &dyn ShopStore,
    notifier: &dyn OrderNotifier,
    buyer_id: Uuid,
    request: PurchaseRequest,
) -> Result<PurchaseReceipt, AppError> {
    let coin_amount = request.coin_amount;
    if coin_amount <= 0 {
        return Err(AppError::InvalidRequest(
            "coin_amount must be a positive integer".to_string(),
        ));
    }
    let item_ref = ItemRef::from_request(&request)?;

    let balance = store.coin_balance(buyer_id).await?;
    if balance < coin_amount {
        return Err(AppError::InsufficientBalance);
    }

    let item = load_item(store, item_ref).await?;
    check_item(&item, buyer_id, coin_amount)?;

    let new_balance = balance - coin_amount;
    if !store
        .compare_and_set_balance(buyer_id, balance, new_balance)
        .await?
    {
        tracing::info!(%buyer_id, "balance changed during purchase, rejecting");
        return Err(AppError::BalanceConflict);
    }

    let split = pricing::split_sale(coin_amount);
    let new_order = NewOrder {
        buyer_id,
        seller_id: item.seller_id,
        item_kind: item.kind,
        item_id: item.id,
        item_title: item.title.clone(),
        coin_amount,
        commission: split.commission,
        seller_amount: split.seller_amount,
    };

    let order = match store.insert_order(new_order).await {
        Ok(order) => order,
        Err(e) => {
            refund(store, buyer_id, coin_amount).await;
            return Err(e);
        }
    };

    tracing::info!(
        order_id = %order.id,
        %buyer_id,
        seller_id = %order.seller_id,
        coins = coin_amount,
        commission = order.commission,
        "order approved"
    );

    settle(store, notifier, &order).await;

    Ok(PurchaseReceipt { order, new_balance })
}

async fn load_item(store: &dyn ShopStore, item_ref: ItemRef) -> Result<CatalogItem, AppError> {
    match item_ref {
        ItemRef::Account(id) => store
            .find_game_account(id)
            .await?
            .map(CatalogItem::from)
            .ok_or(AppError::NotFound("Game account")),
        ItemRef::Product(id) => store
            .find_product(id)
            .await?
            .map(CatalogItem::from)
            .ok_or(AppError::NotFound("Product")),
    }
}

fn check_item(item: &CatalogItem, buyer_id: Uuid, coin_amount: i64) -> Result<(), AppError> {
    if item.is_unavailable || item.is_free {
        return Err(AppError::ItemUnavailable);
    }
    if item.seller_id == buyer_id {
        return Err(AppError::InvalidRequest(
            "You cannot buy your own listing".to_string(),
        ));
    }
    let expected = pricing::coin_price(item.price_vnd);
    if expected != coin_amount {
        return Err(AppError::PriceMismatch {
            expected,
            offered: coin_amount,
        });
    }
    Ok(())
}

/// Compensating credit after a failed order insert.
async fn refund(store: &dyn ShopStore, buyer_id: Uuid, coin_amount: i64) {
    match store.credit_coins(buyer_id, coin_amount).await {
        Ok(balance) => {
            tracing::warn!(%buyer_id, coins = coin_amount, balance, "order insert failed, debit reversed");
        }
        Err(e) => {
            tracing::error!(
                %buyer_id,
                coins = coin_amount,
                error = ?e,
                "order insert failed and the debit could not be reversed; manual reconciliation required"
            );
        }
    }
}

/// Post-commit side effects. None of these can fail the purchase.
async fn settle(store: &dyn ShopStore, notifier: &dyn OrderNotifier, order: &Order) {
    if order.item_kind == ItemKind::GameAccount {
        match store.mark_account_sold(order.item_id).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(order_id = %order.id, account_id = %order.item_id, "account was already marked sold");
            }
            Err(e) => {
                tracing::error!(order_id = %order.id, account_id = %order.item_id, error = ?e, "failed to mark account sold");
            }
        }
    }

    if order.seller_amount > 0 {
        if let Err(e) = store.credit_seller(order.seller_id, order.seller_amount).await {
            tracing::error!(
                order_id = %order.id,
                seller_id = %order.seller_id,
                coins = order.seller_amount,
                error = ?e,
                "failed to credit seller"
            );
        }
    }

    let notifications = [
        NewNotification::new(
            order.buyer_id,
            "Purchase successful",
            format!(
                "You bought \"{}\" for {} coins.",
                order.item_title, order.coin_amount
            ),
        ),
        NewNotification::new(
            order.seller_id,
            "Item sold",
            format!(
                "\"{}\" sold for {} coins. {} coins credited after a {} coin commission.",
                order.item_title, order.coin_amount, order.seller_amount, order.commission
            ),
        ),
    ];
    for notification in notifications {
        if let Err(e) = store.insert_notification(notification).await {
            tracing::warn!(order_id = %order.id, error = ?e, "failed to insert notification");
        }
    }

    notifier.order_approved(order);
}
