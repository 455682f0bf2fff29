//! In-memory `ShopStore` used by service and router tests.
//!
//! Failure knobs let tests force the unhappy paths of the purchase flow:
//! a concurrent writer racing the balance guard, a failing order insert,
//! failing best-effort side effects.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::auth::hash_token,
    models::{
        catalog::{ACCOUNT_AVAILABLE, ACCOUNT_SOLD, GameAccount, Product},
        notification::{NewNotification, Notification},
        order::{NewOrder, ORDER_APPROVED, Order},
        request::{
            NewServiceRequest, RequestDecision, RequestFilter, RequestStatus, ServiceRequest,
        },
        user::{User, UserRole},
        webhook::{NewWebhookEvent, WebhookEndpoint},
    },
    store::ShopStore,
};

#[derive(Default)]
struct MemoryData {
    users: HashMap<Uuid, User>,
    sessions: HashMap<String, Uuid>,
    coin_balances: HashMap<Uuid, i64>,
    seller_balances: HashMap<Uuid, i64>,
    game_accounts: HashMap<Uuid, GameAccount>,
    products: HashMap<Uuid, Product>,
    orders: Vec<Order>,
    requests: Vec<ServiceRequest>,
    notifications: Vec<Notification>,
    webhook_endpoints: Vec<WebhookEndpoint>,
    webhook_events: Vec<NewWebhookEvent>,
}

#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<MemoryData>,
    /// Applied to the balance right before the next compare-and-set.
    pub race_next_cas: Mutex<Option<i64>>,
    pub fail_order_insert: AtomicBool,
    pub fail_coin_credit: AtomicBool,
    pub fail_mark_sold: AtomicBool,
    pub fail_seller_credit: AtomicBool,
    pub fail_notifications: AtomicBool,
    /// Makes the next `resolve_request` behave as if another reviewer won.
    pub lose_next_resolve: AtomicBool,
}

fn injected(what: &str) -> AppError {
    AppError::Internal(format!("injected {what} failure"))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, display_name: &str, role: UserRole) -> User {
        let id = Uuid::new_v4();
        let user = User {
            id,
            email: format!("{}@bonzshop.test", display_name.to_lowercase()),
            display_name: display_name.to_string(),
            role,
            referral_code: format!("BONZ{}", &id.simple().to_string()[..6].to_uppercase()),
            referred_by: None,
            is_banned: false,
            created_at: Utc::now(),
        };
        self.data.lock().unwrap().users.insert(id, user.clone());
        user
    }

    pub fn ban_user(&self, user_id: Uuid) {
        if let Some(user) = self.data.lock().unwrap().users.get_mut(&user_id) {
            user.is_banned = true;
        }
    }

    pub fn add_session(&self, user_id: Uuid, token: &str) {
        self.data
            .lock()
            .unwrap()
            .sessions
            .insert(hash_token(token), user_id);
    }

    pub fn set_coin_balance(&self, user_id: Uuid, balance: i64) {
        self.data
            .lock()
            .unwrap()
            .coin_balances
            .insert(user_id, balance);
    }

    pub fn set_seller_balance(&self, seller_id: Uuid, balance: i64) {
        self.data
            .lock()
            .unwrap()
            .seller_balances
            .insert(seller_id, balance);
    }

    pub fn add_game_account(&self, seller_id: Uuid, price_vnd: i64, is_free: bool) -> GameAccount {
        let account = GameAccount {
            id: Uuid::new_v4(),
            seller_id,
            title: "Lien Quan VIP account".to_string(),
            price_vnd,
            is_free,
            status: ACCOUNT_AVAILABLE.to_string(),
            created_at: Utc::now(),
        };
        self.data
            .lock()
            .unwrap()
            .game_accounts
            .insert(account.id, account.clone());
        account
    }

    pub fn add_product(&self, seller_id: Uuid, price_vnd: i64, is_active: bool) -> Product {
        let product = Product {
            id: Uuid::new_v4(),
            seller_id,
            name: "Discord bot template".to_string(),
            price_vnd,
            is_free: false,
            is_active,
            created_at: Utc::now(),
        };
        self.data
            .lock()
            .unwrap()
            .products
            .insert(product.id, product.clone());
        product
    }

    pub fn account_status(&self, id: Uuid) -> Option<String> {
        self.data
            .lock()
            .unwrap()
            .game_accounts
            .get(&id)
            .map(|a| a.status.clone())
    }

    pub fn orders(&self) -> Vec<Order> {
        self.data.lock().unwrap().orders.clone()
    }

    pub fn notifications_for(&self, user_id: Uuid) -> Vec<Notification> {
        self.data
            .lock()
            .unwrap()
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn webhook_events(&self) -> Vec<NewWebhookEvent> {
        self.data.lock().unwrap().webhook_events.clone()
    }
}

#[async_trait]
impl ShopStore for MemoryStore {
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn find_session_user(&self, token_hash: &str) -> Result<Option<User>, AppError> {
        let data = self.data.lock().unwrap();
        Ok(data
            .sessions
            .get(token_hash)
            .and_then(|id| data.users.get(id))
            .filter(|u| !u.is_banned)
            .cloned())
    }

    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.data.lock().unwrap().users.get(&user_id).cloned())
    }

    async fn find_user_by_referral_code(&self, code: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .data
            .lock()
            .unwrap()
            .users
            .values()
            .find(|u| u.referral_code.eq_ignore_ascii_case(code))
            .cloned())
    }

    async fn redeem_referral(
        &self,
        user_id: Uuid,
        referrer_id: Uuid,
        reward: i64,
    ) -> Result<Option<i64>, AppError> {
        let mut data = self.data.lock().unwrap();
        match data.users.get(&user_id) {
            Some(user) if user.referred_by.is_none() => {}
            _ => return Ok(None),
        }
        if self.fail_coin_credit.load(Ordering::SeqCst) {
            return Err(injected("coin credit"));
        }

        if let Some(user) = data.users.get_mut(&user_id) {
            user.referred_by = Some(referrer_id);
        }
        let balance = data.coin_balances.entry(referrer_id).or_insert(0);
        *balance += reward;
        Ok(Some(*balance))
    }

    async fn coin_balance(&self, user_id: Uuid) -> Result<i64, AppError> {
        Ok(*self
            .data
            .lock()
            .unwrap()
            .coin_balances
            .get(&user_id)
            .unwrap_or(&0))
    }

    async fn compare_and_set_balance(
        &self,
        user_id: Uuid,
        expected: i64,
        new: i64,
    ) -> Result<bool, AppError> {
        let race = self.race_next_cas.lock().unwrap().take();
        let mut data = self.data.lock().unwrap();
        let Some(balance) = data.coin_balances.get_mut(&user_id) else {
            return Ok(false);
        };
        if let Some(delta) = race {
            *balance += delta;
        }
        if *balance != expected || new < 0 {
            return Ok(false);
        }
        *balance = new;
        Ok(true)
    }

    async fn credit_coins(&self, user_id: Uuid, amount: i64) -> Result<i64, AppError> {
        if self.fail_coin_credit.load(Ordering::SeqCst) {
            return Err(injected("coin credit"));
        }
        let mut data = self.data.lock().unwrap();
        let balance = data.coin_balances.entry(user_id).or_insert(0);
        *balance += amount;
        Ok(*balance)
    }

    async fn seller_balance(&self, seller_id: Uuid) -> Result<i64, AppError> {
        Ok(*self
            .data
            .lock()
            .unwrap()
            .seller_balances
            .get(&seller_id)
            .unwrap_or(&0))
    }

    async fn credit_seller(&self, seller_id: Uuid, amount: i64) -> Result<i64, AppError> {
        if self.fail_seller_credit.load(Ordering::SeqCst) {
            return Err(injected("seller credit"));
        }
        let mut data = self.data.lock().unwrap();
        let balance = data.seller_balances.entry(seller_id).or_insert(0);
        *balance += amount;
        Ok(*balance)
    }

    async fn debit_seller_checked(&self, seller_id: Uuid, amount: i64) -> Result<bool, AppError> {
        let mut data = self.data.lock().unwrap();
        match data.seller_balances.get_mut(&seller_id) {
            Some(balance) if *balance >= amount => {
                *balance -= amount;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_game_account(&self, id: Uuid) -> Result<Option<GameAccount>, AppError> {
        Ok(self.data.lock().unwrap().game_accounts.get(&id).cloned())
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        Ok(self.data.lock().unwrap().products.get(&id).cloned())
    }

    async fn mark_account_sold(&self, id: Uuid) -> Result<bool, AppError> {
        if self.fail_mark_sold.load(Ordering::SeqCst) {
            return Err(injected("mark sold"));
        }
        let mut data = self.data.lock().unwrap();
        match data.game_accounts.get_mut(&id) {
            Some(account) if account.status == ACCOUNT_AVAILABLE => {
                account.status = ACCOUNT_SOLD.to_string();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, AppError> {
        if self.fail_order_insert.load(Ordering::SeqCst) {
            return Err(injected("order insert"));
        }
        let order = Order {
            id: Uuid::new_v4(),
            buyer_id: order.buyer_id,
            seller_id: order.seller_id,
            item_kind: order.item_kind,
            item_id: order.item_id,
            item_title: order.item_title,
            coin_amount: order.coin_amount,
            commission: order.commission,
            seller_amount: order.seller_amount,
            status: ORDER_APPROVED.to_string(),
            created_at: Utc::now(),
        };
        self.data.lock().unwrap().orders.push(order.clone());
        Ok(order)
    }

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>, AppError> {
        Ok(self
            .data
            .lock()
            .unwrap()
            .orders
            .iter()
            .find(|o| o.id == id)
            .cloned())
    }

    async fn list_orders_for_buyer(&self, buyer_id: Uuid) -> Result<Vec<Order>, AppError> {
        Ok(self
            .data
            .lock()
            .unwrap()
            .orders
            .iter()
            .rev()
            .filter(|o| o.buyer_id == buyer_id)
            .cloned()
            .collect())
    }

    async fn insert_request(
        &self,
        request: NewServiceRequest,
    ) -> Result<ServiceRequest, AppError> {
        let created = ServiceRequest {
            id: Uuid::new_v4(),
            kind: request.kind,
            user_id: request.user_id,
            coin_amount: request.coin_amount,
            amount_vnd: request.amount_vnd,
            details: request.details,
            status: RequestStatus::Pending,
            review_note: None,
            reviewed_by: None,
            created_at: Utc::now(),
            reviewed_at: None,
        };
        self.data.lock().unwrap().requests.push(created.clone());
        Ok(created)
    }

    async fn find_request(&self, id: Uuid) -> Result<Option<ServiceRequest>, AppError> {
        Ok(self
            .data
            .lock()
            .unwrap()
            .requests
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn list_requests_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ServiceRequest>, AppError> {
        Ok(self
            .data
            .lock()
            .unwrap()
            .requests
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_requests(&self, filter: &RequestFilter) -> Result<Vec<ServiceRequest>, AppError> {
        Ok(self
            .data
            .lock()
            .unwrap()
            .requests
            .iter()
            .rev()
            .filter(|r| filter.status.is_none_or(|s| r.status == s))
            .filter(|r| filter.kind.is_none_or(|k| r.kind == k))
            .cloned()
            .collect())
    }

    async fn resolve_request(
        &self,
        id: Uuid,
        decision: &RequestDecision,
    ) -> Result<Option<ServiceRequest>, AppError> {
        let mut data = self.data.lock().unwrap();
        if self.lose_next_resolve.swap(false, Ordering::SeqCst) {
            if let Some(request) = data.requests.iter_mut().find(|r| r.id == id) {
                request.status = RequestStatus::Rejected;
            }
            return Ok(None);
        }
        match data
            .requests
            .iter_mut()
            .find(|r| r.id == id && r.status == RequestStatus::Pending)
        {
            Some(request) => {
                request.status = decision.status;
                request.reviewed_by = Some(decision.reviewer_id);
                request.review_note = decision.note.clone();
                request.reviewed_at = Some(Utc::now());
                Ok(Some(request.clone()))
            }
            None => Ok(None),
        }
    }

    async fn reopen_request(&self, id: Uuid) -> Result<bool, AppError> {
        let mut data = self.data.lock().unwrap();
        match data
            .requests
            .iter_mut()
            .find(|r| r.id == id && r.status == RequestStatus::Approved)
        {
            Some(request) => {
                request.status = RequestStatus::Pending;
                request.reviewed_by = None;
                request.review_note = None;
                request.reviewed_at = None;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, AppError> {
        if self.fail_notifications.load(Ordering::SeqCst) {
            return Err(injected("notification"));
        }
        let created = Notification {
            id: Uuid::new_v4(),
            user_id: notification.user_id,
            title: notification.title,
            body: notification.body,
            is_read: false,
            created_at: Utc::now(),
        };
        self.data
            .lock()
            .unwrap()
            .notifications
            .push(created.clone());
        Ok(created)
    }

    async fn list_notifications(&self, user_id: Uuid) -> Result<Vec<Notification>, AppError> {
        Ok(self
            .data
            .lock()
            .unwrap()
            .notifications
            .iter()
            .rev()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn mark_notification_read(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let mut data = self.data.lock().unwrap();
        match data
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
        {
            Some(notification) => {
                notification.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_webhook_endpoint(
        &self,
        created_by: Uuid,
        url: &str,
        secret: &str,
    ) -> Result<WebhookEndpoint, AppError> {
        let endpoint = WebhookEndpoint {
            id: Uuid::new_v4(),
            created_by,
            url: url.to_string(),
            secret: secret.to_string(),
            is_active: true,
            created_at: Utc::now(),
        };
        self.data
            .lock()
            .unwrap()
            .webhook_endpoints
            .push(endpoint.clone());
        Ok(endpoint)
    }

    async fn list_active_webhook_endpoints(&self) -> Result<Vec<WebhookEndpoint>, AppError> {
        Ok(self
            .data
            .lock()
            .unwrap()
            .webhook_endpoints
            .iter()
            .filter(|e| e.is_active)
            .cloned()
            .collect())
    }

    async fn deactivate_webhook_endpoint(&self, id: Uuid) -> Result<bool, AppError> {
        let mut data = self.data.lock().unwrap();
        match data
            .webhook_endpoints
            .iter_mut()
            .find(|e| e.id == id && e.is_active)
        {
            Some(endpoint) => {
                endpoint.is_active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn record_webhook_event(&self, event: NewWebhookEvent) -> Result<(), AppError> {
        self.data.lock().unwrap().webhook_events.push(event);
        Ok(())
    }
}
