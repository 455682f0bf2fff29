//! Shared state and HTTP router.

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::Config, handlers, middleware, services::notifier::OrderNotifier, store::ShopStore,
};

/// State shared with every handler via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ShopStore>,
    pub notifier: Arc<dyn OrderNotifier>,
    pub config: Arc<Config>,
}

/// Build the full router: public, authenticated and admin route groups.
pub fn router(state: AppState) -> Router {
    // Back-office routes: session auth first, then the admin gate
    let admin_routes = Router::new()
        .route(
            "/api/v1/admin/requests",
            get(handlers::requests::admin_list_requests),
        )
        .route(
            "/api/v1/admin/requests/{id}/approve",
            post(handlers::requests::approve_request),
        )
        .route(
            "/api/v1/admin/requests/{id}/reject",
            post(handlers::requests::reject_request),
        )
        .route(
            "/api/v1/admin/webhooks",
            post(handlers::webhooks::create_webhook).get(handlers::webhooks::list_webhooks),
        )
        .route(
            "/api/v1/admin/webhooks/{id}",
            delete(handlers::webhooks::delete_webhook),
        )
        .route_layer(axum_middleware::from_fn(middleware::auth::require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    let authenticated_routes = Router::new()
        .route("/api/v1/wallet", get(handlers::wallet::get_wallet))
        .route(
            "/api/v1/purchases",
            post(handlers::purchases::create_purchase),
        )
        .route("/api/v1/orders", get(handlers::orders::list_orders))
        .route("/api/v1/orders/{id}", get(handlers::orders::get_order))
        .route(
            "/api/v1/referrals/code",
            get(handlers::referrals::get_referral_code),
        )
        .route(
            "/api/v1/referrals/redeem",
            post(handlers::referrals::redeem_referral),
        )
        .route(
            "/api/v1/requests",
            get(handlers::requests::list_my_requests),
        )
        .route(
            "/api/v1/requests/coin-purchases",
            post(handlers::requests::create_coin_purchase),
        )
        .route(
            "/api/v1/requests/bot-rentals",
            post(handlers::requests::create_bot_rental),
        )
        .route(
            "/api/v1/requests/withdrawals",
            post(handlers::requests::create_withdrawal),
        )
        .route(
            "/api/v1/notifications",
            get(handlers::notifications::list_notifications),
        )
        .route(
            "/api/v1/notifications/{id}/read",
            post(handlers::notifications::mark_read),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .merge(authenticated_routes)
        .merge(admin_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::{
        models::user::UserRole, services::notifier::testing::RecordingNotifier,
        store::memory::MemoryStore,
    };

    struct TestApp {
        store: Arc<MemoryStore>,
        notifier: Arc<RecordingNotifier>,
        router: Router,
    }

    fn test_app() -> TestApp {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let config = Config::from_vars([(
            "DATABASE_URL".to_string(),
            "postgres://localhost/bonzshop_test".to_string(),
        )])
        .unwrap();
        let state = AppState {
            store: store.clone(),
            notifier: notifier.clone(),
            config: Arc::new(config),
        };
        TestApp {
            store,
            notifier,
            router: router(state),
        }
    }

    fn login(app: &TestApp, name: &str, role: UserRole) -> (Uuid, String) {
        let user = app.store.add_user(name, role);
        let token = format!("token-{}", user.id);
        app.store.add_session(user.id, &token);
        (user.id, token)
    }

    async fn send(
        app: &TestApp,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = test_app();
        let (status, body) = send(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn protected_routes_require_a_session() {
        let app = test_app();

        let (status, body) = send(&app, "GET", "/api/v1/wallet", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "unauthorized");

        let (status, _) = send(&app, "GET", "/api/v1/wallet", Some("made-up"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn banned_users_are_rejected() {
        let app = test_app();
        let (user, token) = login(&app, "Spammer", UserRole::User);
        app.store.ban_user(user);

        let (status, _) = send(&app, "GET", "/api/v1/wallet", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn purchase_end_to_end() {
        let app = test_app();
        let (buyer, token) = login(&app, "Buyer", UserRole::User);
        let (seller, _) = login(&app, "Seller", UserRole::Seller);
        app.store.set_coin_balance(buyer, 300);
        let account = app.store.add_game_account(seller, 120_000, false);

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/purchases",
            Some(&token),
            Some(json!({ "coin_amount": 120, "account_id": account.id })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["new_balance"], 180);
        assert_eq!(body["order"]["status"], "approved");
        assert_eq!(body["order"]["item_kind"], "game_account");
        assert_eq!(app.notifier.orders.lock().unwrap().len(), 1);

        let (status, body) = send(&app, "GET", "/api/v1/wallet", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["coin_balance"], 180);

        let (status, body) = send(&app, "GET", "/api/v1/orders", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        // Same account again: already sold.
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/purchases",
            Some(&token),
            Some(json!({ "coin_amount": 120, "account_id": account.id })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "item_unavailable");
    }

    #[tokio::test]
    async fn balance_conflict_is_409() {
        let app = test_app();
        let (buyer, token) = login(&app, "Buyer", UserRole::User);
        let (seller, _) = login(&app, "Seller", UserRole::Seller);
        app.store.set_coin_balance(buyer, 300);
        let account = app.store.add_game_account(seller, 100_000, false);
        *app.store.race_next_cas.lock().unwrap() = Some(-1);

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/purchases",
            Some(&token),
            Some(json!({ "coin_amount": 100, "account_id": account.id })),
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "balance_conflict");
    }

    #[tokio::test]
    async fn orders_are_visible_to_buyer_and_seller_only() {
        let app = test_app();
        let (buyer, buyer_token) = login(&app, "Buyer", UserRole::User);
        let (seller, seller_token) = login(&app, "Seller", UserRole::Seller);
        let (_, other_token) = login(&app, "Other", UserRole::User);
        app.store.set_coin_balance(buyer, 50);
        let product = app.store.add_product(seller, 9_000, true);

        let (_, body) = send(
            &app,
            "POST",
            "/api/v1/purchases",
            Some(&buyer_token),
            Some(json!({ "coin_amount": 9, "product_id": product.id })),
        )
        .await;
        let uri = format!("/api/v1/orders/{}", body["order"]["id"].as_str().unwrap());

        let (status, _) = send(&app, "GET", &uri, Some(&buyer_token), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "GET", &uri, Some(&seller_token), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "GET", &uri, Some(&other_token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn admin_routes_are_forbidden_to_users() {
        let app = test_app();
        let (_, token) = login(&app, "User", UserRole::User);

        let (status, body) = send(&app, "GET", "/api/v1/admin/requests", Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "forbidden");

        let (status, _) = send(&app, "GET", "/api/v1/admin/requests", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn topup_review_flow() {
        let app = test_app();
        let (user, token) = login(&app, "Lan", UserRole::User);
        let (_, admin_token) = login(&app, "Admin", UserRole::Admin);

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/requests/coin-purchases",
            Some(&token),
            Some(json!({ "amount_vnd": 100_000, "transfer_note": "BONZ LAN" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "pending");
        assert_eq!(body["kind"], "coin_purchase");
        let id = body["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            "GET",
            "/api/v1/admin/requests?status=pending&kind=coin_purchase",
            Some(&admin_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/v1/admin/requests/{id}/approve"),
            Some(&admin_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "approved");
        assert_eq!(app.store.coin_balance(user).await.unwrap(), 100);

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/v1/admin/requests/{id}/reject"),
            Some(&admin_token),
            Some(json!({ "reason": "duplicate" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid_transition");

        let (status, body) = send(&app, "GET", "/api/v1/notifications", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let notifications = body.as_array().unwrap();
        assert_eq!(notifications.len(), 1);

        let notification_id = notifications[0]["id"].as_str().unwrap();
        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/v1/notifications/{notification_id}/read"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn referral_redeem_over_http() {
        let app = test_app();
        let (referrer, referrer_token) = login(&app, "Hoa", UserRole::User);
        let (_, token) = login(&app, "Tuan", UserRole::User);

        let (_, body) = send(
            &app,
            "GET",
            "/api/v1/referrals/code",
            Some(&referrer_token),
            None,
        )
        .await;
        let code = body["referral_code"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/referrals/redeem",
            Some(&token),
            Some(json!({ "code": code })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reward_coins"], 10);
        assert_eq!(app.store.coin_balance(referrer).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn admin_manages_webhooks() {
        let app = test_app();
        let (_, admin_token) = login(&app, "Admin", UserRole::Admin);

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/admin/webhooks",
            Some(&admin_token),
            Some(json!({ "url": "https://hooks.bonzshop.vn/orders" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["secret"].as_str().unwrap().len(), 64);
        let id = body["id"].as_str().unwrap().to_string();

        let (status, body) = send(&app, "GET", "/api/v1/admin/webhooks", Some(&admin_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body[0].get("secret").is_none());

        let uri = format!("/api/v1/admin/webhooks/{id}");
        let (status, _) = send(&app, "DELETE", &uri, Some(&admin_token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, "DELETE", &uri, Some(&admin_token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
