use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use order_engine::{
    db_types::{Restaurant, RestaurantOwner},
    MerchantApi,
};
use pwy_common::Cents;
use serde_json::json;

use super::{
    helpers::{get_request, issue_token, post_request},
    mocks::{MockGateway, MockMerchantDb},
};
use crate::{
    auth::Role,
    integrations::stripe::PaymentGatewayApi,
    stripe_routes::{
        ActivateDemoSubscriptionRoute,
        ConnectAccountRoute,
        PaymentIntentRoute,
        SubscriptionCheckoutRoute,
        SubscriptionStatusRoute,
    },
};

fn restaurant(id: i64, owner_id: i64, account: Option<&str>) -> Restaurant {
    Restaurant {
        id,
        owner_id,
        name: "Trattoria Roma".to_string(),
        stripe_account_id: account.map(String::from),
        created_at: Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap(),
    }
}

fn owner(id: i64, customer: Option<&str>, is_subscribed: bool) -> RestaurantOwner {
    RestaurantOwner {
        id,
        name: "Mario Rossi".to_string(),
        email: "mario@trattoria.example".to_string(),
        stripe_customer_id: customer.map(String::from),
        is_subscribed,
        created_at: Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap(),
    }
}

fn configure(
    merchants: MockMerchantDb,
    payments_db: MockMerchantDb,
    gateway: Option<MockGateway>,
) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(MerchantApi::new(merchants)))
            .app_data(web::Data::new(PaymentGatewayApi::new(payments_db, gateway)))
            .service(ConnectAccountRoute::<MockMerchantDb, MockGateway>::new())
            .service(PaymentIntentRoute::<MockMerchantDb, MockGateway>::new())
            .service(SubscriptionCheckoutRoute::<MockMerchantDb, MockGateway>::new())
            .service(SubscriptionStatusRoute::<MockMerchantDb, MockGateway>::new())
            .service(ActivateDemoSubscriptionRoute::<MockMerchantDb, MockGateway>::new());
    }
}

//----------------------------------------------  Payment intents  ----------------------------------------------

#[actix_web::test]
async fn payment_intent_splits_the_platform_fee() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMerchantDb::new();
    db.expect_fetch_restaurant().returning(|id| Ok(Some(restaurant(id, 10, Some("acct_123")))));
    let mut gateway = MockGateway::new();
    gateway
        .expect_create_payment_intent()
        .withf(|req| {
            req.amount == Cents::from(10_000)
                && req.application_fee == Cents::from(500)
                && req.destination == "acct_123"
                && req.order_id == 55
        })
        .returning(|req| {
            Ok(stripe_tools::PaymentIntent {
                id: "pi_1".to_string(),
                client_secret: Some("pi_1_secret".to_string()),
                amount: req.amount.value(),
                application_fee_amount: Some(req.application_fee.value()),
                status: Some("requires_payment_method".to_string()),
            })
        });
    let token = issue_token(1, vec![Role::Customer]);
    let body = json!({ "order_id": 55, "restaurant_id": 7, "amount": 10000 });
    let (status, body) =
        post_request(&token, "/payment-intents", body, configure(MockMerchantDb::new(), db, Some(gateway))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"platform_fee\":500"), "unexpected body: {body}");
    assert!(body.contains("\"client_secret\":\"pi_1_secret\""), "unexpected body: {body}");
    assert!(body.contains("\"demo_mode\":false"), "unexpected body: {body}");
}

#[actix_web::test]
async fn payment_intent_needs_onboarding_first() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMerchantDb::new();
    db.expect_fetch_restaurant().returning(|id| Ok(Some(restaurant(id, 10, None))));
    let token = issue_token(1, vec![Role::Customer]);
    let body = json!({ "order_id": 55, "restaurant_id": 7, "amount": 10000 });
    let (status, body) = post_request(
        &token,
        "/payment-intents",
        body,
        configure(MockMerchantDb::new(), db, Some(MockGateway::new())),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("\"needs_onboarding\":true"), "unexpected body: {body}");
}

#[actix_web::test]
async fn payment_intent_demo_mode_without_a_processor() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMerchantDb::new();
    db.expect_fetch_restaurant().returning(|id| Ok(Some(restaurant(id, 10, None))));
    let token = issue_token(1, vec![Role::Customer]);
    let body = json!({ "order_id": 55, "restaurant_id": 7, "amount": 10000 });
    let (status, body) = post_request(&token, "/payment-intents", body, configure(MockMerchantDb::new(), db, None)).await;
    assert_eq!(status, StatusCode::OK, "demo mode is a fallback, not an error: {body}");
    assert!(body.contains("\"demo_mode\":true"), "unexpected body: {body}");
    assert!(body.contains("\"platform_fee\":500"), "the fee is still computed in demo mode: {body}");
    assert!(body.contains("pi_demo_55_secret"), "unexpected body: {body}");
}

#[actix_web::test]
async fn gateway_failures_never_leak_vendor_errors() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMerchantDb::new();
    db.expect_fetch_restaurant().returning(|id| Ok(Some(restaurant(id, 10, Some("acct_123")))));
    let mut gateway = MockGateway::new();
    gateway.expect_create_payment_intent().returning(|_| {
        Err(stripe_tools::StripeApiError::QueryError { status: 402, message: "card_declined: fraud".to_string() })
    });
    let token = issue_token(1, vec![Role::Customer]);
    let body = json!({ "order_id": 55, "restaurant_id": 7, "amount": 10000 });
    let (status, body) =
        post_request(&token, "/payment-intents", body, configure(MockMerchantDb::new(), db, Some(gateway))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.contains("card_declined"), "vendor error shapes must not reach clients: {body}");
    assert!(body.contains("payment gateway"), "unexpected body: {body}");
}

//----------------------------------------------  Connected accounts  -------------------------------------------

#[actix_web::test]
async fn connect_account_is_idempotent_once_stored() {
    let _ = env_logger::try_init().ok();
    let mut merchants = MockMerchantDb::new();
    merchants.expect_fetch_restaurant().returning(|id| Ok(Some(restaurant(id, 10, Some("acct_existing")))));
    let mut payments_db = MockMerchantDb::new();
    payments_db.expect_fetch_restaurant().returning(|id| Ok(Some(restaurant(id, 10, Some("acct_existing")))));
    // No expectations on the gateway: the stored id must short-circuit the processor call.
    let token = issue_token(10, vec![Role::Owner]);
    let body = json!({ "restaurant_id": 7 });
    let (status, body) =
        post_request(&token, "/connect/accounts", body, configure(merchants, payments_db, Some(MockGateway::new())))
            .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("acct_existing"), "unexpected body: {body}");
}

#[actix_web::test]
async fn connect_account_creates_and_persists_on_first_call() {
    let _ = env_logger::try_init().ok();
    let mut merchants = MockMerchantDb::new();
    merchants.expect_fetch_restaurant().returning(|id| Ok(Some(restaurant(id, 10, None))));
    let mut payments_db = MockMerchantDb::new();
    payments_db.expect_fetch_restaurant().returning(|id| Ok(Some(restaurant(id, 10, None))));
    payments_db.expect_fetch_owner().returning(|id| Ok(Some(owner(id, None, false))));
    payments_db
        .expect_set_connected_account()
        .withf(|_, account_id| account_id == "acct_new_1")
        .times(1)
        .returning(|id, account_id| Ok(restaurant(id, 10, Some(account_id))));
    let mut gateway = MockGateway::new();
    gateway.expect_create_account().returning(|_| {
        Ok(stripe_tools::ConnectedAccount {
            id: "acct_new_1".to_string(),
            charges_enabled: false,
            payouts_enabled: false,
            details_submitted: false,
        })
    });
    let token = issue_token(10, vec![Role::Owner]);
    let body = json!({ "restaurant_id": 7 });
    let (status, body) =
        post_request(&token, "/connect/accounts", body, configure(merchants, payments_db, Some(gateway))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("acct_new_1"), "unexpected body: {body}");
}

#[actix_web::test]
async fn customers_cannot_touch_connect_routes() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(10, vec![Role::Customer]);
    let body = json!({ "restaurant_id": 7 });
    let (status, _body) = post_request(
        &token,
        "/connect/accounts",
        body,
        configure(MockMerchantDb::new(), MockMerchantDb::new(), Some(MockGateway::new())),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

//----------------------------------------------  Subscriptions  ------------------------------------------------

#[actix_web::test]
async fn subscription_status_self_heals_a_stale_flag() {
    let _ = env_logger::try_init().ok();
    let mut payments_db = MockMerchantDb::new();
    payments_db.expect_fetch_owner().returning(|id| Ok(Some(owner(id, Some("cus_9"), true))));
    // The local flag says subscribed, the processor disagrees: the flag must be corrected exactly once.
    payments_db
        .expect_set_subscribed()
        .withf(|owner_id, subscribed| *owner_id == 3 && !subscribed)
        .times(1)
        .returning(|id, subscribed| Ok(owner(id, Some("cus_9"), subscribed)));
    let mut gateway = MockGateway::new();
    gateway.expect_list_active_subscriptions().returning(|_| Ok(vec![]));
    let token = issue_token(3, vec![Role::Owner]);
    let (status, body) =
        get_request(&token, "/subscriptions/status", configure(MockMerchantDb::new(), payments_db, Some(gateway)))
            .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"subscribed\":false"), "the corrected value must be returned: {body}");
}

#[actix_web::test]
async fn subscription_status_in_sync_leaves_the_flag_alone() {
    let _ = env_logger::try_init().ok();
    let mut payments_db = MockMerchantDb::new();
    payments_db.expect_fetch_owner().returning(|id| Ok(Some(owner(id, Some("cus_9"), true))));
    // No expect_set_subscribed: a write here would fail the test.
    let mut gateway = MockGateway::new();
    gateway.expect_list_active_subscriptions().returning(|_| {
        Ok(vec![stripe_tools::Subscription { id: "sub_1".to_string(), status: "active".to_string() }])
    });
    let token = issue_token(3, vec![Role::Owner]);
    let (status, body) =
        get_request(&token, "/subscriptions/status", configure(MockMerchantDb::new(), payments_db, Some(gateway)))
            .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"subscribed\":true"), "unexpected body: {body}");
}

#[actix_web::test]
async fn owners_without_a_billing_customer_are_not_subscribed() {
    let _ = env_logger::try_init().ok();
    let mut payments_db = MockMerchantDb::new();
    payments_db.expect_fetch_owner().returning(|id| Ok(Some(owner(id, None, false))));
    let token = issue_token(3, vec![Role::Owner]);
    let (status, body) = get_request(
        &token,
        "/subscriptions/status",
        configure(MockMerchantDb::new(), payments_db, Some(MockGateway::new())),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"subscribed\":false"), "unexpected body: {body}");
}

#[actix_web::test]
async fn subscription_checkout_creates_the_billing_customer_once() {
    let _ = env_logger::try_init().ok();
    let mut payments_db = MockMerchantDb::new();
    payments_db.expect_fetch_owner().returning(|id| Ok(Some(owner(id, None, false))));
    payments_db
        .expect_set_stripe_customer()
        .withf(|owner_id, customer_id| *owner_id == 3 && customer_id == "cus_new")
        .times(1)
        .returning(|id, customer_id| Ok(owner(id, Some(customer_id), false)));
    let mut gateway = MockGateway::new();
    gateway.expect_create_customer().times(1).returning(|_, email| {
        Ok(stripe_tools::Customer { id: "cus_new".to_string(), email: Some(email.to_string()) })
    });
    gateway.expect_create_subscription_checkout().returning(|_, _, _| {
        Ok(stripe_tools::CheckoutSession {
            id: "cs_1".to_string(),
            url: Some("https://pay.example/cs_1".to_string()),
        })
    });
    let token = issue_token(3, vec![Role::Owner]);
    let body = json!({ "success_url": "https://app.example/done", "cancel_url": "https://app.example/cancel" });
    let (status, body) = post_request(
        &token,
        "/subscriptions/checkout",
        body,
        configure(MockMerchantDb::new(), payments_db, Some(gateway)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("https://pay.example/cs_1"), "unexpected body: {body}");
}

#[actix_web::test]
async fn demo_subscription_activation_sets_the_local_flag() {
    let _ = env_logger::try_init().ok();
    let mut payments_db = MockMerchantDb::new();
    payments_db
        .expect_set_subscribed()
        .withf(|owner_id, subscribed| *owner_id == 3 && *subscribed)
        .times(1)
        .returning(|id, subscribed| Ok(owner(id, None, subscribed)));
    let token = issue_token(3, vec![Role::Owner]);
    let (status, body) = post_request(
        &token,
        "/subscriptions/demo",
        json!({}),
        configure(MockMerchantDb::new(), payments_db, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"subscribed\":true"), "unexpected body: {body}");
    assert!(body.contains("\"demo_mode\":true"), "unexpected body: {body}");
}
