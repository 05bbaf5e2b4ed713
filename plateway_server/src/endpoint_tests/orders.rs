use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use order_engine::{
    db_types::{DeliveryType, Order, OrderStatus},
    order_objects::OrderWithItems,
    MerchantApi,
    OrderFlowApi,
};
use pwy_common::Cents;
use serde_json::json;

use super::{
    helpers::{get_request, issue_token, post_request},
    mocks::{MockMerchantDb, MockOrderDb},
};
use crate::{
    auth::Role,
    routes::{CancelOrderRoute, CreateOrderRoute, MyOrdersRoute, OrderByIdRoute, UpdateOrderStatusRoute},
};

fn order_response(id: i64, user_id: Option<i64>, status: OrderStatus) -> Order {
    Order {
        id,
        user_id,
        total_price: Cents::from(2500),
        status,
        details: None,
        delivery_address: "1 Main St".to_string(),
        delivery_phone: "555-0100".to_string(),
        delivery_type: DeliveryType::Delivery,
        platform_fee: Cents::from(125),
        is_guest_order: user_id.is_none(),
        guest_name: None,
        guest_email: None,
        created_at: Utc.with_ymd_and_hms(2024, 2, 29, 13, 30, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 2, 29, 13, 30, 0).unwrap(),
    }
}

fn configure_orders(db: MockOrderDb) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(OrderFlowApi::new(db)))
            .service(MyOrdersRoute::<MockOrderDb>::new())
            .service(CreateOrderRoute::<MockOrderDb>::new())
            .service(OrderByIdRoute::<MockOrderDb>::new())
            .service(CancelOrderRoute::<MockOrderDb>::new());
    }
}

#[actix_web::test]
async fn fetch_my_orders_no_token() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("", "/orders", configure_orders(MockOrderDb::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("No access token"), "unexpected body: {body}");
}

#[actix_web::test]
async fn fetch_my_orders() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderDb::new();
    db.expect_count_user_orders().returning(|_, _| Ok(2));
    db.expect_fetch_user_orders().returning(|user_id, _, _| {
        Ok(vec![
            OrderWithItems { order: order_response(1, Some(user_id), OrderStatus::Delivered), items: vec![] },
            OrderWithItems { order: order_response(2, Some(user_id), OrderStatus::Pending), items: vec![] },
        ])
    });
    let token = issue_token(42, vec![Role::Customer]);
    let (status, body) = get_request(&token, "/orders", configure_orders(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"total\":2"), "unexpected body: {body}");
    assert!(body.contains("\"status\":\"delivered\""), "unexpected body: {body}");
}

#[actix_web::test]
async fn owner_sessions_cannot_use_the_customer_listing() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(42, vec![Role::Owner]);
    let (status, _body) = get_request(&token, "/orders", configure_orders(MockOrderDb::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn fetch_someone_elses_order_is_forbidden() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderDb::new();
    db.expect_fetch_order_with_items()
        .returning(|id| Ok(Some(OrderWithItems { order: order_response(id, Some(2), OrderStatus::Pending), items: vec![] })));
    let token = issue_token(1, vec![Role::Customer]);
    let (status, body) = get_request(&token, "/orders/10", configure_orders(db)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("error"), "unexpected body: {body}");
}

#[actix_web::test]
async fn owners_may_fetch_any_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderDb::new();
    db.expect_fetch_order_with_items()
        .returning(|id| Ok(Some(OrderWithItems { order: order_response(id, Some(2), OrderStatus::Pending), items: vec![] })));
    let token = issue_token(77, vec![Role::Owner]);
    let (status, body) = get_request(&token, "/orders/10", configure_orders(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"id\":10"), "unexpected body: {body}");
}

#[actix_web::test]
async fn missing_orders_are_404() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderDb::new();
    db.expect_fetch_order_with_items().returning(|_| Ok(None));
    let token = issue_token(1, vec![Role::Customer]);
    let (status, _body) = get_request(&token, "/orders/999", configure_orders(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn create_order_rejects_empty_items() {
    let _ = env_logger::try_init().ok();
    // Validation fails before the backend is touched, so no expectations are needed on the mock.
    let token = issue_token(42, vec![Role::Customer]);
    let body = json!({
        "items": [],
        "total_price": 0,
        "delivery_address": "1 Main St",
        "delivery_phone": "555-0100",
        "delivery_type": "delivery"
    });
    let (status, body) = post_request(&token, "/orders", body, configure_orders(MockOrderDb::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("at least one item"), "unexpected body: {body}");
}

#[actix_web::test]
async fn cancelling_a_delivered_order_conflicts() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderDb::new();
    db.expect_fetch_order().returning(|id| Ok(Some(order_response(id, Some(42), OrderStatus::Delivered))));
    let token = issue_token(42, vec![Role::Customer]);
    let (status, body) =
        post_request(&token, "/orders/5/cancel", json!({ "reason": "too slow" }), configure_orders(db)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("delivered"), "the error must name the current status: {body}");
    assert!(body.contains("pending, confirmed, or preparing"), "the error must name the allowed set: {body}");
}

#[actix_web::test]
async fn cancelling_your_own_pending_order_works() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderDb::new();
    db.expect_fetch_order().returning(|id| Ok(Some(order_response(id, Some(42), OrderStatus::Pending))));
    db.expect_cancel_order()
        .withf(|_, reason| reason.as_deref() == Some("too slow"))
        .returning(|id, _| Ok(order_response(id, Some(42), OrderStatus::Cancelled)));
    let token = issue_token(42, vec![Role::Customer]);
    let (status, body) =
        post_request(&token, "/orders/5/cancel", json!({ "reason": "too slow" }), configure_orders(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"status\":\"cancelled\""), "unexpected body: {body}");
}

fn configure_status_update(db: MockOrderDb, merchants: MockMerchantDb) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(OrderFlowApi::new(db)))
            .app_data(web::Data::new(MerchantApi::new(merchants)))
            .service(UpdateOrderStatusRoute::<MockOrderDb, MockMerchantDb>::new());
    }
}

fn owned_restaurant(id: i64, owner_id: i64) -> order_engine::db_types::Restaurant {
    order_engine::db_types::Restaurant {
        id,
        owner_id,
        name: "Trattoria Roma".to_string(),
        stripe_account_id: None,
        created_at: Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap(),
    }
}

#[actix_web::test]
async fn status_strings_outside_the_allowed_set_are_rejected() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(10, vec![Role::Owner]);
    let body = json!({ "status": "burnt", "restaurant_id": 5 });
    let (status, _body) =
        post_request(&token, "/orders/5/status", body, configure_status_update(MockOrderDb::new(), MockMerchantDb::new()))
            .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn restaurants_cannot_update_orders_they_have_no_part_in() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderDb::new();
    db.expect_restaurant_has_items_in_order().returning(|_, _| Ok(false));
    let mut merchants = MockMerchantDb::new();
    merchants.expect_fetch_restaurant().returning(|id| Ok(Some(owned_restaurant(id, 10))));
    let token = issue_token(10, vec![Role::Owner]);
    let body = json!({ "status": "preparing", "restaurant_id": 5 });
    let (status, body) = post_request(&token, "/orders/7/status", body, configure_status_update(db, merchants)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("no items in order"), "unexpected body: {body}");
}

#[actix_web::test]
async fn owners_cannot_impersonate_other_restaurants() {
    let _ = env_logger::try_init().ok();
    let mut merchants = MockMerchantDb::new();
    merchants.expect_fetch_restaurant().returning(|id| Ok(Some(owned_restaurant(id, 999))));
    let token = issue_token(10, vec![Role::Owner]);
    let body = json!({ "status": "preparing", "restaurant_id": 5 });
    let (status, _body) =
        post_request(&token, "/orders/7/status", body, configure_status_update(MockOrderDb::new(), merchants)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn participating_restaurants_may_update_the_status() {
    let _ = env_logger::try_init().ok();
    let mut db = MockOrderDb::new();
    db.expect_restaurant_has_items_in_order().returning(|_, _| Ok(true));
    db.expect_update_order_status()
        .withf(|_, status| *status == OrderStatus::OutForDelivery)
        .returning(|id, status| Ok(order_response(id, Some(42), status)));
    let mut merchants = MockMerchantDb::new();
    merchants.expect_fetch_restaurant().returning(|id| Ok(Some(owned_restaurant(id, 10))));
    let token = issue_token(10, vec![Role::Owner]);
    let body = json!({ "status": "out_for_delivery", "restaurant_id": 5 });
    let (status, body) = post_request(&token, "/orders/7/status", body, configure_status_update(db, merchants)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"status\":\"out_for_delivery\""), "unexpected body: {body}");
}
