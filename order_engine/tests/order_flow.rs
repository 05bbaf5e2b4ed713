use order_engine::{
    db_types::{
        DeliveryType,
        GuestInfo,
        NewDish,
        NewOrder,
        NewOrderItem,
        NewRestaurant,
        NewRestaurantOwner,
        OrderStatus,
    },
    order_objects::{OrderQueryFilter, OrderRequester, Pagination},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    CartManagement,
    MerchantManagement,
    OrderFlowApi,
    OrderFlowError,
    SqliteDatabase,
};
use pwy_common::Cents;

async fn setup() -> (SqliteDatabase, OrderFlowApi<SqliteDatabase>) {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    (db.clone(), OrderFlowApi::new(db))
}

/// Seeds two restaurants (different owners), each with one dish. Returns (restaurant_1_id, restaurant_2_id).
async fn seed_restaurants(db: &SqliteDatabase) -> (i64, i64) {
    let mario = db
        .create_owner(NewRestaurantOwner { name: "Mario Rossi".into(), email: "mario@trattoria.example".into() })
        .await
        .expect("Error creating owner");
    let r1 = db
        .create_restaurant(NewRestaurant { owner_id: mario.id, name: "Trattoria Roma".into() })
        .await
        .expect("Error creating restaurant");
    db.create_dish(NewDish { restaurant_id: r1.id, name: "Margherita".into(), price: Cents::from(1000) })
        .await
        .expect("Error creating dish");
    let aiko = db
        .create_owner(NewRestaurantOwner { name: "Aiko Tanaka".into(), email: "aiko@sushi.example".into() })
        .await
        .expect("Error creating owner");
    let r2 = db
        .create_restaurant(NewRestaurant { owner_id: aiko.id, name: "Sushi Kan".into() })
        .await
        .expect("Error creating restaurant");
    db.create_dish(NewDish { restaurant_id: r2.id, name: "Miso Soup".into(), price: Cents::from(500) })
        .await
        .expect("Error creating dish");
    (r1.id, r2.id)
}

fn delivery_order(user_id: i64, items: Vec<NewOrderItem>, total: Cents) -> NewOrder {
    NewOrder::new(user_id, items, total).with_delivery(
        "1 Main St".into(),
        "555-0100".into(),
        DeliveryType::Delivery,
    )
}

#[tokio::test]
async fn order_and_items_are_persisted_and_cart_is_cleared() {
    let (db, api) = setup().await;
    let (r1, r2) = seed_restaurants(&db).await;
    let user_id = 11;
    db.upsert_cart_item(user_id, 1, 2).await.expect("Error filling cart");
    db.upsert_cart_item(user_id, 2, 1).await.expect("Error filling cart");
    assert_eq!(db.cart_for_user(user_id).await.unwrap().len(), 2);

    let items = vec![
        NewOrderItem::new(r1, "Margherita", Cents::from(1000), 2).with_dish_id(1),
        NewOrderItem::new(r1, "Tiramisu", Cents::from(600), 1),
        NewOrderItem::new(r2, "Miso Soup", Cents::from(500), 1).with_dish_id(2),
    ];
    let order = api
        .create_order(delivery_order(user_id, items, Cents::from(3100)))
        .await
        .expect("Error creating order");
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.user_id, Some(user_id));
    assert!(!order.is_guest_order);

    let full = api.order_by_id(order.id, &OrderRequester::user(user_id)).await.expect("Error fetching order");
    assert_eq!(full.items.len(), 3);
    assert_eq!(full.items[0].restaurant_name.as_deref(), Some("Trattoria Roma"));
    assert_eq!(full.items[0].item.dish_id, Some(1));
    assert_eq!(full.items[0].dish_available, Some(true));
    assert_eq!(full.items[1].item.dish_id, None);
    // The cart was emptied in the same transaction
    assert!(db.cart_for_user(user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_creation_rolls_everything_back() {
    let (db, api) = setup().await;
    let (r1, _r2) = seed_restaurants(&db).await;
    let user_id = 12;
    db.upsert_cart_item(user_id, 1, 1).await.expect("Error filling cart");

    // The second item references a restaurant that does not exist, so the item insert violates the foreign key
    // after the order row has already been written. The whole transaction must roll back.
    let items = vec![
        NewOrderItem::new(r1, "Margherita", Cents::from(1000), 1),
        NewOrderItem::new(9999, "Phantom Dish", Cents::from(100), 1),
    ];
    let err = api
        .create_order(delivery_order(user_id, items, Cents::from(1100)))
        .await
        .expect_err("Creation should have failed");
    assert!(matches!(err, OrderFlowError::DatabaseError(_)), "unexpected error: {err}");

    let page = api
        .user_orders(user_id, Pagination::default(), OrderQueryFilter::default())
        .await
        .expect("Error listing orders");
    assert_eq!(page.total, 0, "no partial order may survive");
    assert_eq!(db.cart_for_user(user_id).await.unwrap().len(), 1, "a failed creation leaves the cart untouched");
}

#[tokio::test]
async fn create_order_validations() {
    let (db, api) = setup().await;
    let (r1, _) = seed_restaurants(&db).await;

    let err = api.create_order(delivery_order(13, vec![], Cents::from(0))).await.expect_err("empty order");
    assert!(matches!(err, OrderFlowError::ValidationError(_)));

    let items = vec![NewOrderItem::new(r1, "Margherita", Cents::from(1000), 2)];
    let err = api
        .create_order(delivery_order(13, items.clone(), Cents::from(1500)))
        .await
        .expect_err("total below subtotal");
    assert!(matches!(err, OrderFlowError::ValidationError(_)));

    let err = api
        .create_order(delivery_order(13, vec![NewOrderItem::new(r1, "Margherita", Cents::from(1000), 0)], Cents::from(0)))
        .await
        .expect_err("zero quantity");
    assert!(matches!(err, OrderFlowError::ValidationError(_)));

    // A total above the subtotal is allowed; callers may layer delivery fees on top.
    let order = api.create_order(delivery_order(13, items, Cents::from(2300))).await.expect("Error creating order");
    assert_eq!(order.total_price, Cents::from(2300));
}

#[tokio::test]
async fn guest_orders_are_flagged_and_owner_readable_only() {
    let (db, api) = setup().await;
    let (r1, _) = seed_restaurants(&db).await;

    let guest = GuestInfo { name: "Walk-in Customer".into(), email: "guest@example.com".into() };
    let items = vec![NewOrderItem::new(r1, "Margherita", Cents::from(1000), 1)];
    let order = api
        .create_order(
            NewOrder::for_guest(guest, items, Cents::from(1000)).with_delivery(
                "2 Side St".into(),
                "555-0111".into(),
                DeliveryType::Pickup,
            ),
        )
        .await
        .expect("Error creating guest order");
    assert!(order.is_guest_order);
    assert_eq!(order.user_id, None);
    assert_eq!(order.guest_email.as_deref(), Some("guest@example.com"));

    let err = api.order_by_id(order.id, &OrderRequester::user(5)).await.expect_err("guest order is not user 5's");
    assert!(matches!(err, OrderFlowError::Forbidden(_)));
    let full = api.order_by_id(order.id, &OrderRequester::owner(1)).await.expect("owners can read guest orders");
    assert_eq!(full.order.id, order.id);

    let err = api
        .create_order(NewOrder::for_guest(
            GuestInfo { name: " ".into(), email: String::new() },
            vec![NewOrderItem::new(r1, "Margherita", Cents::from(1000), 1)],
            Cents::from(1000),
        ))
        .await
        .expect_err("guest contact details are required");
    assert!(matches!(err, OrderFlowError::ValidationError(_)));
}

#[tokio::test]
async fn cancellation_rules() {
    let (db, api) = setup().await;
    let (r1, _) = seed_restaurants(&db).await;
    let owner_user = 21;
    let items = || vec![NewOrderItem::new(r1, "Margherita", Cents::from(1000), 1)];

    let order = api.create_order(delivery_order(owner_user, items(), Cents::from(1000))).await.unwrap();

    let err = api.cancel_order(order.id, 22, None).await.expect_err("only the owner may cancel");
    assert!(matches!(err, OrderFlowError::Forbidden(_)));

    let cancelled = api.cancel_order(order.id, owner_user, Some("changed my mind")).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert!(cancelled.details.as_deref().unwrap().contains("changed my mind"));

    let err = api.cancel_order(order.id, owner_user, None).await.expect_err("already cancelled");
    assert!(matches!(err, OrderFlowError::CannotCancel { status: OrderStatus::Cancelled, .. }));

    // Orders that have left the kitchen cannot be cancelled either
    for terminal in [OrderStatus::OutForDelivery, OrderStatus::Delivered] {
        let order = api.create_order(delivery_order(owner_user, items(), Cents::from(1000))).await.unwrap();
        api.update_order_status(order.id, terminal, None).await.unwrap();
        let err = api.cancel_order(order.id, owner_user, None).await.expect_err("not cancellable");
        match err {
            OrderFlowError::CannotCancel { order_id, status } => {
                assert_eq!(order_id, order.id);
                assert_eq!(status, terminal);
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    let err = api.cancel_order(99_999, owner_user, None).await.expect_err("missing order");
    assert!(matches!(err, OrderFlowError::OrderNotFound(99_999)));
}

#[tokio::test]
async fn status_updates_are_scoped_to_participating_restaurants() {
    let (db, api) = setup().await;
    let (r1, r2) = seed_restaurants(&db).await;
    let items = vec![NewOrderItem::new(r1, "Margherita", Cents::from(1000), 1)];
    let order = api.create_order(delivery_order(31, items, Cents::from(1000))).await.unwrap();

    let err = api
        .update_order_status(order.id, OrderStatus::Preparing, Some(r2))
        .await
        .expect_err("restaurant 2 has no items in the order");
    assert!(matches!(err, OrderFlowError::Forbidden(_)));

    let updated = api.update_order_status(order.id, OrderStatus::Preparing, Some(r1)).await.unwrap();
    assert_eq!(updated.status, OrderStatus::Preparing);

    // Backward jumps are allowed; only membership in the status set is enforced
    let updated = api.update_order_status(order.id, OrderStatus::Paid, Some(r1)).await.unwrap();
    assert_eq!(updated.status, OrderStatus::Paid);

    let err = api.update_order_status(99_999, OrderStatus::Ready, None).await.expect_err("missing order");
    assert!(matches!(err, OrderFlowError::OrderNotFound(99_999)));
}

#[tokio::test]
async fn restaurant_listings_cover_only_their_own_items() {
    let (db, api) = setup().await;
    let (r1, r2) = seed_restaurants(&db).await;
    // R1: 2 × $10.00, R2: 1 × $5.00, total $25.00
    let items = vec![
        NewOrderItem::new(r1, "Margherita", Cents::from(1000), 2),
        NewOrderItem::new(r2, "Miso Soup", Cents::from(500), 1),
    ];
    let order = api.create_order(delivery_order(32, items, Cents::from(2500))).await.unwrap();

    let page = api
        .restaurant_orders(r1, Pagination::default(), OrderQueryFilter::default())
        .await
        .expect("Error listing restaurant orders");
    assert_eq!(page.total, 1);
    assert_eq!(page.orders[0].order.id, order.id);
    assert_eq!(page.orders[0].items.len(), 1);
    assert_eq!(page.orders[0].subtotal, Cents::from(2000));
    // The whole-order total is still visible on the order row
    assert_eq!(page.orders[0].order.total_price, Cents::from(2500));

    let page = api.restaurant_orders(r2, Pagination::default(), OrderQueryFilter::default()).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.orders[0].order.id, order.id);
    assert_eq!(page.orders[0].subtotal, Cents::from(500));
}

#[tokio::test]
async fn user_listing_supports_pagination_and_status_filters() {
    let (db, api) = setup().await;
    let (r1, _) = seed_restaurants(&db).await;
    let user_id = 41;
    let mut last_order_id = 0;
    for _ in 0..3 {
        let items = vec![NewOrderItem::new(r1, "Margherita", Cents::from(1000), 1)];
        last_order_id = api.create_order(delivery_order(user_id, items, Cents::from(1000))).await.unwrap().id;
    }
    api.cancel_order(last_order_id, user_id, None).await.unwrap();

    let page = api
        .user_orders(user_id, Pagination::new(0, 2), OrderQueryFilter::default())
        .await
        .expect("Error listing orders");
    assert_eq!(page.total, 3);
    assert_eq!(page.orders.len(), 2);

    let page = api
        .user_orders(user_id, Pagination::default(), OrderQueryFilter::default().with_status(OrderStatus::Cancelled))
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.orders[0].order.id, last_order_id);

    let ancient = chrono::Utc::now() - chrono::Duration::days(365);
    let page = api
        .user_orders(user_id, Pagination::default(), OrderQueryFilter::default().since(ancient))
        .await
        .unwrap();
    assert_eq!(page.total, 3, "a filter window covering everything changes nothing");

    // Another user sees nothing
    let page = api.user_orders(42, Pagination::default(), OrderQueryFilter::default()).await.unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn dashboard_statistics() {
    let (db, api) = setup().await;
    let (r1, r2) = seed_restaurants(&db).await;
    let user_id = 51;
    let order_a = api
        .create_order(delivery_order(
            user_id,
            vec![
                NewOrderItem::new(r1, "Margherita", Cents::from(1000), 2),
                NewOrderItem::new(r2, "Miso Soup", Cents::from(500), 1),
            ],
            Cents::from(2500),
        ))
        .await
        .unwrap();
    let order_b = api
        .create_order(delivery_order(user_id, vec![NewOrderItem::new(r1, "Tiramisu", Cents::from(500), 1)], Cents::from(500)))
        .await
        .unwrap();
    api.update_order_status(order_a.id, OrderStatus::Delivered, None).await.unwrap();
    api.cancel_order(order_b.id, user_id, None).await.unwrap();

    let stats = api.user_stats(user_id).await.expect("Error fetching user stats");
    assert_eq!(stats.total_orders, 2);
    assert_eq!(stats.total_spent, Cents::from(3000));
    assert_eq!(stats.average_order_value, Cents::from(1500));
    assert_eq!(stats.delivered_orders, 1);
    assert_eq!(stats.cancelled_orders, 1);

    let stats = api.restaurant_stats(r1).await.expect("Error fetching restaurant stats");
    assert_eq!(stats.total_orders, 2);
    assert_eq!(stats.items_sold, 3);
    assert_eq!(stats.gross_revenue, Cents::from(2500));

    let stats = api.restaurant_stats(r2).await.unwrap();
    assert_eq!(stats.total_orders, 1);
    assert_eq!(stats.gross_revenue, Cents::from(500));

    let stats = api.user_stats(999).await.unwrap();
    assert_eq!(stats.total_orders, 0);
    assert_eq!(stats.total_spent, Cents::from(0));
}
