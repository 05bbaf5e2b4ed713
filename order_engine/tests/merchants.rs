use order_engine::{
    db_types::{NewDish, NewRestaurant, NewRestaurantOwner},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    CartManagement,
    MerchantApi,
    MerchantApiError,
    MerchantManagement,
    SqliteDatabase,
};
use pwy_common::Cents;

async fn setup() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

#[tokio::test]
async fn merchant_records_round_trip() {
    let db = setup().await;
    let api = MerchantApi::new(db.clone());

    let owner = api
        .create_owner(NewRestaurantOwner { name: "Priya Shah".into(), email: "priya@curryhouse.example".into() })
        .await
        .expect("Error creating owner");
    assert!(owner.stripe_customer_id.is_none());
    assert!(!owner.is_subscribed);

    let restaurant = api
        .create_restaurant(NewRestaurant { owner_id: owner.id, name: "Curry House".into() })
        .await
        .expect("Error creating restaurant");
    assert!(restaurant.stripe_account_id.is_none());
    assert!(api.restaurant_belongs_to(restaurant.id, owner.id).await.unwrap());
    assert!(!api.restaurant_belongs_to(restaurant.id, owner.id + 1).await.unwrap());

    let dish = api
        .create_dish(NewDish { restaurant_id: restaurant.id, name: "Chana Masala".into(), price: Cents::from(950) })
        .await
        .expect("Error creating dish");
    assert!(dish.available);
    assert_eq!(api.dish(dish.id).await.unwrap().price, Cents::from(950));

    let err = api.restaurant(999).await.expect_err("missing restaurant");
    assert!(matches!(err, MerchantApiError::RestaurantNotFound(999)));
    let err = api.owner(999).await.expect_err("missing owner");
    assert!(matches!(err, MerchantApiError::OwnerNotFound(999)));
}

#[tokio::test]
async fn billing_identifiers_are_persisted() {
    let db = setup().await;
    let owner = db
        .create_owner(NewRestaurantOwner { name: "Priya Shah".into(), email: "priya@curryhouse.example".into() })
        .await
        .unwrap();
    let restaurant =
        db.create_restaurant(NewRestaurant { owner_id: owner.id, name: "Curry House".into() }).await.unwrap();

    let owner = db.set_stripe_customer(owner.id, "cus_test_123").await.expect("Error setting customer");
    assert_eq!(owner.stripe_customer_id.as_deref(), Some("cus_test_123"));

    let owner = db.set_subscribed(owner.id, true).await.expect("Error setting flag");
    assert!(owner.is_subscribed);
    let owner = db.set_subscribed(owner.id, false).await.unwrap();
    assert!(!owner.is_subscribed);

    let restaurant = db
        .set_connected_account(restaurant.id, "acct_test_456")
        .await
        .expect("Error setting connected account");
    assert_eq!(restaurant.stripe_account_id.as_deref(), Some("acct_test_456"));

    let err = db.set_connected_account(999, "acct_x").await.expect_err("missing restaurant");
    assert!(matches!(err, MerchantApiError::RestaurantNotFound(999)));
}

#[tokio::test]
async fn cart_rows_accumulate_per_dish() {
    let db = setup().await;
    let owner = db
        .create_owner(NewRestaurantOwner { name: "Priya Shah".into(), email: "priya@curryhouse.example".into() })
        .await
        .unwrap();
    let restaurant =
        db.create_restaurant(NewRestaurant { owner_id: owner.id, name: "Curry House".into() }).await.unwrap();
    let dish = db
        .create_dish(NewDish { restaurant_id: restaurant.id, name: "Chana Masala".into(), price: Cents::from(950) })
        .await
        .unwrap();

    let user_id = 7;
    db.upsert_cart_item(user_id, dish.id, 1).await.unwrap();
    let item = db.upsert_cart_item(user_id, dish.id, 2).await.unwrap();
    assert_eq!(item.quantity, 3, "same dish accumulates on one row");
    assert_eq!(db.cart_for_user(user_id).await.unwrap().len(), 1);

    let removed = db.clear_cart(user_id).await.unwrap();
    assert_eq!(removed, 1);
    assert!(db.cart_for_user(user_id).await.unwrap().is_empty());
}
