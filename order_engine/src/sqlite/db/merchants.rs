//! Restaurant, owner and dish records. The payment flows hang off two nullable columns maintained here:
//! `restaurants.stripe_account_id` (connected merchant account) and `restaurant_owners.stripe_customer_id`
//! (subscription billing customer), plus the locally cached `is_subscribed` flag.

use sqlx::SqliteConnection;

use crate::{
    db_types::{Dish, NewDish, NewRestaurant, NewRestaurantOwner, Restaurant, RestaurantOwner},
    traits::MerchantApiError,
};

pub async fn insert_owner(
    owner: &NewRestaurantOwner,
    conn: &mut SqliteConnection,
) -> Result<RestaurantOwner, MerchantApiError> {
    let owner = sqlx::query_as("INSERT INTO restaurant_owners (name, email) VALUES ($1, $2) RETURNING *")
        .bind(owner.name.as_str())
        .bind(owner.email.as_str())
        .fetch_one(conn)
        .await?;
    Ok(owner)
}

pub async fn fetch_owner(
    owner_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<RestaurantOwner>, MerchantApiError> {
    let owner = sqlx::query_as("SELECT * FROM restaurant_owners WHERE id = $1")
        .bind(owner_id)
        .fetch_optional(conn)
        .await?;
    Ok(owner)
}

pub async fn set_stripe_customer(
    owner_id: i64,
    customer_id: &str,
    conn: &mut SqliteConnection,
) -> Result<RestaurantOwner, MerchantApiError> {
    let owner: Option<RestaurantOwner> = sqlx::query_as(
        "UPDATE restaurant_owners SET stripe_customer_id = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 \
         RETURNING *",
    )
    .bind(customer_id)
    .bind(owner_id)
    .fetch_optional(conn)
    .await?;
    owner.ok_or(MerchantApiError::OwnerNotFound(owner_id))
}

pub async fn set_subscribed(
    owner_id: i64,
    subscribed: bool,
    conn: &mut SqliteConnection,
) -> Result<RestaurantOwner, MerchantApiError> {
    let owner: Option<RestaurantOwner> = sqlx::query_as(
        "UPDATE restaurant_owners SET is_subscribed = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(subscribed)
    .bind(owner_id)
    .fetch_optional(conn)
    .await?;
    owner.ok_or(MerchantApiError::OwnerNotFound(owner_id))
}

pub async fn insert_restaurant(
    restaurant: &NewRestaurant,
    conn: &mut SqliteConnection,
) -> Result<Restaurant, MerchantApiError> {
    let restaurant = sqlx::query_as("INSERT INTO restaurants (owner_id, name) VALUES ($1, $2) RETURNING *")
        .bind(restaurant.owner_id)
        .bind(restaurant.name.as_str())
        .fetch_one(conn)
        .await?;
    Ok(restaurant)
}

pub async fn fetch_restaurant(
    restaurant_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Restaurant>, MerchantApiError> {
    let restaurant = sqlx::query_as("SELECT * FROM restaurants WHERE id = $1")
        .bind(restaurant_id)
        .fetch_optional(conn)
        .await?;
    Ok(restaurant)
}

pub async fn set_connected_account(
    restaurant_id: i64,
    account_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Restaurant, MerchantApiError> {
    let restaurant: Option<Restaurant> = sqlx::query_as(
        "UPDATE restaurants SET stripe_account_id = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(account_id)
    .bind(restaurant_id)
    .fetch_optional(conn)
    .await?;
    restaurant.ok_or(MerchantApiError::RestaurantNotFound(restaurant_id))
}

pub async fn insert_dish(dish: &NewDish, conn: &mut SqliteConnection) -> Result<Dish, MerchantApiError> {
    let dish = sqlx::query_as("INSERT INTO dishes (restaurant_id, name, price) VALUES ($1, $2, $3) RETURNING *")
        .bind(dish.restaurant_id)
        .bind(dish.name.as_str())
        .bind(dish.price)
        .fetch_one(conn)
        .await?;
    Ok(dish)
}

pub async fn fetch_dish(dish_id: i64, conn: &mut SqliteConnection) -> Result<Option<Dish>, MerchantApiError> {
    let dish = sqlx::query_as("SELECT * FROM dishes WHERE id = $1").bind(dish_id).fetch_optional(conn).await?;
    Ok(dish)
}
