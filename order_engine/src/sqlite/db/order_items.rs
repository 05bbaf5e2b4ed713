use sqlx::SqliteConnection;

use crate::{
    api::order_objects::OrderItemDetail,
    db_types::{NewOrderItem, OrderItem},
    traits::OrderFlowError,
};

/// Inserts the denormalised item snapshot for an order. Called once per item inside the order-creation transaction.
pub async fn insert_order_item(
    order_id: i64,
    item: &NewOrderItem,
    conn: &mut SqliteConnection,
) -> Result<OrderItem, OrderFlowError> {
    let item = sqlx::query_as(
        r#"
            INSERT INTO order_items (order_id, restaurant_id, dish_id, name, price, quantity)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(item.restaurant_id)
    .bind(item.dish_id)
    .bind(item.name.as_str())
    .bind(item.price)
    .bind(item.quantity)
    .fetch_one(conn)
    .await?;
    Ok(item)
}

/// All items of an order, left-joined with restaurant and dish metadata for display. The joins never gate the rows;
/// the snapshot stands on its own when the restaurant or dish has since been removed.
pub async fn details_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderItemDetail>, OrderFlowError> {
    let items = sqlx::query_as(
        r#"
        SELECT
            order_items.*,
            restaurants.name AS restaurant_name,
            dishes.available AS dish_available
        FROM order_items
        LEFT JOIN restaurants ON restaurants.id = order_items.restaurant_id
        LEFT JOIN dishes ON dishes.id = order_items.dish_id
        WHERE order_items.order_id = $1
        ORDER BY order_items.id
    "#,
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(items)
}

/// The subset of an order's items that belong to the given restaurant.
pub async fn items_for_order_and_restaurant(
    order_id: i64,
    restaurant_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderItem>, OrderFlowError> {
    let items =
        sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 AND restaurant_id = $2 ORDER BY id")
            .bind(order_id)
            .bind(restaurant_id)
            .fetch_all(conn)
            .await?;
    Ok(items)
}

pub async fn restaurant_has_items_in_order(
    order_id: i64,
    restaurant_id: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, OrderFlowError> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM order_items WHERE order_id = $1 AND restaurant_id = $2")
            .bind(order_id)
            .bind(restaurant_id)
            .fetch_one(conn)
            .await?;
    Ok(count > 0)
}
