use sqlx::SqliteConnection;

use crate::{db_types::CartItem, traits::OrderFlowError};

/// Adds a dish to the user's cart. A second add of the same dish accumulates quantity on the existing row.
pub async fn upsert_item(
    user_id: i64,
    dish_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<CartItem, OrderFlowError> {
    let item = sqlx::query_as(
        r#"
            INSERT INTO carts (user_id, dish_id, quantity) VALUES ($1, $2, $3)
            ON CONFLICT (user_id, dish_id) DO UPDATE SET quantity = quantity + excluded.quantity
            RETURNING *;
        "#,
    )
    .bind(user_id)
    .bind(dish_id)
    .bind(quantity)
    .fetch_one(conn)
    .await?;
    Ok(item)
}

pub async fn items_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<CartItem>, OrderFlowError> {
    let items = sqlx::query_as("SELECT * FROM carts WHERE user_id = $1 ORDER BY id")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// Deletes every cart row for the user, returning the number of rows removed. Checkout calls this with the
/// order-creation transaction's connection so the clear commits or rolls back with the order.
pub async fn clear_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<u64, OrderFlowError> {
    let result = sqlx::query("DELETE FROM carts WHERE user_id = $1").bind(user_id).execute(conn).await?;
    Ok(result.rows_affected())
}
