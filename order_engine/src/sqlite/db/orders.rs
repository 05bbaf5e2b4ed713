use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    api::order_objects::{OrderQueryFilter, Pagination, RestaurantOrderStats, UserOrderStats},
    db_types::{NewOrder, Order, OrderStatus},
    traits::OrderFlowError,
};

/// Inserts a new order row using the given connection. This is not atomic on its own. Callers embed this inside a
/// transaction together with the item inserts and the cart clear, passing `&mut *tx` as the connection argument.
pub async fn insert_order(order: &NewOrder, conn: &mut SqliteConnection) -> Result<Order, OrderFlowError> {
    let (guest_name, guest_email) = match &order.guest {
        Some(g) => (Some(g.name.as_str()), Some(g.email.as_str())),
        None => (None, None),
    };
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                user_id,
                total_price,
                status,
                details,
                delivery_address,
                delivery_phone,
                delivery_type,
                platform_fee,
                is_guest_order,
                guest_name,
                guest_email
            ) VALUES ($1, $2, 'pending', $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *;
        "#,
    )
    .bind(order.user_id)
    .bind(order.total_price)
    .bind(order.details.as_deref())
    .bind(order.delivery_address.as_str())
    .bind(order.delivery_phone.as_str())
    .bind(order.delivery_type)
    .bind(order.platform_fee)
    .bind(order.guest.is_some())
    .bind(guest_name)
    .bind(guest_email)
    .fetch_one(conn)
    .await?;
    Ok(order)
}

pub async fn fetch_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

/// Appends the `OrderQueryFilter` criteria to a WHERE clause that already has at least one condition.
///
/// The status values come from the closed [`OrderStatus`] enum, so interpolating their display form is safe.
fn push_filter(builder: &mut QueryBuilder<'_, sqlx::Sqlite>, filter: &OrderQueryFilter, column_prefix: &str) {
    if let Some(statuses) = filter.status.as_ref().filter(|s| !s.is_empty()) {
        let clause = statuses.iter().map(|s| format!("'{s}'")).collect::<Vec<_>>().join(",");
        builder.push(format!(" AND {column_prefix}status IN ({clause})"));
    }
    if let Some(since) = filter.since {
        builder.push(format!(" AND {column_prefix}created_at >= "));
        builder.push_bind(since);
    }
    if let Some(until) = filter.until {
        builder.push(format!(" AND {column_prefix}created_at <= "));
        builder.push_bind(until);
    }
}

pub async fn count_user_orders(
    user_id: i64,
    filter: &OrderQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<i64, OrderFlowError> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM orders WHERE user_id = ");
    builder.push_bind(user_id);
    push_filter(&mut builder, filter, "");
    let count = builder.build_query_scalar::<i64>().fetch_one(conn).await?;
    Ok(count)
}

/// Fetches one page of a user's orders, most recent first.
pub async fn user_orders_page(
    user_id: i64,
    filter: &OrderQueryFilter,
    pagination: &Pagination,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, OrderFlowError> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders WHERE user_id = ");
    builder.push_bind(user_id);
    push_filter(&mut builder, filter, "");
    builder.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    builder.push_bind(pagination.limit());
    builder.push(" OFFSET ");
    builder.push_bind(pagination.offset());
    trace!("📝️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    Ok(orders)
}

pub async fn count_restaurant_orders(
    restaurant_id: i64,
    filter: &OrderQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<i64, OrderFlowError> {
    let mut builder = QueryBuilder::new(
        "SELECT COUNT(DISTINCT orders.id) FROM orders JOIN order_items ON order_items.order_id = orders.id WHERE \
         order_items.restaurant_id = ",
    );
    builder.push_bind(restaurant_id);
    push_filter(&mut builder, filter, "orders.");
    let count = builder.build_query_scalar::<i64>().fetch_one(conn).await?;
    Ok(count)
}

/// Fetches one page of the orders a restaurant participates in, most recent first. The caller attaches the
/// restaurant's item subset separately.
pub async fn restaurant_orders_page(
    restaurant_id: i64,
    filter: &OrderQueryFilter,
    pagination: &Pagination,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, OrderFlowError> {
    let mut builder = QueryBuilder::new(
        "SELECT DISTINCT orders.* FROM orders JOIN order_items ON order_items.order_id = orders.id WHERE \
         order_items.restaurant_id = ",
    );
    builder.push_bind(restaurant_id);
    push_filter(&mut builder, filter, "orders.");
    builder.push(" ORDER BY orders.created_at DESC, orders.id DESC LIMIT ");
    builder.push_bind(pagination.limit());
    builder.push(" OFFSET ");
    builder.push_bind(pagination.offset());
    trace!("📝️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    Ok(orders)
}

pub(crate) async fn update_order_status(
    order_id: i64,
    status: OrderStatus,
    conn: &mut SqliteConnection,
) -> Result<Order, OrderFlowError> {
    let result: Option<Order> =
        sqlx::query_as("UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
            .bind(status)
            .bind(order_id)
            .fetch_optional(conn)
            .await?;
    result.ok_or(OrderFlowError::OrderNotFound(order_id))
}

/// Marks the order as cancelled in a single UPDATE. The reason, when given, is appended to the details field on a
/// new line (or becomes the details when there were none).
pub(crate) async fn cancel_order(
    order_id: i64,
    reason: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Order, OrderFlowError> {
    let result: Option<Order> = match reason {
        Some(reason) => {
            sqlx::query_as(
                r#"
                UPDATE orders SET
                    status = 'cancelled',
                    updated_at = CURRENT_TIMESTAMP,
                    details = CASE
                        WHEN details IS NULL OR details = '' THEN $1
                        ELSE details || char(10) || $1
                    END
                WHERE id = $2 RETURNING *;
            "#,
            )
            .bind(format!("Cancellation reason: {reason}"))
            .bind(order_id)
            .fetch_optional(conn)
            .await?
        },
        None => {
            sqlx::query_as(
                "UPDATE orders SET status = 'cancelled', updated_at = CURRENT_TIMESTAMP WHERE id = $1 RETURNING *",
            )
            .bind(order_id)
            .fetch_optional(conn)
            .await?
        },
    };
    result.ok_or(OrderFlowError::OrderNotFound(order_id))
}

pub async fn user_stats(user_id: i64, conn: &mut SqliteConnection) -> Result<UserOrderStats, OrderFlowError> {
    let stats = sqlx::query_as(
        r#"
        SELECT
            COUNT(*) AS total_orders,
            CAST(COALESCE(SUM(total_price), 0) AS INTEGER) AS total_spent,
            CAST(COALESCE(AVG(total_price), 0) AS INTEGER) AS average_order_value,
            CAST(COALESCE(SUM(status = 'delivered'), 0) AS INTEGER) AS delivered_orders,
            CAST(COALESCE(SUM(status = 'cancelled'), 0) AS INTEGER) AS cancelled_orders
        FROM orders WHERE user_id = $1
    "#,
    )
    .bind(user_id)
    .fetch_one(conn)
    .await?;
    Ok(stats)
}

pub async fn restaurant_stats(
    restaurant_id: i64,
    conn: &mut SqliteConnection,
) -> Result<RestaurantOrderStats, OrderFlowError> {
    let stats = sqlx::query_as(
        r#"
        SELECT
            COUNT(DISTINCT order_id) AS total_orders,
            CAST(COALESCE(SUM(quantity), 0) AS INTEGER) AS items_sold,
            CAST(COALESCE(SUM(price * quantity), 0) AS INTEGER) AS gross_revenue,
            CAST(COALESCE(SUM(price * quantity) / COUNT(DISTINCT order_id), 0) AS INTEGER) AS average_order_value
        FROM order_items WHERE restaurant_id = $1
    "#,
    )
    .bind(restaurant_id)
    .fetch_one(conn)
    .await?;
    Ok(stats)
}
