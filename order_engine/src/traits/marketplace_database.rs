use thiserror::Error;

use crate::{
    db_types::{NewOrder, Order, OrderStatus},
    traits::OrderManagement,
};

/// This trait defines the write-side behaviour for backends supporting the order engine.
///
/// This behaviour includes:
/// * Creating an order, its item snapshots and the cart clear in a single atomic transaction.
/// * Applying status transitions and cancellations as single-statement updates.
#[allow(async_fn_in_trait)]
pub trait MarketplaceDatabase: Clone + OrderManagement {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Takes a new order and, in a single atomic transaction:
    /// * inserts one order row with status `pending`,
    /// * inserts one item row per entry in `order.items`, each carrying its denormalised name/price/quantity and
    ///   restaurant id snapshot,
    /// * deletes every cart row belonging to `order.user_id` when the order is not a guest order.
    ///
    /// Either all rows are persisted or none are; any failure rolls the transaction back and surfaces a database
    /// error. Returns the stored order record.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderFlowError>;

    /// Applies `status` to the whole order row in a single UPDATE. Concurrent updates to the same order are not
    /// coordinated beyond the database's own row locking; last writer wins.
    async fn update_order_status(&self, order_id: i64, status: OrderStatus) -> Result<Order, OrderFlowError>;

    /// Whether at least one item of the order belongs to the given restaurant. Used to stop a restaurant in a
    /// multi-restaurant order from forging updates for other restaurants' portions.
    async fn restaurant_has_items_in_order(
        &self,
        order_id: i64,
        restaurant_id: i64,
    ) -> Result<bool, OrderFlowError>;

    /// Marks the order as cancelled in a single UPDATE, appending `reason` to the free-text details field when one
    /// is supplied. Authorization and the cancellable-status check happen in the API layer before this is called.
    async fn cancel_order(&self, order_id: i64, reason: Option<String>) -> Result<Order, OrderFlowError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), OrderFlowError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Invalid order: {0}")]
    ValidationError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
    #[error("{0}")]
    Forbidden(String),
    #[error(
        "Order {order_id} cannot be cancelled from status '{status}'. Only pending, confirmed, or preparing orders \
         can be cancelled"
    )]
    CannotCancel { order_id: i64, status: OrderStatus },
    #[error("There is an internal database engine error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for OrderFlowError {
    fn from(e: sqlx::Error) -> Self {
        OrderFlowError::DatabaseError(e.to_string())
    }
}
