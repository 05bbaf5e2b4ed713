use std::fmt::Debug;

use log::*;

use crate::{
    api::order_objects::{
        OrderPage,
        OrderQueryFilter,
        OrderRequester,
        OrderWithItems,
        Pagination,
        RestaurantOrderPage,
        RestaurantOrderStats,
        UserOrderStats,
    },
    db_types::{NewOrder, Order, OrderStatus},
    traits::{MarketplaceDatabase, OrderFlowError},
};

/// `OrderFlowApi` is the primary API for the order lifecycle: checkout, querying, status transitions and
/// cancellation. The backend is injected at construction so tests can substitute a mock.
pub struct OrderFlowApi<B> {
    db: B,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> OrderFlowApi<B>
where B: MarketplaceDatabase
{
    /// Submit a new order.
    ///
    /// Validation happens here; persistence is a single atomic transaction in the backend. Exactly one order row and
    /// one item row per entry are persisted (clearing the purchasing user's cart along the way), or nothing is.
    ///
    /// The declared total must cover the items subtotal. Callers may add their own fee semantics (delivery fees,
    /// tips) on top of the subtotal, so the check is a lower bound rather than strict equality.
    pub async fn create_order(&self, order: NewOrder) -> Result<Order, OrderFlowError> {
        if order.items.is_empty() {
            return Err(OrderFlowError::ValidationError("an order must contain at least one item".into()));
        }
        if let Some(item) = order.items.iter().find(|i| i.quantity <= 0 || i.price.value() < 0) {
            return Err(OrderFlowError::ValidationError(format!(
                "item '{}' has a non-positive quantity or a negative price",
                item.name
            )));
        }
        let subtotal = order.items_subtotal();
        if order.total_price < subtotal {
            return Err(OrderFlowError::ValidationError(format!(
                "order total {} is less than the items subtotal {subtotal}",
                order.total_price
            )));
        }
        if order.user_id.is_none() {
            match &order.guest {
                Some(g) if !g.name.trim().is_empty() && !g.email.trim().is_empty() => {},
                _ => {
                    return Err(OrderFlowError::ValidationError(
                        "guest checkout requires a guest name and email".into(),
                    ))
                },
            }
        }
        let order = self.db.insert_order(order).await?;
        debug!("🛒️ Order #{} created with {} for user {:?}", order.id, order.total_price, order.user_id);
        Ok(order)
    }

    /// Fetch a single order with its items.
    ///
    /// Restaurant owners may read any order. Everyone else may only read orders whose `user_id` matches their own;
    /// guest orders have no owning user and are owner-readable only.
    pub async fn order_by_id(
        &self,
        order_id: i64,
        requester: &OrderRequester,
    ) -> Result<OrderWithItems, OrderFlowError> {
        let order = self
            .db
            .fetch_order_with_items(order_id)
            .await?
            .ok_or(OrderFlowError::OrderNotFound(order_id))?;
        if !requester.is_owner && order.order.user_id != requester.user_id {
            debug!("🛒️ Access to order #{order_id} denied for requester {:?}", requester.user_id);
            return Err(OrderFlowError::Forbidden(format!("you do not have access to order {order_id}")));
        }
        Ok(order)
    }

    /// Paginated listing of a user's orders: one count query, one page query.
    pub async fn user_orders(
        &self,
        user_id: i64,
        pagination: Pagination,
        filter: OrderQueryFilter,
    ) -> Result<OrderPage, OrderFlowError> {
        let total = self.db.count_user_orders(user_id, &filter).await?;
        let orders = self.db.fetch_user_orders(user_id, &filter, &pagination).await?;
        trace!("🛒️ {} of {total} orders fetched for user {user_id} ({filter})", orders.len());
        Ok(OrderPage { total, offset: pagination.offset(), orders })
    }

    /// Paginated listing of the orders a restaurant participates in, scoped to its own item subset.
    pub async fn restaurant_orders(
        &self,
        restaurant_id: i64,
        pagination: Pagination,
        filter: OrderQueryFilter,
    ) -> Result<RestaurantOrderPage, OrderFlowError> {
        let total = self.db.count_restaurant_orders(restaurant_id, &filter).await?;
        let orders = self.db.fetch_restaurant_orders(restaurant_id, &filter, &pagination).await?;
        trace!("🛒️ {} of {total} orders fetched for restaurant {restaurant_id} ({filter})", orders.len());
        Ok(RestaurantOrderPage { total, offset: pagination.offset(), orders })
    }

    /// Apply a new status to an order.
    ///
    /// Status legality is proven by the [`OrderStatus`] type; anything that parsed is in the allowed set, and no
    /// transition graph is enforced beyond that. When `restaurant_id` is supplied, the order must contain at least
    /// one item from that restaurant; this lets a restaurant in a multi-restaurant order manage its portion without
    /// forging updates for orders it has no part in. The status still applies to the whole order row.
    pub async fn update_order_status(
        &self,
        order_id: i64,
        status: OrderStatus,
        restaurant_id: Option<i64>,
    ) -> Result<Order, OrderFlowError> {
        if let Some(restaurant_id) = restaurant_id {
            if !self.db.restaurant_has_items_in_order(order_id, restaurant_id).await? {
                debug!("🛒️ Restaurant {restaurant_id} tried to update order #{order_id} without any items in it");
                return Err(OrderFlowError::Forbidden(format!(
                    "restaurant {restaurant_id} has no items in order {order_id}"
                )));
            }
        }
        let order = self.db.update_order_status(order_id, status).await?;
        debug!("🛒️ Order #{order_id} status set to {status}");
        Ok(order)
    }

    /// Cancel an order on behalf of its owning user.
    ///
    /// Only the order's owner may cancel, and only while the order has not yet left the kitchen: orders already
    /// `delivered`, `cancelled` or `out_for_delivery` fail with [`OrderFlowError::CannotCancel`]. On success the
    /// status becomes `cancelled` and the reason is appended to the order details.
    pub async fn cancel_order(
        &self,
        order_id: i64,
        user_id: i64,
        reason: Option<&str>,
    ) -> Result<Order, OrderFlowError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        if order.user_id != Some(user_id) {
            debug!("🛒️ User {user_id} tried to cancel order #{order_id}, which they do not own");
            return Err(OrderFlowError::Forbidden(format!("only the order's owner can cancel order {order_id}")));
        }
        if !order.status.is_cancellable() {
            return Err(OrderFlowError::CannotCancel { order_id, status: order.status });
        }
        let order = self.db.cancel_order(order_id, reason.map(str::to_string)).await?;
        debug!("🛒️ Order #{order_id} cancelled by user {user_id}");
        Ok(order)
    }

    /// Read-only dashboard aggregates for a customer.
    pub async fn user_stats(&self, user_id: i64) -> Result<UserOrderStats, OrderFlowError> {
        self.db.fetch_user_stats(user_id).await
    }

    /// Read-only dashboard aggregates for a restaurant.
    pub async fn restaurant_stats(&self, restaurant_id: i64) -> Result<RestaurantOrderStats, OrderFlowError> {
        self.db.fetch_restaurant_stats(restaurant_id).await
    }
}
