use crate::{
    api::order_objects::{
        OrderQueryFilter,
        OrderWithItems,
        Pagination,
        RestaurantOrder,
        RestaurantOrderStats,
        UserOrderStats,
    },
    db_types::Order,
    traits::OrderFlowError,
};

/// Read-side queries over orders. None of these run inside a transaction; listings and statistics may observe a
/// slightly stale snapshot relative to concurrent order mutations.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Fetches the bare order row, without items.
    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError>;

    /// Fetches the order together with all of its items, left-joined with restaurant and dish metadata for display.
    async fn fetch_order_with_items(&self, order_id: i64) -> Result<Option<OrderWithItems>, OrderFlowError>;

    /// Counts the orders belonging to `user_id` that match the filter. Listing calls issue this count query followed
    /// by a page query; two round trips per call, no cursor caching.
    async fn count_user_orders(&self, user_id: i64, filter: &OrderQueryFilter) -> Result<i64, OrderFlowError>;

    /// Fetches one page of the user's orders, most recent first.
    async fn fetch_user_orders(
        &self,
        user_id: i64,
        filter: &OrderQueryFilter,
        pagination: &Pagination,
    ) -> Result<Vec<OrderWithItems>, OrderFlowError>;

    /// Counts the orders containing at least one item from `restaurant_id` that match the filter.
    async fn count_restaurant_orders(
        &self,
        restaurant_id: i64,
        filter: &OrderQueryFilter,
    ) -> Result<i64, OrderFlowError>;

    /// Fetches one page of the restaurant's orders, most recent first.
    ///
    /// Each returned order carries only the subset of items belonging to `restaurant_id`, plus the subtotal over
    /// that subset, even when the order spans multiple restaurants.
    async fn fetch_restaurant_orders(
        &self,
        restaurant_id: i64,
        filter: &OrderQueryFilter,
        pagination: &Pagination,
    ) -> Result<Vec<RestaurantOrder>, OrderFlowError>;

    /// Dashboard aggregates for a customer. Read-only, no side effects.
    async fn fetch_user_stats(&self, user_id: i64) -> Result<UserOrderStats, OrderFlowError>;

    /// Dashboard aggregates for a restaurant, computed over its own item subset.
    async fn fetch_restaurant_stats(&self, restaurant_id: i64) -> Result<RestaurantOrderStats, OrderFlowError>;
}
