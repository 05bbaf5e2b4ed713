use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::db::{carts, db_url, merchants, new_pool, order_items, orders};
use crate::{
    api::order_objects::{
        OrderQueryFilter,
        OrderWithItems,
        Pagination,
        RestaurantOrder,
        RestaurantOrderStats,
        UserOrderStats,
    },
    db_types::{
        CartItem,
        Dish,
        NewDish,
        NewOrder,
        NewRestaurant,
        NewRestaurantOwner,
        Order,
        OrderStatus,
        Restaurant,
        RestaurantOwner,
    },
    traits::{
        CartManagement,
        MarketplaceDatabase,
        MerchantApiError,
        MerchantManagement,
        OrderFlowError,
        OrderManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Connects to the database at `PWY_DATABASE_URL` (or the default path).
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        Self::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_with_items(&self, order_id: i64) -> Result<Option<OrderWithItems>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let Some(order) = orders::fetch_order(order_id, &mut conn).await? else {
            return Ok(None);
        };
        let items = order_items::details_for_order(order_id, &mut conn).await?;
        Ok(Some(OrderWithItems { order, items }))
    }

    async fn count_user_orders(&self, user_id: i64, filter: &OrderQueryFilter) -> Result<i64, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        orders::count_user_orders(user_id, filter, &mut conn).await
    }

    async fn fetch_user_orders(
        &self,
        user_id: i64,
        filter: &OrderQueryFilter,
        pagination: &Pagination,
    ) -> Result<Vec<OrderWithItems>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let page = orders::user_orders_page(user_id, filter, pagination, &mut conn).await?;
        let mut result = Vec::with_capacity(page.len());
        for order in page {
            let items = order_items::details_for_order(order.id, &mut conn).await?;
            result.push(OrderWithItems { order, items });
        }
        Ok(result)
    }

    async fn count_restaurant_orders(
        &self,
        restaurant_id: i64,
        filter: &OrderQueryFilter,
    ) -> Result<i64, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        orders::count_restaurant_orders(restaurant_id, filter, &mut conn).await
    }

    async fn fetch_restaurant_orders(
        &self,
        restaurant_id: i64,
        filter: &OrderQueryFilter,
        pagination: &Pagination,
    ) -> Result<Vec<RestaurantOrder>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let page = orders::restaurant_orders_page(restaurant_id, filter, pagination, &mut conn).await?;
        let mut result = Vec::with_capacity(page.len());
        for order in page {
            let items = order_items::items_for_order_and_restaurant(order.id, restaurant_id, &mut conn).await?;
            result.push(RestaurantOrder::new(order, items));
        }
        Ok(result)
    }

    async fn fetch_user_stats(&self, user_id: i64) -> Result<UserOrderStats, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        orders::user_stats(user_id, &mut conn).await
    }

    async fn fetch_restaurant_stats(&self, restaurant_id: i64) -> Result<RestaurantOrderStats, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        orders::restaurant_stats(restaurant_id, &mut conn).await
    }
}

impl MarketplaceDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Takes a new order and, in a single atomic transaction, inserts the order row, one item row per entry, and
    /// deletes the purchasing user's cart. The transaction context is scoped to this call and released on every
    /// exit path; any failure rolls back all of it.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let stored = orders::insert_order(&order, &mut tx).await?;
        for item in &order.items {
            order_items::insert_order_item(stored.id, item, &mut tx).await?;
        }
        if let Some(user_id) = order.user_id {
            let cleared = carts::clear_for_user(user_id, &mut tx).await?;
            trace!("🗃️ Cleared {cleared} cart rows for user {user_id} at checkout");
        }
        tx.commit().await?;
        debug!("🗃️ Order #{} saved with {} items", stored.id, order.items.len());
        Ok(stored)
    }

    async fn update_order_status(&self, order_id: i64, status: OrderStatus) -> Result<Order, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        orders::update_order_status(order_id, status, &mut conn).await
    }

    async fn restaurant_has_items_in_order(
        &self,
        order_id: i64,
        restaurant_id: i64,
    ) -> Result<bool, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        order_items::restaurant_has_items_in_order(order_id, restaurant_id, &mut conn).await
    }

    async fn cancel_order(&self, order_id: i64, reason: Option<String>) -> Result<Order, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        orders::cancel_order(order_id, reason.as_deref(), &mut conn).await
    }

    async fn close(&mut self) -> Result<(), OrderFlowError> {
        self.pool.close().await;
        Ok(())
    }
}

impl MerchantManagement for SqliteDatabase {
    async fn create_owner(&self, owner: NewRestaurantOwner) -> Result<RestaurantOwner, MerchantApiError> {
        let mut conn = self.pool.acquire().await?;
        merchants::insert_owner(&owner, &mut conn).await
    }

    async fn fetch_owner(&self, owner_id: i64) -> Result<Option<RestaurantOwner>, MerchantApiError> {
        let mut conn = self.pool.acquire().await?;
        merchants::fetch_owner(owner_id, &mut conn).await
    }

    async fn set_stripe_customer(
        &self,
        owner_id: i64,
        customer_id: &str,
    ) -> Result<RestaurantOwner, MerchantApiError> {
        let mut conn = self.pool.acquire().await?;
        merchants::set_stripe_customer(owner_id, customer_id, &mut conn).await
    }

    async fn set_subscribed(&self, owner_id: i64, subscribed: bool) -> Result<RestaurantOwner, MerchantApiError> {
        let mut conn = self.pool.acquire().await?;
        merchants::set_subscribed(owner_id, subscribed, &mut conn).await
    }

    async fn create_restaurant(&self, restaurant: NewRestaurant) -> Result<Restaurant, MerchantApiError> {
        let mut conn = self.pool.acquire().await?;
        merchants::insert_restaurant(&restaurant, &mut conn).await
    }

    async fn fetch_restaurant(&self, restaurant_id: i64) -> Result<Option<Restaurant>, MerchantApiError> {
        let mut conn = self.pool.acquire().await?;
        merchants::fetch_restaurant(restaurant_id, &mut conn).await
    }

    async fn set_connected_account(
        &self,
        restaurant_id: i64,
        account_id: &str,
    ) -> Result<Restaurant, MerchantApiError> {
        let mut conn = self.pool.acquire().await?;
        merchants::set_connected_account(restaurant_id, account_id, &mut conn).await
    }

    async fn create_dish(&self, dish: NewDish) -> Result<Dish, MerchantApiError> {
        let mut conn = self.pool.acquire().await?;
        merchants::insert_dish(&dish, &mut conn).await
    }

    async fn fetch_dish(&self, dish_id: i64) -> Result<Option<Dish>, MerchantApiError> {
        let mut conn = self.pool.acquire().await?;
        merchants::fetch_dish(dish_id, &mut conn).await
    }
}

impl CartManagement for SqliteDatabase {
    async fn upsert_cart_item(&self, user_id: i64, dish_id: i64, quantity: i64) -> Result<CartItem, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        carts::upsert_item(user_id, dish_id, quantity, &mut conn).await
    }

    async fn cart_for_user(&self, user_id: i64) -> Result<Vec<CartItem>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        carts::items_for_user(user_id, &mut conn).await
    }

    async fn clear_cart(&self, user_id: i64) -> Result<u64, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        carts::clear_for_user(user_id, &mut conn).await
    }
}
