use crate::{db_types::CartItem, traits::OrderFlowError};

/// Cart storage. Carts feed checkout; the authoritative clear happens inside the order-creation transaction in
/// [`crate::traits::MarketplaceDatabase::insert_order`].
#[allow(async_fn_in_trait)]
pub trait CartManagement {
    /// Adds the dish to the user's cart, accumulating quantity when a row for (user, dish) already exists.
    async fn upsert_cart_item(&self, user_id: i64, dish_id: i64, quantity: i64) -> Result<CartItem, OrderFlowError>;

    async fn cart_for_user(&self, user_id: i64) -> Result<Vec<CartItem>, OrderFlowError>;

    /// Removes every cart row for the user outside any checkout transaction. Returns the number of rows removed.
    async fn clear_cart(&self, user_id: i64) -> Result<u64, OrderFlowError>;
}
