use thiserror::Error;

use crate::db_types::{Dish, NewDish, NewRestaurant, NewRestaurantOwner, Restaurant, RestaurantOwner};

/// Storage for the marketplace records that the payment flows hang off: restaurant owners (billing customer id and
/// subscription flag) and restaurants (connected merchant account id).
#[allow(async_fn_in_trait)]
pub trait MerchantManagement {
    async fn create_owner(&self, owner: NewRestaurantOwner) -> Result<RestaurantOwner, MerchantApiError>;

    async fn fetch_owner(&self, owner_id: i64) -> Result<Option<RestaurantOwner>, MerchantApiError>;

    /// Persists the billing customer identifier for the owner. At most one per owner; repeated calls overwrite.
    async fn set_stripe_customer(&self, owner_id: i64, customer_id: &str) -> Result<RestaurantOwner, MerchantApiError>;

    /// Updates the locally cached subscription flag.
    async fn set_subscribed(&self, owner_id: i64, subscribed: bool) -> Result<RestaurantOwner, MerchantApiError>;

    async fn create_restaurant(&self, restaurant: NewRestaurant) -> Result<Restaurant, MerchantApiError>;

    async fn fetch_restaurant(&self, restaurant_id: i64) -> Result<Option<Restaurant>, MerchantApiError>;

    /// Persists the connected merchant account identifier for the restaurant once onboarding has produced one.
    async fn set_connected_account(
        &self,
        restaurant_id: i64,
        account_id: &str,
    ) -> Result<Restaurant, MerchantApiError>;

    async fn create_dish(&self, dish: NewDish) -> Result<Dish, MerchantApiError>;

    async fn fetch_dish(&self, dish_id: i64) -> Result<Option<Dish>, MerchantApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum MerchantApiError {
    #[error("The requested restaurant {0} does not exist")]
    RestaurantNotFound(i64),
    #[error("The requested restaurant owner {0} does not exist")]
    OwnerNotFound(i64),
    #[error("The requested dish {0} does not exist")]
    DishNotFound(i64),
    #[error("There is an internal database engine error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for MerchantApiError {
    fn from(e: sqlx::Error) -> Self {
        MerchantApiError::DatabaseError(e.to_string())
    }
}
