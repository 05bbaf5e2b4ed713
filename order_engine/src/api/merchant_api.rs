use std::fmt::Debug;

use crate::{
    db_types::{Dish, NewDish, NewRestaurant, NewRestaurantOwner, Restaurant, RestaurantOwner},
    traits::{MerchantApiError, MerchantManagement},
};

/// Typed façade over [`MerchantManagement`]. Fetches that must succeed are expressed here so route handlers get a
/// not-found error instead of an `Option` to unwrap.
pub struct MerchantApi<B> {
    db: B,
}

impl<B> Debug for MerchantApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MerchantApi")
    }
}

impl<B> MerchantApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> MerchantApi<B>
where B: MerchantManagement
{
    pub async fn create_owner(&self, owner: NewRestaurantOwner) -> Result<RestaurantOwner, MerchantApiError> {
        self.db.create_owner(owner).await
    }

    pub async fn owner(&self, owner_id: i64) -> Result<RestaurantOwner, MerchantApiError> {
        self.db.fetch_owner(owner_id).await?.ok_or(MerchantApiError::OwnerNotFound(owner_id))
    }

    pub async fn create_restaurant(&self, restaurant: NewRestaurant) -> Result<Restaurant, MerchantApiError> {
        self.db.create_restaurant(restaurant).await
    }

    pub async fn restaurant(&self, restaurant_id: i64) -> Result<Restaurant, MerchantApiError> {
        self.db.fetch_restaurant(restaurant_id).await?.ok_or(MerchantApiError::RestaurantNotFound(restaurant_id))
    }

    /// Whether the restaurant belongs to the given owner. Used by route handlers before owner-scoped operations.
    pub async fn restaurant_belongs_to(&self, restaurant_id: i64, owner_id: i64) -> Result<bool, MerchantApiError> {
        Ok(self.restaurant(restaurant_id).await?.owner_id == owner_id)
    }

    pub async fn create_dish(&self, dish: NewDish) -> Result<Dish, MerchantApiError> {
        self.db.create_dish(dish).await
    }

    pub async fn dish(&self, dish_id: i64) -> Result<Dish, MerchantApiError> {
        self.db.fetch_dish(dish_id).await?.ok_or(MerchantApiError::DishNotFound(dish_id))
    }
}
