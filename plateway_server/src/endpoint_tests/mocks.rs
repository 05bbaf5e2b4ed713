use mockall::mock;
use order_engine::{
    db_types::{Dish, NewDish, NewOrder, NewRestaurant, NewRestaurantOwner, Order, OrderStatus, Restaurant, RestaurantOwner},
    order_objects::{
        OrderQueryFilter,
        OrderWithItems,
        Pagination,
        RestaurantOrder,
        RestaurantOrderStats,
        UserOrderStats,
    },
    traits::{MarketplaceDatabase, MerchantApiError, MerchantManagement, OrderFlowError, OrderManagement},
};
use stripe_tools::{
    AccountLink,
    CheckoutSession,
    ConnectedAccount,
    Customer,
    PaymentIntent,
    PaymentIntentRequest,
    StripeApiError,
    StripeGateway,
    Subscription,
};

mock! {
    pub OrderDb {}

    impl Clone for OrderDb {
        fn clone(&self) -> Self;
    }

    impl OrderManagement for OrderDb {
        async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError>;
        async fn fetch_order_with_items(&self, order_id: i64) -> Result<Option<OrderWithItems>, OrderFlowError>;
        async fn count_user_orders(&self, user_id: i64, filter: &OrderQueryFilter) -> Result<i64, OrderFlowError>;
        async fn fetch_user_orders(&self, user_id: i64, filter: &OrderQueryFilter, pagination: &Pagination) -> Result<Vec<OrderWithItems>, OrderFlowError>;
        async fn count_restaurant_orders(&self, restaurant_id: i64, filter: &OrderQueryFilter) -> Result<i64, OrderFlowError>;
        async fn fetch_restaurant_orders(&self, restaurant_id: i64, filter: &OrderQueryFilter, pagination: &Pagination) -> Result<Vec<RestaurantOrder>, OrderFlowError>;
        async fn fetch_user_stats(&self, user_id: i64) -> Result<UserOrderStats, OrderFlowError>;
        async fn fetch_restaurant_stats(&self, restaurant_id: i64) -> Result<RestaurantOrderStats, OrderFlowError>;
    }

    impl MarketplaceDatabase for OrderDb {
        fn url(&self) -> &str;
        async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderFlowError>;
        async fn update_order_status(&self, order_id: i64, status: OrderStatus) -> Result<Order, OrderFlowError>;
        async fn restaurant_has_items_in_order(&self, order_id: i64, restaurant_id: i64) -> Result<bool, OrderFlowError>;
        async fn cancel_order(&self, order_id: i64, reason: Option<String>) -> Result<Order, OrderFlowError>;
    }
}

mock! {
    pub MerchantDb {}

    impl MerchantManagement for MerchantDb {
        async fn create_owner(&self, owner: NewRestaurantOwner) -> Result<RestaurantOwner, MerchantApiError>;
        async fn fetch_owner(&self, owner_id: i64) -> Result<Option<RestaurantOwner>, MerchantApiError>;
        async fn set_stripe_customer(&self, owner_id: i64, customer_id: &str) -> Result<RestaurantOwner, MerchantApiError>;
        async fn set_subscribed(&self, owner_id: i64, subscribed: bool) -> Result<RestaurantOwner, MerchantApiError>;
        async fn create_restaurant(&self, restaurant: NewRestaurant) -> Result<Restaurant, MerchantApiError>;
        async fn fetch_restaurant(&self, restaurant_id: i64) -> Result<Option<Restaurant>, MerchantApiError>;
        async fn set_connected_account(&self, restaurant_id: i64, account_id: &str) -> Result<Restaurant, MerchantApiError>;
        async fn create_dish(&self, dish: NewDish) -> Result<Dish, MerchantApiError>;
        async fn fetch_dish(&self, dish_id: i64) -> Result<Option<Dish>, MerchantApiError>;
    }
}

mock! {
    pub Gateway {}

    impl StripeGateway for Gateway {
        async fn create_account(&self, email: &str) -> Result<ConnectedAccount, StripeApiError>;
        async fn create_account_link(&self, account_id: &str, return_url: &str, refresh_url: &str) -> Result<AccountLink, StripeApiError>;
        async fn retrieve_account(&self, account_id: &str) -> Result<ConnectedAccount, StripeApiError>;
        async fn create_payment_intent(&self, request: &PaymentIntentRequest) -> Result<PaymentIntent, StripeApiError>;
        async fn create_customer(&self, name: &str, email: &str) -> Result<Customer, StripeApiError>;
        async fn create_subscription_checkout(&self, customer_id: &str, success_url: &str, cancel_url: &str) -> Result<CheckoutSession, StripeApiError>;
        async fn list_active_subscriptions(&self, customer_id: &str) -> Result<Vec<Subscription>, StripeApiError>;
    }
}
