//! Request and response DTOs for the HTTP layer.

use order_engine::{
    db_types::{DeliveryType, GuestInfo, NewOrder, NewOrderItem, OrderStatus},
    order_objects::{OrderQueryFilter, Pagination},
};
use pwy_common::Cents;
use serde::{Deserialize, Serialize};

//--------------------------------------   Order lifecycle   ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemRequest {
    pub restaurant_id: i64,
    #[serde(default)]
    pub dish_id: Option<i64>,
    pub name: String,
    pub price: Cents,
    pub quantity: i64,
}

impl From<OrderItemRequest> for NewOrderItem {
    fn from(item: OrderItemRequest) -> Self {
        NewOrderItem {
            restaurant_id: item.restaurant_id,
            dish_id: item.dish_id,
            name: item.name,
            price: item.price,
            quantity: item.quantity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemRequest>,
    pub total_price: Cents,
    pub delivery_address: String,
    pub delivery_phone: String,
    pub delivery_type: DeliveryType,
    #[serde(default)]
    pub restaurant_instructions: Option<String>,
    #[serde(default)]
    pub platform_fee: Option<Cents>,
}

impl CreateOrderRequest {
    /// Builds the engine payload for an authenticated customer checkout.
    pub fn into_new_order(self, user_id: i64) -> NewOrder {
        self.build(Some(user_id), None)
    }

    pub fn into_guest_order(self, guest: GuestInfo) -> NewOrder {
        self.build(None, Some(guest))
    }

    fn build(self, user_id: Option<i64>, guest: Option<GuestInfo>) -> NewOrder {
        NewOrder {
            user_id,
            items: self.items.into_iter().map(NewOrderItem::from).collect(),
            total_price: self.total_price,
            delivery_address: self.delivery_address,
            delivery_phone: self.delivery_phone,
            delivery_type: self.delivery_type,
            details: self.restaurant_instructions,
            platform_fee: self.platform_fee.unwrap_or_default(),
            guest,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestOrderRequest {
    #[serde(flatten)]
    pub order: CreateOrderRequest,
    pub guest_name: String,
    pub guest_email: String,
}

/// The status string deserializes through the closed [`OrderStatus`] enum, so anything outside the allowed set is
/// rejected as a 400 before a handler ever runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
    #[serde(default)]
    pub restaurant_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelOrderRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

/// Listing query parameters: `?offset=0&count=20&status=preparing`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderListParams {
    #[serde(default)]
    pub offset: Option<i64>,
    #[serde(default)]
    pub count: Option<i64>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
}

impl OrderListParams {
    pub fn into_parts(self) -> (Pagination, OrderQueryFilter) {
        let pagination = Pagination { offset: self.offset, count: self.count };
        let filter = match self.status {
            Some(status) => OrderQueryFilter::default().with_status(status),
            None => OrderQueryFilter::default(),
        };
        (pagination, filter)
    }
}

//--------------------------------------   Payment routes    ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectAccountRequest {
    pub restaurant_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingLinkRequest {
    pub restaurant_id: i64,
    pub return_url: String,
    pub refresh_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntentRequestBody {
    pub order_id: i64,
    pub restaurant_id: i64,
    /// The portion of the order charged through this intent, in minor currency units.
    pub amount: Cents,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionCheckoutRequest {
    pub success_url: String,
    pub cancel_url: String,
}
