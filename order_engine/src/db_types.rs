//! Database record types shared between the engine API and the storage backends.
//!
//! `Order` and `OrderItem` are immutable value records once created. The item rows carry a denormalised snapshot of
//! the dish name and price at order time, so later menu edits never retroactively alter historical orders. Anything
//! that needs the *current* dish data must join separately and must never overwrite the snapshot.

use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use pwy_common::Cents;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------     OrderStatus     ---------------------------------------------------------
/// The closed set of order statuses.
///
/// The intake pipeline is linear (`pending → paid/confirmed → preparing → ready → out_for_delivery → delivered`),
/// with `cancelled` reachable from any non-terminal state. Restaurant-initiated updates are only validated for
/// membership in this set; forward and backward jumps are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Newly created, payment not yet taken.
    Pending,
    /// Payment captured in full.
    Paid,
    /// Acknowledged by the restaurant.
    Received,
    Confirmed,
    Preparing,
    Ready,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Statuses from which a customer may no longer cancel.
    pub fn is_cancellable(&self) -> bool {
        !matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::OutForDelivery)
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Received => "received",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct StatusConversionError(String);

impl FromStr for OrderStatus {
    type Err = StatusConversionError;

    /// The single allow-list validator for status strings. Everything that accepts a status from the outside world
    /// funnels through here (or through serde, which uses the same spellings).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "received" => Ok(Self::Received),
            "confirmed" => Ok(Self::Confirmed),
            "preparing" => Ok(Self::Preparing),
            "ready" => Ok(Self::Ready),
            "out_for_delivery" => Ok(Self::OutForDelivery),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(StatusConversionError(s.to_string())),
        }
    }
}

//--------------------------------------     DeliveryType    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeliveryType {
    Delivery,
    Pickup,
}

impl Display for DeliveryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryType::Delivery => write!(f, "delivery"),
            DeliveryType::Pickup => write!(f, "pickup"),
        }
    }
}

impl FromStr for DeliveryType {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "delivery" => Ok(Self::Delivery),
            "pickup" => Ok(Self::Pickup),
            s => Err(StatusConversionError(format!("invalid delivery type: {s}"))),
        }
    }
}

//--------------------------------------        Order        ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    /// The owning user. `None` for guest orders.
    pub user_id: Option<i64>,
    pub total_price: Cents,
    pub status: OrderStatus,
    /// Free-text details. Restaurant instructions at creation time; cancellation reasons are appended here.
    pub details: Option<String>,
    pub delivery_address: String,
    pub delivery_phone: String,
    pub delivery_type: DeliveryType,
    pub platform_fee: Cents,
    pub is_guest_order: bool,
    pub guest_name: Option<String>,
    pub guest_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------       NewOrder      ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestInfo {
    pub name: String,
    pub email: String,
}

/// Checkout payload for a new order. One `NewOrder` becomes exactly one order row plus one item row per entry in
/// `items`, all inside a single transaction that also clears the purchasing user's cart.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Option<i64>,
    pub items: Vec<NewOrderItem>,
    pub total_price: Cents,
    pub delivery_address: String,
    pub delivery_phone: String,
    pub delivery_type: DeliveryType,
    /// Restaurant instructions supplied by the customer.
    pub details: Option<String>,
    pub platform_fee: Cents,
    pub guest: Option<GuestInfo>,
}

impl NewOrder {
    pub fn new(user_id: i64, items: Vec<NewOrderItem>, total_price: Cents) -> Self {
        Self {
            user_id: Some(user_id),
            items,
            total_price,
            delivery_address: String::default(),
            delivery_phone: String::default(),
            delivery_type: DeliveryType::Delivery,
            details: None,
            platform_fee: Cents::default(),
            guest: None,
        }
    }

    pub fn for_guest(guest: GuestInfo, items: Vec<NewOrderItem>, total_price: Cents) -> Self {
        Self {
            user_id: None,
            items,
            total_price,
            delivery_address: String::default(),
            delivery_phone: String::default(),
            delivery_type: DeliveryType::Delivery,
            details: None,
            platform_fee: Cents::default(),
            guest: Some(guest),
        }
    }

    pub fn with_delivery(mut self, address: String, phone: String, delivery_type: DeliveryType) -> Self {
        self.delivery_address = address;
        self.delivery_phone = phone;
        self.delivery_type = delivery_type;
        self
    }

    pub fn with_details(mut self, details: String) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_platform_fee(mut self, fee: Cents) -> Self {
        self.platform_fee = fee;
        self
    }

    /// The sum of `price × quantity` over all items, ignoring any caller-defined fees.
    pub fn items_subtotal(&self) -> Cents {
        self.items.iter().map(|i| i.price * i.quantity).sum()
    }
}

//--------------------------------------      OrderItem      ---------------------------------------------------------
/// A line in an order. Name and price are a snapshot taken at order time. The row carries its own restaurant id so
/// that a single order can span multiple restaurants.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub restaurant_id: i64,
    /// The dish the snapshot was taken from, if it still exists.
    pub dish_id: Option<i64>,
    pub name: String,
    pub price: Cents,
    pub quantity: i64,
}

impl OrderItem {
    pub fn line_total(&self) -> Cents {
        self.price * self.quantity
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub restaurant_id: i64,
    pub dish_id: Option<i64>,
    pub name: String,
    pub price: Cents,
    pub quantity: i64,
}

impl NewOrderItem {
    pub fn new<S: Into<String>>(restaurant_id: i64, name: S, price: Cents, quantity: i64) -> Self {
        Self { restaurant_id, dish_id: None, name: name.into(), price, quantity }
    }

    pub fn with_dish_id(mut self, dish_id: i64) -> Self {
        self.dish_id = Some(dish_id);
        self
    }
}

//--------------------------------------     Restaurant      ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    /// Connected merchant account at the payment processor. `None` until onboarding completes.
    pub stripe_account_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRestaurant {
    pub owner_id: i64,
    pub name: String,
}

//--------------------------------------   RestaurantOwner   ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RestaurantOwner {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// Billing customer at the payment processor, used for the monthly subscription.
    pub stripe_customer_id: Option<String>,
    /// Locally cached subscription flag. Reconciled against the processor on every status check.
    pub is_subscribed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRestaurantOwner {
    pub name: String,
    pub email: String,
}

//--------------------------------------        Dish         ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Dish {
    pub id: i64,
    pub restaurant_id: i64,
    pub name: String,
    pub price: Cents,
    pub available: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDish {
    pub restaurant_id: i64,
    pub name: String,
    pub price: Cents,
}

//--------------------------------------      CartItem       ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CartItem {
    pub id: i64,
    pub user_id: i64,
    pub dish_id: i64,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use super::OrderStatus;

    #[test]
    fn status_round_trip() {
        for s in
            ["pending", "paid", "received", "confirmed", "preparing", "ready", "out_for_delivery", "delivered", "cancelled"]
        {
            let status = OrderStatus::from_str(s).expect("allowed status must parse");
            assert_eq!(status.to_string(), s);
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        for s in ["", "Pending", "shipped", "OUT_FOR_DELIVERY", "done", "pending "] {
            assert!(OrderStatus::from_str(s).is_err(), "{s:?} should not parse");
        }
    }

    #[test]
    fn delivery_type_round_trip() {
        use super::DeliveryType;
        assert_eq!(DeliveryType::from_str("delivery").unwrap(), DeliveryType::Delivery);
        assert_eq!(DeliveryType::from_str("pickup").unwrap(), DeliveryType::Pickup);
        assert!(DeliveryType::from_str("drone").is_err());
        assert_eq!(DeliveryType::Pickup.to_string(), "pickup");
    }

    #[test]
    fn cancellable_statuses() {
        use OrderStatus::*;
        for s in [Pending, Paid, Received, Confirmed, Preparing, Ready] {
            assert!(s.is_cancellable());
        }
        for s in [OutForDelivery, Delivered, Cancelled] {
            assert!(!s.is_cancellable());
        }
    }
}
