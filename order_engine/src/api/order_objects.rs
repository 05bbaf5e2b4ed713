use std::fmt::Display;

use chrono::{DateTime, Utc};
use pwy_common::Cents;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::db_types::{Order, OrderItem, OrderStatus};

pub const DEFAULT_PAGE_SIZE: i64 = 50;

//--------------------------------------     Pagination      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Pagination {
    pub offset: Option<i64>,
    pub count: Option<i64>,
}

impl Pagination {
    pub fn new(offset: i64, count: i64) -> Self {
        Self { offset: Some(offset), count: Some(count) }
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    pub fn limit(&self) -> i64 {
        self.count.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 500)
    }
}

//--------------------------------------   OrderQueryFilter  ---------------------------------------------------------
/// Optional narrowing criteria for order listings. An empty filter matches everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub status: Option<Vec<OrderStatus>>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl OrderQueryFilter {
    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.as_ref().map(|s| s.is_empty()).unwrap_or(true) && self.since.is_none() && self.until.is_none()
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "No filters.");
        }
        if let Some(statuses) = &self.status {
            let s = statuses.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(",");
            write!(f, "status in [{s}]. ")?;
        }
        if let Some(since) = &self.since {
            write!(f, "since: {since}. ")?;
        }
        if let Some(until) = &self.until {
            write!(f, "until: {until}. ")?;
        }
        Ok(())
    }
}

//--------------------------------------    OrderRequester   ---------------------------------------------------------
/// Who is asking. Route handlers build this from session claims; the API layer uses it for read authorization.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderRequester {
    pub user_id: Option<i64>,
    pub is_owner: bool,
}

impl OrderRequester {
    pub fn user(user_id: i64) -> Self {
        Self { user_id: Some(user_id), is_owner: false }
    }

    pub fn owner(user_id: i64) -> Self {
        Self { user_id: Some(user_id), is_owner: true }
    }
}

//--------------------------------------   OrderItemDetail   ---------------------------------------------------------
/// An order item joined with display metadata. The joins are LEFT joins: the snapshot stands on its own even when
/// the restaurant or dish has since been removed.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderItemDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub item: OrderItem,
    pub restaurant_name: Option<String>,
    pub dish_available: Option<bool>,
}

//--------------------------------------    OrderWithItems   ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItemDetail>,
}

//--------------------------------------   RestaurantOrder   ---------------------------------------------------------
/// One order as seen by a single restaurant: only that restaurant's item subset and the subtotal over it, even when
/// the order spans multiple restaurants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestaurantOrder {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub subtotal: Cents,
}

impl RestaurantOrder {
    pub fn new(order: Order, items: Vec<OrderItem>) -> Self {
        let subtotal = items.iter().map(OrderItem::line_total).sum();
        Self { order, items, subtotal }
    }
}

//--------------------------------------      OrderPage      ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPage {
    /// Total matches for the filter, independent of the page bounds.
    pub total: i64,
    pub offset: i64,
    pub orders: Vec<OrderWithItems>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestaurantOrderPage {
    pub total: i64,
    pub offset: i64,
    pub orders: Vec<RestaurantOrder>,
}

//--------------------------------------       Stats         ---------------------------------------------------------
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize)]
pub struct UserOrderStats {
    pub total_orders: i64,
    pub total_spent: Cents,
    pub average_order_value: Cents,
    pub delivered_orders: i64,
    pub cancelled_orders: i64,
}

#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize)]
pub struct RestaurantOrderStats {
    /// Orders containing at least one of this restaurant's items.
    pub total_orders: i64,
    pub items_sold: i64,
    /// Sum of `price × quantity` over this restaurant's item subset.
    pub gross_revenue: Cents,
    pub average_order_value: Cents,
}
