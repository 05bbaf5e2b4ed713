//! Plateway Order Engine
//!
//! The order engine is the core library of the Plateway food-ordering marketplace. It owns the order lifecycle
//! (creation, querying, status transitions, cancellation and dashboard statistics) and the marketplace records that
//! the payment flows hang off (restaurants, owners, dishes and carts).
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@sqlite`]). SQLite is the bundled backend; the schema and queries are
//!    written so that a Postgres backend can slot in behind the same traits. You should never need to access the
//!    database directly. Instead, use the public API provided by the engine. The exception is the data types used in
//!    the database. These are defined in the `db_types` module and are public.
//! 2. The engine public API ([`mod@api`]). This provides the public-facing functionality of the engine. It is
//!    responsible for enforcing order-creation atomicity, status-transition legality and authorization for reads and
//!    updates. Specific backends need to implement the traits in the [`mod@traits`] module in order to act as a
//!    backend for the Plateway server.
pub mod api;
pub mod db_types;
#[cfg(feature = "sqlite")]
pub mod sqlite;
#[cfg(feature = "sqlite")]
pub mod test_utils;
pub mod traits;

pub use api::{merchant_api::MerchantApi, order_flow_api::OrderFlowApi, order_objects};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    CartManagement,
    MarketplaceDatabase,
    MerchantApiError,
    MerchantManagement,
    OrderFlowError,
    OrderManagement,
};
