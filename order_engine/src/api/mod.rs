//! The engine public API.
//!
//! [`order_flow_api::OrderFlowApi`] enforces the order-lifecycle business rules on top of any
//! [`crate::traits::MarketplaceDatabase`] backend; [`merchant_api::MerchantApi`] is a thin typed façade over
//! [`crate::traits::MerchantManagement`] used by the server's payment routes.

pub mod merchant_api;
pub mod order_flow_api;
pub mod order_objects;
