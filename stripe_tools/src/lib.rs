//! Client crate for the payment processor (Stripe) REST API.
//!
//! Everything the marketplace needs from the processor goes through the [`StripeGateway`] trait: connected merchant
//! accounts and their onboarding links, per-order payment intents with the platform-fee split, and the restaurant
//! owners' monthly subscription billing. [`StripeApi`] is the concrete HTTP implementation; the server substitutes
//! mocks in tests and skips the gateway entirely in demo mode.

mod api;
mod config;
mod data_objects;
mod error;
mod fees;

pub use api::{StripeApi, StripeGateway};
pub use config::StripeConfig;
pub use data_objects::{
    AccountLink,
    CheckoutSession,
    ConnectedAccount,
    Customer,
    PaymentIntent,
    PaymentIntentRequest,
    Subscription,
    SubscriptionList,
};
pub use error::StripeApiError;
pub use fees::{platform_fee, PLATFORM_FEE_PERCENT};
