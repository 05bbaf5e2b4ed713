//! Typed subsets of the processor's response objects. Only the fields the marketplace consumes are declared;
//! everything else in the payload is ignored.

use pwy_common::Cents;
use serde::{Deserialize, Serialize};

//--------------------------------------  ConnectedAccount   ---------------------------------------------------------
/// A connected merchant account (`/v1/accounts`). Receives the order payout minus the platform fee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectedAccount {
    pub id: String,
    #[serde(default)]
    pub charges_enabled: bool,
    #[serde(default)]
    pub payouts_enabled: bool,
    #[serde(default)]
    pub details_submitted: bool,
}

//--------------------------------------     AccountLink     ---------------------------------------------------------
/// A short-lived onboarding URL (`/v1/account_links`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountLink {
    pub url: String,
    #[serde(default)]
    pub expires_at: Option<i64>,
}

//--------------------------------------    PaymentIntent    ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    /// Handed to the frontend to confirm the payment.
    pub client_secret: Option<String>,
    pub amount: i64,
    #[serde(default)]
    pub application_fee_amount: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Everything needed to create a destination-charge payment intent for one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntentRequest {
    pub amount: Cents,
    pub currency: String,
    /// The restaurant's connected account; receives `amount - application_fee`.
    pub destination: String,
    pub application_fee: Cents,
    /// Reconciliation metadata.
    pub order_id: i64,
    pub restaurant_id: i64,
}

//--------------------------------------      Customer       ---------------------------------------------------------
/// A billing customer (`/v1/customers`), used for the owner's monthly subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

//--------------------------------------   CheckoutSession   ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

//--------------------------------------    Subscription     ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub status: String,
}

/// The processor's list envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionList {
    #[serde(default)]
    pub data: Vec<Subscription>,
}
