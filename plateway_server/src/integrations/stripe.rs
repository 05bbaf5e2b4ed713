//! Orchestration between the marketplace records and the payment processor.
//!
//! [`PaymentGatewayApi`] combines a [`MerchantManagement`] backend with an optional [`StripeGateway`]. `None` means
//! the processor is unconfigured; every operation then degrades to a demo-mode response (`demo_mode: true`) instead
//! of failing. That fallback is deliberate: misconfiguration is a development state, not a runtime error. A
//! configured gateway that fails at runtime surfaces as
//! [`PaymentGatewayApiError::GatewayError`], which the HTTP layer remaps to a generic payment-gateway error.

use std::fmt::Debug;

use log::*;
use order_engine::{db_types::RestaurantOwner, MerchantApiError, MerchantManagement};
use pwy_common::{Cents, CURRENCY_CODE};
use serde::{Deserialize, Serialize};
use stripe_tools::{platform_fee, PaymentIntentRequest, StripeApiError, StripeGateway};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayApiError {
    #[error("Restaurant {restaurant_id} has no connected account yet and must complete onboarding")]
    OnboardingRequired { restaurant_id: i64 },
    #[error("The requested restaurant {0} does not exist")]
    RestaurantNotFound(i64),
    #[error("The requested restaurant owner {0} does not exist")]
    OwnerNotFound(i64),
    #[error("Payment gateway failure: {0}")]
    GatewayError(#[from] StripeApiError),
    #[error("There is an internal database engine error: {0}")]
    DatabaseError(String),
}

impl From<MerchantApiError> for PaymentGatewayApiError {
    fn from(e: MerchantApiError) -> Self {
        match e {
            MerchantApiError::RestaurantNotFound(id) => Self::RestaurantNotFound(id),
            MerchantApiError::OwnerNotFound(id) => Self::OwnerNotFound(id),
            MerchantApiError::DishNotFound(_) => Self::DatabaseError(e.to_string()),
            MerchantApiError::DatabaseError(m) => Self::DatabaseError(m),
        }
    }
}

//--------------------------------------     Responses      ----------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectAccountResponse {
    pub account_id: String,
    pub demo_mode: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountStatusResponse {
    pub account_id: Option<String>,
    pub onboarding_complete: bool,
    pub charges_enabled: bool,
    pub payouts_enabled: bool,
    pub demo_mode: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingLinkResponse {
    pub url: String,
    pub demo_mode: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntentResponse {
    pub payment_intent_id: Option<String>,
    pub client_secret: Option<String>,
    pub amount: Cents,
    pub platform_fee: Cents,
    pub demo_mode: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSessionResponse {
    pub session_id: Option<String>,
    pub url: String,
    pub demo_mode: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionStatusResponse {
    pub subscribed: bool,
    pub demo_mode: bool,
}

//--------------------------------------  PaymentGatewayApi  ---------------------------------------------------------
pub struct PaymentGatewayApi<B, G> {
    db: B,
    gateway: Option<G>,
}

impl<B, G> Debug for PaymentGatewayApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentGatewayApi (demo_mode: {})", self.gateway.is_none())
    }
}

impl<B, G> PaymentGatewayApi<B, G> {
    pub fn new(db: B, gateway: Option<G>) -> Self {
        Self { db, gateway }
    }

    pub fn demo_mode(&self) -> bool {
        self.gateway.is_none()
    }
}

impl<B, G> PaymentGatewayApi<B, G>
where
    B: MerchantManagement,
    G: StripeGateway,
{
    /// Creates a connected merchant account for the restaurant if none exists, persisting the identifier.
    /// Idempotent: once an account id is stored, repeated calls return it without touching the processor.
    pub async fn create_connected_account(
        &self,
        restaurant_id: i64,
    ) -> Result<ConnectAccountResponse, PaymentGatewayApiError> {
        let restaurant = self
            .db
            .fetch_restaurant(restaurant_id)
            .await?
            .ok_or(PaymentGatewayApiError::RestaurantNotFound(restaurant_id))?;
        if let Some(account_id) = restaurant.stripe_account_id {
            debug!("💳️ Restaurant {restaurant_id} already has connected account {account_id}");
            return Ok(ConnectAccountResponse { account_id, demo_mode: self.demo_mode() });
        }
        let account_id = match &self.gateway {
            Some(gateway) => {
                let owner = self
                    .db
                    .fetch_owner(restaurant.owner_id)
                    .await?
                    .ok_or(PaymentGatewayApiError::OwnerNotFound(restaurant.owner_id))?;
                gateway.create_account(&owner.email).await?.id
            },
            None => {
                info!("💳️ Payment processor not configured; minting a demo account for restaurant {restaurant_id}");
                format!("acct_demo_{restaurant_id}")
            },
        };
        self.db.set_connected_account(restaurant_id, &account_id).await?;
        debug!("💳️ Connected account {account_id} stored for restaurant {restaurant_id}");
        Ok(ConnectAccountResponse { account_id, demo_mode: self.demo_mode() })
    }

    /// Requests a short-lived onboarding URL for the restaurant's connected account. Purely a passthrough; in demo
    /// mode the return URL is handed straight back.
    pub async fn onboarding_link(
        &self,
        restaurant_id: i64,
        return_url: &str,
        refresh_url: &str,
    ) -> Result<OnboardingLinkResponse, PaymentGatewayApiError> {
        let restaurant = self
            .db
            .fetch_restaurant(restaurant_id)
            .await?
            .ok_or(PaymentGatewayApiError::RestaurantNotFound(restaurant_id))?;
        let account_id =
            restaurant.stripe_account_id.ok_or(PaymentGatewayApiError::OnboardingRequired { restaurant_id })?;
        match &self.gateway {
            Some(gateway) => {
                let link = gateway.create_account_link(&account_id, return_url, refresh_url).await?;
                Ok(OnboardingLinkResponse { url: link.url, demo_mode: false })
            },
            None => Ok(OnboardingLinkResponse { url: return_url.to_string(), demo_mode: true }),
        }
    }

    /// Whether charges and payouts are enabled and onboarding is complete for the restaurant's connected account.
    pub async fn account_status(&self, restaurant_id: i64) -> Result<AccountStatusResponse, PaymentGatewayApiError> {
        let restaurant = self
            .db
            .fetch_restaurant(restaurant_id)
            .await?
            .ok_or(PaymentGatewayApiError::RestaurantNotFound(restaurant_id))?;
        let Some(account_id) = restaurant.stripe_account_id else {
            return Ok(AccountStatusResponse {
                account_id: None,
                onboarding_complete: false,
                charges_enabled: false,
                payouts_enabled: false,
                demo_mode: self.demo_mode(),
            });
        };
        match &self.gateway {
            Some(gateway) => {
                let account = gateway.retrieve_account(&account_id).await?;
                Ok(AccountStatusResponse {
                    account_id: Some(account.id),
                    onboarding_complete: account.details_submitted,
                    charges_enabled: account.charges_enabled,
                    payouts_enabled: account.payouts_enabled,
                    demo_mode: false,
                })
            },
            None => Ok(AccountStatusResponse {
                account_id: Some(account_id),
                onboarding_complete: true,
                charges_enabled: true,
                payouts_enabled: true,
                demo_mode: true,
            }),
        }
    }

    /// Creates a payment intent for one order, splitting the amount between the marketplace and the restaurant.
    ///
    /// The platform fee is a fixed percentage of the amount, rounded to the nearest cent; the restaurant's connected
    /// account receives the remainder. Fails with an onboarding-required error when the restaurant has no connected
    /// account yet. The intent is tagged with order/restaurant metadata for reconciliation.
    pub async fn create_order_payment_intent(
        &self,
        order_id: i64,
        restaurant_id: i64,
        amount: Cents,
    ) -> Result<PaymentIntentResponse, PaymentGatewayApiError> {
        let restaurant = self
            .db
            .fetch_restaurant(restaurant_id)
            .await?
            .ok_or(PaymentGatewayApiError::RestaurantNotFound(restaurant_id))?;
        let fee = platform_fee(amount);
        let Some(gateway) = &self.gateway else {
            info!("💳️ Demo payment intent for order #{order_id}: {amount} with fee {fee}");
            return Ok(PaymentIntentResponse {
                payment_intent_id: None,
                client_secret: Some(format!("pi_demo_{order_id}_secret")),
                amount,
                platform_fee: fee,
                demo_mode: true,
            });
        };
        let destination =
            restaurant.stripe_account_id.ok_or(PaymentGatewayApiError::OnboardingRequired { restaurant_id })?;
        let request = PaymentIntentRequest {
            amount,
            currency: CURRENCY_CODE.to_string(),
            destination,
            application_fee: fee,
            order_id,
            restaurant_id,
        };
        let intent = gateway.create_payment_intent(&request).await?;
        debug!("💳️ Payment intent {} created for order #{order_id} ({amount}, fee {fee})", intent.id);
        Ok(PaymentIntentResponse {
            payment_intent_id: Some(intent.id),
            client_secret: intent.client_secret,
            amount,
            platform_fee: fee,
            demo_mode: false,
        })
    }

    /// Starts a subscription checkout for the owner's monthly marketplace fee, creating and persisting a billing
    /// customer on first use.
    pub async fn subscription_checkout(
        &self,
        owner_id: i64,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSessionResponse, PaymentGatewayApiError> {
        let owner =
            self.db.fetch_owner(owner_id).await?.ok_or(PaymentGatewayApiError::OwnerNotFound(owner_id))?;
        let Some(gateway) = &self.gateway else {
            info!("💳️ Demo subscription checkout for owner {owner_id}");
            return Ok(CheckoutSessionResponse { session_id: None, url: success_url.to_string(), demo_mode: true });
        };
        let customer_id = self.customer_id_for(gateway, &owner).await?;
        let session = gateway.create_subscription_checkout(&customer_id, success_url, cancel_url).await?;
        let url = session.url.unwrap_or_else(|| success_url.to_string());
        Ok(CheckoutSessionResponse { session_id: Some(session.id), url, demo_mode: false })
    }

    /// The owner's subscription status, reconciled against the processor.
    ///
    /// The local `is_subscribed` flag is a cache. The processor's active-subscription list is authoritative, and the
    /// flag is self-healed in both directions before the corrected value is returned.
    pub async fn subscription_status(
        &self,
        owner_id: i64,
    ) -> Result<SubscriptionStatusResponse, PaymentGatewayApiError> {
        let owner =
            self.db.fetch_owner(owner_id).await?.ok_or(PaymentGatewayApiError::OwnerNotFound(owner_id))?;
        let Some(gateway) = &self.gateway else {
            return Ok(SubscriptionStatusResponse { subscribed: owner.is_subscribed, demo_mode: true });
        };
        let live = match &owner.stripe_customer_id {
            Some(customer_id) => !gateway.list_active_subscriptions(customer_id).await?.is_empty(),
            None => false,
        };
        if live != owner.is_subscribed {
            warn!(
                "💳️ Subscription flag for owner {owner_id} drifted (local: {}, processor: {live}). Correcting.",
                owner.is_subscribed
            );
            self.db.set_subscribed(owner_id, live).await?;
        }
        Ok(SubscriptionStatusResponse { subscribed: live, demo_mode: false })
    }

    /// Marks the owner as subscribed without touching the processor. Development convenience.
    pub async fn activate_demo_subscription(
        &self,
        owner_id: i64,
    ) -> Result<SubscriptionStatusResponse, PaymentGatewayApiError> {
        let owner = self.db.set_subscribed(owner_id, true).await?;
        info!("💳️ Demo subscription activated for owner {owner_id}");
        Ok(SubscriptionStatusResponse { subscribed: owner.is_subscribed, demo_mode: self.demo_mode() })
    }

    async fn customer_id_for(&self, gateway: &G, owner: &RestaurantOwner) -> Result<String, PaymentGatewayApiError> {
        if let Some(customer_id) = &owner.stripe_customer_id {
            return Ok(customer_id.clone());
        }
        let customer = gateway.create_customer(&owner.name, &owner.email).await?;
        self.db.set_stripe_customer(owner.id, &customer.id).await?;
        debug!("💳️ Billing customer {} stored for owner {}", customer.id, owner.id);
        Ok(customer.id)
    }
}
