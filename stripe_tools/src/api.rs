use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
    Method,
};
use serde::de::DeserializeOwned;

use crate::{
    config::StripeConfig,
    data_objects::{
        AccountLink,
        CheckoutSession,
        ConnectedAccount,
        Customer,
        PaymentIntent,
        PaymentIntentRequest,
        Subscription,
        SubscriptionList,
    },
    error::StripeApiError,
};

/// The slice of the processor's API the marketplace uses. The server is generic over this trait so endpoint tests
/// can substitute a mock, and so demo mode can skip the gateway entirely.
#[allow(async_fn_in_trait)]
pub trait StripeGateway {
    /// Creates a new express connected account for a merchant.
    async fn create_account(&self, email: &str) -> Result<ConnectedAccount, StripeApiError>;

    /// Requests a short-lived onboarding URL for the connected account. Purely a passthrough.
    async fn create_account_link(
        &self,
        account_id: &str,
        return_url: &str,
        refresh_url: &str,
    ) -> Result<AccountLink, StripeApiError>;

    async fn retrieve_account(&self, account_id: &str) -> Result<ConnectedAccount, StripeApiError>;

    /// Creates a destination-charge payment intent: the full amount is charged, the platform fee is retained, and
    /// the remainder is transferred to the connected account in `request.destination`.
    async fn create_payment_intent(&self, request: &PaymentIntentRequest) -> Result<PaymentIntent, StripeApiError>;

    async fn create_customer(&self, name: &str, email: &str) -> Result<Customer, StripeApiError>;

    /// Creates a subscription-mode checkout session for the configured monthly price.
    async fn create_subscription_checkout(
        &self,
        customer_id: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, StripeApiError>;

    /// The customer's currently active subscriptions, straight from the processor.
    async fn list_active_subscriptions(&self, customer_id: &str) -> Result<Vec<Subscription>, StripeApiError>;
}

#[derive(Clone)]
pub struct StripeApi {
    config: StripeConfig,
    client: Arc<Client>,
}

impl StripeApi {
    pub fn new(config: StripeConfig) -> Result<Self, StripeApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        let bearer = format!("Bearer {}", config.secret_key.reveal());
        let mut val =
            HeaderValue::from_str(&bearer).map_err(|e| StripeApiError::Initialization(e.to_string()))?;
        val.set_sensitive(true);
        headers.insert(AUTHORIZATION, val);
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| StripeApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1{path}", self.config.api_base)
    }

    /// Sends one request to the processor. The processor takes form-encoded bodies and returns JSON; GET requests
    /// carry the parameters as a query string instead.
    pub async fn form_query<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, StripeApiError> {
        let url = self.url(path);
        trace!("Sending query: {method} {url}");
        let mut req = self.client.request(method.clone(), url);
        req = if method == Method::GET { req.query(params) } else { req.form(params) };
        let response = req.send().await.map_err(|e| StripeApiError::RequestError(e.to_string()))?;
        if response.status().is_success() {
            trace!("Query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| StripeApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| StripeApiError::RequestError(e.to_string()))?;
            Err(StripeApiError::QueryError { status, message })
        }
    }
}

impl StripeGateway for StripeApi {
    async fn create_account(&self, email: &str) -> Result<ConnectedAccount, StripeApiError> {
        let params = [("type", "express".to_string()), ("email", email.to_string())];
        let account: ConnectedAccount = self.form_query(Method::POST, "/accounts", &params).await?;
        debug!("🔌️ Created connected account {} for {email}", account.id);
        Ok(account)
    }

    async fn create_account_link(
        &self,
        account_id: &str,
        return_url: &str,
        refresh_url: &str,
    ) -> Result<AccountLink, StripeApiError> {
        let params = [
            ("account", account_id.to_string()),
            ("return_url", return_url.to_string()),
            ("refresh_url", refresh_url.to_string()),
            ("type", "account_onboarding".to_string()),
        ];
        self.form_query(Method::POST, "/account_links", &params).await
    }

    async fn retrieve_account(&self, account_id: &str) -> Result<ConnectedAccount, StripeApiError> {
        self.form_query(Method::GET, &format!("/accounts/{account_id}"), &[]).await
    }

    async fn create_payment_intent(&self, request: &PaymentIntentRequest) -> Result<PaymentIntent, StripeApiError> {
        let params = [
            ("amount", request.amount.value().to_string()),
            ("currency", request.currency.clone()),
            ("application_fee_amount", request.application_fee.value().to_string()),
            ("transfer_data[destination]", request.destination.clone()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
            ("metadata[order_id]", request.order_id.to_string()),
            ("metadata[restaurant_id]", request.restaurant_id.to_string()),
        ];
        let intent: PaymentIntent = self.form_query(Method::POST, "/payment_intents", &params).await?;
        debug!(
            "🔌️ Payment intent {} created: {} with fee {} to {}",
            intent.id, request.amount, request.application_fee, request.destination
        );
        Ok(intent)
    }

    async fn create_customer(&self, name: &str, email: &str) -> Result<Customer, StripeApiError> {
        let params = [("name", name.to_string()), ("email", email.to_string())];
        self.form_query(Method::POST, "/customers", &params).await
    }

    async fn create_subscription_checkout(
        &self,
        customer_id: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, StripeApiError> {
        let params = [
            ("mode", "subscription".to_string()),
            ("customer", customer_id.to_string()),
            ("line_items[0][price]", self.config.monthly_price_id.clone()),
            ("line_items[0][quantity]", "1".to_string()),
            ("success_url", success_url.to_string()),
            ("cancel_url", cancel_url.to_string()),
        ];
        self.form_query(Method::POST, "/checkout/sessions", &params).await
    }

    async fn list_active_subscriptions(&self, customer_id: &str) -> Result<Vec<Subscription>, StripeApiError> {
        let params = [("customer", customer_id.to_string()), ("status", "active".to_string())];
        let list: SubscriptionList = self.form_query(Method::GET, "/subscriptions", &params).await?;
        Ok(list.data)
    }
}
