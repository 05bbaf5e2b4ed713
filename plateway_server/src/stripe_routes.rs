//! Payment, onboarding and subscription route handlers, mounted under the `/stripe` scope.
//!
//! All processor interaction goes through [`PaymentGatewayApi`], so every route here degrades to a demo-mode
//! response when no processor is configured, and processor error shapes are remapped by [`ServerError`] before
//! anything reaches a client.

use actix_web::{web, HttpResponse};
use log::*;
use order_engine::{traits::MerchantManagement, MerchantApi};
use stripe_tools::StripeGateway;

use crate::{
    auth::{JwtClaims, Role},
    data_objects::{
        ConnectAccountRequest,
        OnboardingLinkRequest,
        PaymentIntentRequestBody,
        SubscriptionCheckoutRequest,
    },
    errors::ServerError,
    integrations::stripe::PaymentGatewayApi,
    route,
    routes::check_restaurant_ownership,
};

route!(connect_account => Post "/connect/accounts" impl MerchantManagement, StripeGateway requires [Role::Owner]);
/// Create (or return) the restaurant's connected merchant account. Idempotent once an account id is stored.
pub async fn connect_account<M, G>(
    claims: JwtClaims,
    body: web::Json<ConnectAccountRequest>,
    merchants: web::Data<MerchantApi<M>>,
    payments: web::Data<PaymentGatewayApi<M, G>>,
) -> Result<HttpResponse, ServerError>
where
    M: MerchantManagement + 'static,
    G: StripeGateway + 'static,
{
    let restaurant_id = body.restaurant_id;
    debug!("💻️ POST connect account for restaurant {restaurant_id} by subject {}", claims.sub);
    check_restaurant_ownership(&claims, restaurant_id, &merchants).await?;
    let response = payments.create_connected_account(restaurant_id).await?;
    Ok(HttpResponse::Ok().json(response))
}

route!(connect_onboarding => Post "/connect/onboarding" impl MerchantManagement, StripeGateway requires [Role::Owner]);
pub async fn connect_onboarding<M, G>(
    claims: JwtClaims,
    body: web::Json<OnboardingLinkRequest>,
    merchants: web::Data<MerchantApi<M>>,
    payments: web::Data<PaymentGatewayApi<M, G>>,
) -> Result<HttpResponse, ServerError>
where
    M: MerchantManagement + 'static,
    G: StripeGateway + 'static,
{
    let OnboardingLinkRequest { restaurant_id, return_url, refresh_url } = body.into_inner();
    debug!("💻️ POST onboarding link for restaurant {restaurant_id} by subject {}", claims.sub);
    check_restaurant_ownership(&claims, restaurant_id, &merchants).await?;
    let response = payments.onboarding_link(restaurant_id, &return_url, &refresh_url).await?;
    Ok(HttpResponse::Ok().json(response))
}

route!(connect_status => Get "/connect/status/{restaurant_id}" impl MerchantManagement, StripeGateway requires [Role::Owner]);
pub async fn connect_status<M, G>(
    claims: JwtClaims,
    path: web::Path<i64>,
    merchants: web::Data<MerchantApi<M>>,
    payments: web::Data<PaymentGatewayApi<M, G>>,
) -> Result<HttpResponse, ServerError>
where
    M: MerchantManagement + 'static,
    G: StripeGateway + 'static,
{
    let restaurant_id = path.into_inner();
    debug!("💻️ GET connect status for restaurant {restaurant_id} by subject {}", claims.sub);
    check_restaurant_ownership(&claims, restaurant_id, &merchants).await?;
    let response = payments.account_status(restaurant_id).await?;
    Ok(HttpResponse::Ok().json(response))
}

route!(payment_intent => Post "/payment-intents" impl MerchantManagement, StripeGateway);
/// Create the payment intent for one order's restaurant portion. Any authenticated session may pay.
pub async fn payment_intent<M, G>(
    claims: JwtClaims,
    body: web::Json<PaymentIntentRequestBody>,
    payments: web::Data<PaymentGatewayApi<M, G>>,
) -> Result<HttpResponse, ServerError>
where
    M: MerchantManagement + 'static,
    G: StripeGateway + 'static,
{
    let PaymentIntentRequestBody { order_id, restaurant_id, amount } = body.into_inner();
    debug!("💻️ POST payment intent for order {order_id} ({amount}) by subject {}", claims.sub);
    let response = payments.create_order_payment_intent(order_id, restaurant_id, amount).await?;
    Ok(HttpResponse::Ok().json(response))
}

route!(subscription_checkout => Post "/subscriptions/checkout" impl MerchantManagement, StripeGateway requires [Role::Owner]);
pub async fn subscription_checkout<M, G>(
    claims: JwtClaims,
    body: web::Json<SubscriptionCheckoutRequest>,
    payments: web::Data<PaymentGatewayApi<M, G>>,
) -> Result<HttpResponse, ServerError>
where
    M: MerchantManagement + 'static,
    G: StripeGateway + 'static,
{
    debug!("💻️ POST subscription checkout for owner {}", claims.sub);
    let SubscriptionCheckoutRequest { success_url, cancel_url } = body.into_inner();
    let response = payments.subscription_checkout(claims.sub, &success_url, &cancel_url).await?;
    Ok(HttpResponse::Ok().json(response))
}

route!(subscription_status => Get "/subscriptions/status" impl MerchantManagement, StripeGateway requires [Role::Owner]);
/// The owner's subscription status, reconciled against the processor's live list on every call.
pub async fn subscription_status<M, G>(
    claims: JwtClaims,
    payments: web::Data<PaymentGatewayApi<M, G>>,
) -> Result<HttpResponse, ServerError>
where
    M: MerchantManagement + 'static,
    G: StripeGateway + 'static,
{
    debug!("💻️ GET subscription status for owner {}", claims.sub);
    let response = payments.subscription_status(claims.sub).await?;
    Ok(HttpResponse::Ok().json(response))
}

route!(activate_demo_subscription => Post "/subscriptions/demo" impl MerchantManagement, StripeGateway requires [Role::Owner]);
pub async fn activate_demo_subscription<M, G>(
    claims: JwtClaims,
    payments: web::Data<PaymentGatewayApi<M, G>>,
) -> Result<HttpResponse, ServerError>
where
    M: MerchantManagement + 'static,
    G: StripeGateway + 'static,
{
    debug!("💻️ POST demo subscription for owner {}", claims.sub);
    let response = payments.activate_demo_subscription(claims.sub).await?;
    Ok(HttpResponse::Ok().json(response))
}
