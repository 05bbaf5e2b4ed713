use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use order_engine::{MerchantApi, OrderFlowApi, SqliteDatabase};
use stripe_tools::StripeApi;

use crate::{
    auth::TokenVerifier,
    config::ServerConfig,
    errors::ServerError,
    integrations::stripe::PaymentGatewayApi,
    routes::{
        health,
        CancelOrderRoute,
        CreateOrderRoute,
        GuestCheckoutRoute,
        MyOrderStatsRoute,
        MyOrdersRoute,
        OrderByIdRoute,
        RestaurantOrderStatsRoute,
        RestaurantOrdersRoute,
        UpdateOrderStatusRoute,
    },
    stripe_routes::{
        ActivateDemoSubscriptionRoute,
        ConnectAccountRoute,
        ConnectOnboardingRoute,
        ConnectStatusRoute,
        PaymentIntentRoute,
        SubscriptionCheckoutRoute,
        SubscriptionStatusRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let gateway = if config.stripe.is_configured() {
        Some(StripeApi::new(config.stripe.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?)
    } else {
        info!("🔌️ No payment processor configured. Payment routes will serve demo-mode responses.");
        None
    };
    let (host, port) = (config.host.clone(), config.port);
    let srv = HttpServer::new(move || {
        let order_api = OrderFlowApi::new(db.clone());
        let merchant_api = MerchantApi::new(db.clone());
        let payment_api = PaymentGatewayApi::new(db.clone(), gateway.clone());
        let verifier = TokenVerifier::new(&config.auth);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("pwy::access_log"))
            .app_data(web::Data::new(order_api))
            .app_data(web::Data::new(merchant_api))
            .app_data(web::Data::new(payment_api))
            .app_data(web::Data::new(verifier));
        let stripe_scope = web::scope("/stripe")
            .service(ConnectAccountRoute::<SqliteDatabase, StripeApi>::new())
            .service(ConnectOnboardingRoute::<SqliteDatabase, StripeApi>::new())
            .service(ConnectStatusRoute::<SqliteDatabase, StripeApi>::new())
            .service(PaymentIntentRoute::<SqliteDatabase, StripeApi>::new())
            .service(SubscriptionCheckoutRoute::<SqliteDatabase, StripeApi>::new())
            .service(SubscriptionStatusRoute::<SqliteDatabase, StripeApi>::new())
            .service(ActivateDemoSubscriptionRoute::<SqliteDatabase, StripeApi>::new());
        // `/orders/stats` registers ahead of `/orders/{id}` so the literal segment wins.
        app.service(health)
            .service(stripe_scope)
            .service(GuestCheckoutRoute::<SqliteDatabase>::new())
            .service(CreateOrderRoute::<SqliteDatabase>::new())
            .service(MyOrderStatsRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(CancelOrderRoute::<SqliteDatabase>::new())
            .service(UpdateOrderStatusRoute::<SqliteDatabase, SqliteDatabase>::new())
            .service(RestaurantOrdersRoute::<SqliteDatabase, SqliteDatabase>::new())
            .service(RestaurantOrderStatsRoute::<SqliteDatabase, SqliteDatabase>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
