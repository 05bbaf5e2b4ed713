//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Handlers are generic over the engine traits so endpoint tests can run them against mocks. Since actix-web cannot
//! handle generics in attribute-macro handlers, registration goes through the `route!` macro below, which generates
//! a unit struct per route implementing `HttpServiceFactory`.

use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use order_engine::{
    order_objects::OrderRequester,
    traits::{MarketplaceDatabase, MerchantManagement},
    MerchantApi,
    OrderFlowApi,
};

use crate::{
    auth::{JwtClaims, Role},
    data_objects::{CancelOrderRequest, CreateOrderRequest, GuestOrderRequest, OrderListParams, UpdateStatusRequest},
    errors::ServerError,
};

#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:tt),+ requires [$($roles:expr),+]) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>)
                    .wrap($crate::middleware::RequireRoles::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------  Checkout  ----------------------------------------------------
route!(create_order => Post "/orders" impl MarketplaceDatabase requires [Role::Customer]);
/// Authenticated checkout. The session subject becomes the owning user; the engine validates the payload and
/// persists the order, its item snapshots and the cart clear atomically.
pub async fn create_order<B: MarketplaceDatabase + 'static>(
    claims: JwtClaims,
    body: web::Json<CreateOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST create_order for user {}", claims.sub);
    let order = api.create_order(body.into_inner().into_new_order(claims.sub)).await?;
    Ok(HttpResponse::Created().json(order))
}

route!(guest_checkout => Post "/orders/guest" impl MarketplaceDatabase);
/// Guest checkout. No session required; the captured name/email identify the order instead of a user id.
pub async fn guest_checkout<B: MarketplaceDatabase + 'static>(
    body: web::Json<GuestOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ POST guest_checkout");
    let GuestOrderRequest { order, guest_name, guest_email } = body.into_inner();
    let guest = order_engine::db_types::GuestInfo { name: guest_name, email: guest_email };
    let order = api.create_order(order.into_guest_order(guest)).await?;
    Ok(HttpResponse::Created().json(order))
}

//----------------------------------------------   Listing  ----------------------------------------------------
route!(my_orders => Get "/orders" impl MarketplaceDatabase requires [Role::Customer]);
pub async fn my_orders<B: MarketplaceDatabase + 'static>(
    claims: JwtClaims,
    params: web::Query<OrderListParams>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_orders for user {}", claims.sub);
    let (pagination, filter) = params.into_inner().into_parts();
    let page = api.user_orders(claims.sub, pagination, filter).await?;
    Ok(HttpResponse::Ok().json(page))
}

route!(my_order_stats => Get "/orders/stats" impl MarketplaceDatabase requires [Role::Customer]);
pub async fn my_order_stats<B: MarketplaceDatabase + 'static>(
    claims: JwtClaims,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_order_stats for user {}", claims.sub);
    let stats = api.user_stats(claims.sub).await?;
    Ok(HttpResponse::Ok().json(stats))
}

route!(order_by_id => Get "/orders/{id}" impl MarketplaceDatabase);
/// Fetch one order. Any authenticated session may call this; the engine rejects reads of other users' orders unless
/// the session carries the owner role.
pub async fn order_by_id<B: MarketplaceDatabase + 'static>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET order {order_id} for subject {}", claims.sub);
    let requester = if claims.is_owner() {
        OrderRequester::owner(claims.sub)
    } else {
        OrderRequester::user(claims.sub)
    };
    let order = api.order_by_id(order_id, &requester).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Updates  ----------------------------------------------------
route!(cancel_order => Post "/orders/{id}/cancel" impl MarketplaceDatabase requires [Role::Customer]);
pub async fn cancel_order<B: MarketplaceDatabase + 'static>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<CancelOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ POST cancel order {order_id} for user {}", claims.sub);
    let order = api.cancel_order(order_id, claims.sub, body.reason.as_deref()).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(update_order_status => Post "/orders/{id}/status" impl MarketplaceDatabase, MerchantManagement requires [Role::Owner]);
/// Restaurant-side status update. When a restaurant id is supplied the session must own that restaurant, and the
/// engine additionally checks that the restaurant participates in the order.
pub async fn update_order_status<B, M>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<UpdateStatusRequest>,
    orders: web::Data<OrderFlowApi<B>>,
    merchants: web::Data<MerchantApi<M>>,
) -> Result<HttpResponse, ServerError>
where
    B: MarketplaceDatabase + 'static,
    M: MerchantManagement + 'static,
{
    let order_id = path.into_inner();
    let UpdateStatusRequest { status, restaurant_id } = body.into_inner();
    debug!("💻️ POST status {status} on order {order_id} by subject {}", claims.sub);
    if let Some(restaurant_id) = restaurant_id {
        if !claims.has_role(Role::Admin) && !merchants.restaurant_belongs_to(restaurant_id, claims.sub).await? {
            return Err(ServerError::InsufficientPermissions(format!(
                "restaurant {restaurant_id} does not belong to you"
            )));
        }
    }
    let order = orders.update_order_status(order_id, status, restaurant_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------  Dashboard ----------------------------------------------------
route!(restaurant_orders => Get "/restaurants/{id}/orders" impl MarketplaceDatabase, MerchantManagement requires [Role::Owner]);
pub async fn restaurant_orders<B, M>(
    claims: JwtClaims,
    path: web::Path<i64>,
    params: web::Query<OrderListParams>,
    orders: web::Data<OrderFlowApi<B>>,
    merchants: web::Data<MerchantApi<M>>,
) -> Result<HttpResponse, ServerError>
where
    B: MarketplaceDatabase + 'static,
    M: MerchantManagement + 'static,
{
    let restaurant_id = path.into_inner();
    debug!("💻️ GET orders for restaurant {restaurant_id} by subject {}", claims.sub);
    check_restaurant_ownership(&claims, restaurant_id, &merchants).await?;
    let (pagination, filter) = params.into_inner().into_parts();
    let page = orders.restaurant_orders(restaurant_id, pagination, filter).await?;
    Ok(HttpResponse::Ok().json(page))
}

route!(restaurant_order_stats => Get "/restaurants/{id}/orders/stats" impl MarketplaceDatabase, MerchantManagement requires [Role::Owner]);
pub async fn restaurant_order_stats<B, M>(
    claims: JwtClaims,
    path: web::Path<i64>,
    orders: web::Data<OrderFlowApi<B>>,
    merchants: web::Data<MerchantApi<M>>,
) -> Result<HttpResponse, ServerError>
where
    B: MarketplaceDatabase + 'static,
    M: MerchantManagement + 'static,
{
    let restaurant_id = path.into_inner();
    debug!("💻️ GET stats for restaurant {restaurant_id} by subject {}", claims.sub);
    check_restaurant_ownership(&claims, restaurant_id, &merchants).await?;
    let stats = orders.restaurant_stats(restaurant_id).await?;
    Ok(HttpResponse::Ok().json(stats))
}

pub async fn check_restaurant_ownership<M: MerchantManagement>(
    claims: &JwtClaims,
    restaurant_id: i64,
    merchants: &MerchantApi<M>,
) -> Result<(), ServerError> {
    if claims.has_role(Role::Admin) {
        return Ok(());
    }
    if merchants.restaurant_belongs_to(restaurant_id, claims.sub).await? {
        Ok(())
    } else {
        debug!("💻️ Subject {} does not own restaurant {restaurant_id}", claims.sub);
        Err(ServerError::InsufficientPermissions(format!("restaurant {restaurant_id} does not belong to you")))
    }
}
