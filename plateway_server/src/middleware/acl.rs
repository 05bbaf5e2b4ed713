//! Access control middleware for the Plateway server.
//! This middleware can be placed on any route or service.
//!
//! It verifies the bearer token on the incoming request and then checks the claims in the token against the
//! required roles for the route. If the token is valid and the subject has every required role, the request
//! continues and the verified claims are cached in the request extensions for the handler's extractor. Otherwise a
//! 401 (no valid token) or 403 (missing role) response is returned.

use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
    HttpMessage,
};
use futures::{
    future::{ok, Ready},
    Future,
};

use crate::{
    auth::{verify_bearer, Role},
    errors::ServerError,
};

pub struct RequireRoles {
    required_roles: Vec<Role>,
}

impl RequireRoles {
    pub fn new(required_roles: &[Role]) -> Self {
        RequireRoles { required_roles: required_roles.to_vec() }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRoles
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequireRolesService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RequireRolesService { required_roles: self.required_roles.clone(), service: Rc::new(service) })
    }
}

pub struct RequireRolesService<S> {
    required_roles: Vec<Role>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireRolesService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let required_roles = self.required_roles.clone();
        Box::pin(async move {
            let claims = verify_bearer(req.request()).map_err(Error::from)?;
            if required_roles.iter().all(|role| claims.has_role(*role)) {
                req.extensions_mut().insert(claims);
                service.call(req).await
            } else {
                log::debug!("🔐️ Subject {} lacks required roles {required_roles:?}", claims.sub);
                Err(ServerError::InsufficientPermissions("Insufficient permissions".to_string()).into())
            }
        })
    }
}
