//! Session token handling.
//!
//! Plateway does not mint sessions itself; the identity service does, signing a JWT with the shared `PWY_JWT_SECRET`
//! (HS256). This module verifies those tokens, exposes the claims to handlers via an extractor, and provides a
//! [`TokenIssuer`] for operational tooling and tests.

use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header::AUTHORIZATION, web, FromRequest, HttpMessage, HttpRequest};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Owner,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The authenticated user id: a customer id for customer sessions, a restaurant-owner id for owner sessions.
    pub sub: i64,
    pub roles: Vec<Role>,
    pub exp: i64,
}

impl JwtClaims {
    pub fn new(sub: i64, roles: Vec<Role>, expires_at: chrono::DateTime<Utc>) -> Self {
        Self { sub, roles, exp: expires_at.timestamp() }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Owner-or-better. Admins can do everything an owner can.
    pub fn is_owner(&self) -> bool {
        self.has_role(Role::Owner) || self.has_role(Role::Admin)
    }
}

/// Pulls the bearer token out of the request and verifies it. The ACL middleware caches verified claims in the
/// request extensions, so a request only pays for one signature check however many extractions happen.
pub fn verify_bearer(req: &HttpRequest) -> Result<JwtClaims, ServerError> {
    if let Some(claims) = req.extensions().get::<JwtClaims>() {
        return Ok(claims.clone());
    }
    let verifier = req
        .app_data::<web::Data<TokenVerifier>>()
        .ok_or_else(|| ServerError::InitializeError("No token verifier in app data".to_string()))?;
    let header = req.headers().get(AUTHORIZATION).ok_or(AuthError::MissingToken)?;
    let token = header
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| AuthError::InvalidToken("The Authorization header is not a bearer token".to_string()))?;
    let claims = verifier.verify(token)?;
    Ok(claims)
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(verify_bearer(req))
    }
}

//-------------------------------------------  TokenVerifier  ---------------------------------------------------------
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let key = DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        let validation = Validation::new(Algorithm::HS256);
        Self { key, validation }
    }

    pub fn verify(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let data = decode::<JwtClaims>(token, &self.key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        Ok(data.claims)
    }
}

//-------------------------------------------   TokenIssuer   ---------------------------------------------------------
pub struct TokenIssuer {
    key: EncodingKey,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let key = EncodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        Self { key }
    }

    /// Issue a signed access token for the given subject. The caller has already established who the subject is;
    /// this method only does the signing.
    pub fn issue_token(&self, sub: i64, roles: Vec<Role>, validity: Option<Duration>) -> Result<String, AuthError> {
        let validity = validity.unwrap_or_else(|| Duration::hours(24));
        let claims = JwtClaims::new(sub, roles, Utc::now() + validity);
        encode(&Header::new(Algorithm::HS256), &claims, &self.key).map_err(|e| AuthError::TokenIssueError(e.to_string()))
    }
}

#[cfg(test)]
mod test {
    use chrono::Duration;
    use pwy_common::Secret;

    use super::{Role, TokenIssuer, TokenVerifier};
    use crate::config::AuthConfig;

    fn config() -> AuthConfig {
        AuthConfig { jwt_secret: Secret::new("test-secret-do-not-reuse".to_string()) }
    }

    #[test]
    fn issued_tokens_verify() {
        let issuer = TokenIssuer::new(&config());
        let token = issuer.issue_token(42, vec![Role::Customer], None).unwrap();
        let claims = TokenVerifier::new(&config()).verify(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert!(claims.has_role(Role::Customer));
        assert!(!claims.is_owner());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let issuer = TokenIssuer::new(&config());
        let token = issuer.issue_token(42, vec![Role::Owner], Some(Duration::hours(-2))).unwrap();
        assert!(TokenVerifier::new(&config()).verify(&token).is_err());
    }

    #[test]
    fn tampered_tokens_are_rejected() {
        let issuer = TokenIssuer::new(&config());
        let mut token = issuer.issue_token(42, vec![Role::Owner], None).unwrap();
        token.replace_range(token.len() - 6.., "aaaaaa");
        assert!(TokenVerifier::new(&config()).verify(&token).is_err());
    }
}
