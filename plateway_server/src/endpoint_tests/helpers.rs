use actix_web::{
    body::{to_bytes, MessageBody},
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use pwy_common::Secret;

use crate::{
    auth::{Role, TokenIssuer, TokenVerifier},
    config::AuthConfig,
};

// Creates a test `AuthConfig` for issuing tokens. DO NOT re-use this secret anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig { jwt_secret: Secret::new("endpoint-test-secret-0123456789abcdef".to_string()) }
}

pub fn issue_token(sub: i64, roles: Vec<Role>) -> String {
    TokenIssuer::new(&get_auth_config()).issue_token(sub, roles, None).expect("Failed to sign token")
}

/// Runs one request against an app configured by `configure`. Handler and middleware errors come back the same way
/// as success responses: as the (status, body) pair a client would see.
async fn call(req: TestRequest, configure: impl FnOnce(&mut ServiceConfig)) -> (StatusCode, String) {
    let verifier = TokenVerifier::new(&get_auth_config());
    let app = App::new().app_data(web::Data::new(verifier)).configure(configure);
    let service = test::init_service(app).await;
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
            (status, body)
        },
        Err(e) => {
            let res = e.error_response();
            let status = res.status();
            let body = to_bytes(res.into_body()).await.unwrap();
            (status, String::from_utf8_lossy(&body).into_owned())
        },
    }
}

pub async fn get_request(
    auth_header: &str,
    path: &str,
    configure: impl FnOnce(&mut ServiceConfig),
) -> (StatusCode, String) {
    let mut req = TestRequest::get().uri(path);
    if !auth_header.is_empty() {
        req = req.insert_header(("Authorization", format!("Bearer {auth_header}")));
    }
    call(req, configure).await
}

pub async fn post_request(
    auth_header: &str,
    path: &str,
    body: serde_json::Value,
    configure: impl FnOnce(&mut ServiceConfig),
) -> (StatusCode, String) {
    let mut req = TestRequest::post().uri(path).set_json(body);
    if !auth_header.is_empty() {
        req = req.insert_header(("Authorization", format!("Bearer {auth_header}")));
    }
    call(req, configure).await
}
