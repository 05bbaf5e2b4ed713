use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use order_engine::{MerchantApiError, OrderFlowError};
use thiserror::Error;

use crate::integrations::stripe::PaymentGatewayApiError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Invalid input. {0}")]
    ValidationError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("{0}")]
    InvalidState(String),
    #[error("The restaurant must complete payment onboarding first")]
    OnboardingRequired,
    /// Processor failures are remapped to this generic message so vendor error shapes never reach clients. The
    /// detail has already been logged where the failure surfaced.
    #[error("The payment gateway could not process the request")]
    PaymentGatewayError,
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidState(_) => StatusCode::CONFLICT,
            Self::OnboardingRequired => StatusCode::CONFLICT,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::PaymentGatewayError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            Self::OnboardingRequired => {
                serde_json::json!({ "error": self.to_string(), "needs_onboarding": true })
            },
            _ => serde_json::json!({ "error": self.to_string() }),
        };
        HttpResponse::build(self.status_code()).insert_header(ContentType::json()).body(body.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No access token was provided.")]
    MissingToken,
    #[error("The access token is invalid. {0}")]
    InvalidToken(String),
    #[error("Could not issue an access token. {0}")]
    TokenIssueError(String),
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::ValidationError(m) => Self::ValidationError(m),
            OrderFlowError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderFlowError::Forbidden(m) => Self::InsufficientPermissions(m),
            OrderFlowError::CannotCancel { .. } => Self::InvalidState(e.to_string()),
            OrderFlowError::DatabaseError(m) => Self::BackendError(format!("Database error: {m}")),
        }
    }
}

impl From<MerchantApiError> for ServerError {
    fn from(e: MerchantApiError) -> Self {
        match e {
            MerchantApiError::RestaurantNotFound(_) | MerchantApiError::OwnerNotFound(_) | MerchantApiError::DishNotFound(_) => {
                Self::NoRecordFound(e.to_string())
            },
            MerchantApiError::DatabaseError(m) => Self::BackendError(format!("Database error: {m}")),
        }
    }
}

impl From<PaymentGatewayApiError> for ServerError {
    fn from(e: PaymentGatewayApiError) -> Self {
        match e {
            PaymentGatewayApiError::OnboardingRequired { .. } => Self::OnboardingRequired,
            PaymentGatewayApiError::RestaurantNotFound(_) | PaymentGatewayApiError::OwnerNotFound(_) => {
                Self::NoRecordFound(e.to_string())
            },
            PaymentGatewayApiError::GatewayError(inner) => {
                error!("💳️ Payment gateway failure: {inner}");
                Self::PaymentGatewayError
            },
            PaymentGatewayApiError::DatabaseError(m) => Self::BackendError(format!("Database error: {m}")),
        }
    }
}
