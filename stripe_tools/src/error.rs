use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum StripeApiError {
    #[error("Could not initialize the payment gateway client. {0}")]
    Initialization(String),
    #[error("Error sending request to the payment gateway. {0}")]
    RequestError(String),
    #[error("The payment gateway returned an error. Code: {status}, Message: {message}")]
    QueryError { status: u16, message: String },
    #[error("Could not deserialize the payment gateway response. {0}")]
    JsonError(String),
}
