mod cents;
mod secret;

pub use cents::{Cents, CentsConversionError, CURRENCY_CODE};
pub use secret::Secret;
