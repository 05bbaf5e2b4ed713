use std::env;

use log::*;
use pwy_common::Secret;

const DEFAULT_API_BASE: &str = "https://api.stripe.com";

/// Configuration for the payment processor client.
///
/// An empty secret key is not an error: it puts the whole payment stack into demo mode, where every operation
/// returns a non-fatal development response instead of touching the processor.
#[derive(Clone, Debug, Default)]
pub struct StripeConfig {
    pub secret_key: Secret<String>,
    /// The recurring price used for restaurant-owner subscription checkouts.
    pub monthly_price_id: String,
    /// Override for the API host. Only used in tests.
    pub api_base: String,
}

impl StripeConfig {
    pub fn new_from_env_or_default() -> Self {
        let secret_key = env::var("STRIPE_SECRET_KEY").ok().unwrap_or_else(|| {
            warn!(
                "🔌️ STRIPE_SECRET_KEY is not set. Payment operations will run in demo mode and no live payments \
                 will be processed."
            );
            String::default()
        });
        let monthly_price_id = env::var("STRIPE_MONTHLY_PRICE_ID").ok().unwrap_or_else(|| {
            info!("🔌️ STRIPE_MONTHLY_PRICE_ID is not set. Subscription checkouts will fail until it is configured.");
            String::default()
        });
        let api_base = env::var("STRIPE_API_BASE").ok().unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        Self { secret_key: Secret::new(secret_key), monthly_price_id, api_base }
    }

    /// Whether a live processor is configured. The discriminator for demo mode.
    pub fn is_configured(&self) -> bool {
        !self.secret_key.reveal().is_empty()
    }
}

#[cfg(test)]
mod test {
    use pwy_common::Secret;

    use super::StripeConfig;

    #[test]
    fn unconfigured_means_demo_mode() {
        let config = StripeConfig::default();
        assert!(!config.is_configured());
        let config = StripeConfig { secret_key: Secret::new("sk_test_123".into()), ..Default::default() };
        assert!(config.is_configured());
    }

    #[test]
    fn secrets_do_not_leak_via_debug() {
        let config = StripeConfig { secret_key: Secret::new("sk_live_supersecret".into()), ..Default::default() };
        let dump = format!("{config:?}");
        assert!(!dump.contains("supersecret"));
    }
}
