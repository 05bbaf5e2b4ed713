use std::env;

use log::*;
use pwy_common::Secret;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use stripe_tools::StripeConfig;

use crate::errors::ServerError;

const DEFAULT_PWY_HOST: &str = "127.0.0.1";
const DEFAULT_PWY_PORT: u16 = 8410;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// Payment processor settings. Left unconfigured, the payment routes serve demo-mode responses.
    pub stripe: StripeConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_PWY_HOST.to_string(),
            port: DEFAULT_PWY_PORT,
            database_url: String::default(),
            auth: AuthConfig::default(),
            stripe: StripeConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("PWY_HOST").ok().unwrap_or_else(|| DEFAULT_PWY_HOST.into());
        let port = env::var("PWY_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for PWY_PORT. {e} Using the default, {DEFAULT_PWY_PORT}, instead."
                    );
                    DEFAULT_PWY_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_PWY_PORT);
        let database_url = env::var("PWY_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ PWY_DATABASE_URL is not set. Please set it to the URL for the marketplace database.");
            String::default()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to \
                 the default configuration."
            );
            AuthConfig::default()
        });
        let stripe = StripeConfig::new_from_env_or_default();
        Self { host, port, database_url, auth, stripe }
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HS256 secret shared with the identity service that mints session tokens.
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. Tokens minted by \
             the identity service will NOT verify, and every session dies with this process. Set PWY_JWT_SECRET on \
             production instances. 🚨️🚨️🚨️"
        );
        let secret: String = thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect();
        Self { jwt_secret: Secret::new(secret) }
    }
}

impl AuthConfig {
    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("PWY_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [PWY_JWT_SECRET]")))?;
        if secret.len() < 32 {
            return Err(ServerError::ConfigurationError(
                "PWY_JWT_SECRET must be at least 32 characters long".to_string(),
            ));
        }
        Ok(Self { jwt_secret: Secret::new(secret) })
    }
}
