//! Server configuration.
//!
//! Everything is read from environment variables with the `PGW_` prefix. Missing or malformed values log a
//! complaint and fall back to a sane default rather than aborting startup; the exceptions are provider secrets,
//! which have no sane default and leave the provider disabled when absent.

use std::{env, time::Duration};

use log::*;
use paygate_engine::{
    db_types::{PaymentMethod, Region},
    providers::{ProviderConfig, DEFAULT_PROVIDER_TIMEOUT},
    SignaturePolicy,
    DEFAULT_PLATFORM_FEE_PERCENT,
};
use pg_common::{parse_boolean_flag, Secret};

const DEFAULT_PGW_HOST: &str = "127.0.0.1";
const DEFAULT_PGW_PORT: u16 = 8380;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// What to do with callbacks whose signature does not verify. `Reject` unless explicitly overridden.
    pub signature_policy: SignaturePolicy,
    /// The platform fee percentage applied in the financial totals report.
    pub platform_fee_percent: f64,
    pub providers: Vec<ProviderConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_PGW_HOST.to_string(),
            port: DEFAULT_PGW_PORT,
            database_url: String::default(),
            signature_policy: SignaturePolicy::default(),
            platform_fee_percent: DEFAULT_PLATFORM_FEE_PERCENT,
            providers: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("PGW_HOST").ok().unwrap_or_else(|| DEFAULT_PGW_HOST.into());
        let port = env::var("PGW_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for PGW_PORT. {e} Using the default, {DEFAULT_PGW_PORT}, \
                         instead."
                    );
                    DEFAULT_PGW_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_PGW_PORT);
        let database_url = env::var("PGW_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ PGW_DATABASE_URL is not set. Please set it to the URL for the PayGate database.");
            String::default()
        });
        let signature_policy = env::var("PGW_SIGNATURE_POLICY")
            .ok()
            .map(|s| {
                s.parse::<SignaturePolicy>().unwrap_or_else(|e| {
                    warn!("🪛️ {e}. Falling back to rejecting unverified callbacks.");
                    SignaturePolicy::Reject
                })
            })
            .unwrap_or_default();
        if signature_policy == SignaturePolicy::AcceptUnverified {
            warn!("🚨️ PGW_SIGNATURE_POLICY is set to accept_unverified. Do NOT use this setting in production.");
        }
        let platform_fee_percent = env::var("PGW_PLATFORM_FEE_PERCENT")
            .ok()
            .map(|s| {
                s.parse::<f64>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid percentage for PGW_PLATFORM_FEE_PERCENT. {e} Using \
                         {DEFAULT_PLATFORM_FEE_PERCENT}% instead."
                    );
                    DEFAULT_PLATFORM_FEE_PERCENT
                })
            })
            .unwrap_or(DEFAULT_PLATFORM_FEE_PERCENT);
        let providers = vec![jkopay_config_from_env()];
        Self { host, port, database_url, signature_policy, platform_fee_percent, providers }
    }
}

/// Reads the JkoPay provider block (`PGW_JKOPAY_*`). The provider stays disabled unless `PGW_JKOPAY_ENABLED` is
/// truthy and a shared secret is present.
fn jkopay_config_from_env() -> ProviderConfig {
    let region = Region::new(env::var("PGW_JKOPAY_REGION").ok().unwrap_or_else(|| "TW".into()));
    let mut config = ProviderConfig::new(PaymentMethod::new("jkopay"), region);
    config.enabled = parse_boolean_flag(env::var("PGW_JKOPAY_ENABLED").ok(), false);
    config.currencies = env::var("PGW_JKOPAY_CURRENCIES")
        .ok()
        .unwrap_or_else(|| "TWD".into())
        .split(',')
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .collect();
    config.merchant_id = env::var("PGW_JKOPAY_MERCHANT_ID").ok().unwrap_or_default();
    config.terminal_id = env::var("PGW_JKOPAY_TERMINAL_ID").ok().unwrap_or_default();
    match env::var("PGW_JKOPAY_SECRET") {
        Ok(secret) => config.secret = Secret::new(secret),
        Err(_) => {
            if config.enabled {
                error!("🪛️ PGW_JKOPAY_SECRET is not set. The JkoPay provider will be disabled.");
                config.enabled = false;
            }
        },
    }
    config.create_url = env::var("PGW_JKOPAY_CREATE_URL").ok().unwrap_or_default();
    config.return_url = env::var("PGW_JKOPAY_RETURN_URL").ok().unwrap_or_default();
    config.notify_url = env::var("PGW_JKOPAY_NOTIFY_URL").ok().unwrap_or_default();
    config.timeout = env::var("PGW_JKOPAY_TIMEOUT")
        .ok()
        .and_then(|s| {
            s.parse::<u64>()
                .map_err(|e| {
                    error!("🪛️ {s} is not a valid timeout (in seconds) for PGW_JKOPAY_TIMEOUT. {e}");
                })
                .ok()
        })
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_PROVIDER_TIMEOUT);
    config
}
