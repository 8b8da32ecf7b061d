use std::time::Duration;

use pg_common::Secret;
use serde::{Deserialize, Serialize};

use crate::db_types::{PaymentMethod, Region};

pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Static per-provider descriptor. One `ProviderConfig` describes one gateway integration for one
/// (method, region) pair; the set of enabled configs is what the [`crate::registry::GatewayRegistry`] is built
/// from at startup.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub method: PaymentMethod,
    pub region: Region,
    pub currencies: Vec<String>,
    pub enabled: bool,
    pub merchant_id: String,
    pub terminal_id: String,
    pub secret: Secret<String>,
    pub create_url: String,
    pub return_url: String,
    pub notify_url: String,
    pub capabilities: ProviderCapabilities,
    /// Applied to every outbound call. A timeout is a transport failure, never an indefinitely pending request.
    pub timeout: Duration,
}

impl ProviderConfig {
    pub fn new(method: PaymentMethod, region: Region) -> Self {
        Self {
            method,
            region,
            currencies: Vec::new(),
            enabled: false,
            merchant_id: String::default(),
            terminal_id: String::default(),
            secret: Secret::default(),
            create_url: String::default(),
            return_url: String::default(),
            notify_url: String::default(),
            capabilities: ProviderCapabilities::default(),
            timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    pub fn supports_currency(&self, currency: &str) -> bool {
        self.currencies.iter().any(|c| c.eq_ignore_ascii_case(currency))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProviderCapabilities {
    pub refunds: bool,
    pub partial_refunds: bool,
    pub webhooks: bool,
    pub three_ds: bool,
}

impl Default for ProviderCapabilities {
    fn default() -> Self {
        Self { refunds: false, partial_refunds: false, webhooks: true, three_ds: false }
    }
}
