//! The gateway registry.
//!
//! Built once at startup from the set of enabled [`ProviderConfig`]s and immutable thereafter. Every lookup the
//! orchestrator performs (explicit method, region default, currency filter) goes through this registry, so adding
//! a gateway to a deployment is purely a configuration change.

use std::{collections::BTreeMap, sync::Arc};

use log::*;

use crate::{
    db_types::{PaymentMethod, Region},
    providers::{JkoPayClient, ProviderClient, ProviderConfig, ProviderError},
};

/// Fallback method per region, used when a caller asks for "whatever is usual here" rather than naming a method.
/// A region absent from this table has no default; callers must then name a method explicitly.
const REGION_DEFAULT_METHODS: [(&str, &str); 1] = [("TW", "jkopay")];

/// Immutable lookup table from (region, method) to a live provider client.
pub struct GatewayRegistry {
    clients: BTreeMap<(Region, PaymentMethod), Arc<dyn ProviderClient>>,
}

impl GatewayRegistry {
    /// Builds the registry from provider configuration. Disabled entries are skipped silently; entries naming a
    /// method no integration exists for are skipped with a warning, so one bad config line cannot keep the rest of
    /// the gateway fleet from starting.
    pub fn build(configs: Vec<ProviderConfig>) -> Result<Self, ProviderError> {
        let mut clients: BTreeMap<(Region, PaymentMethod), Arc<dyn ProviderClient>> = BTreeMap::new();
        for config in configs {
            if !config.enabled {
                debug!("🗂️ Provider {}/{} is disabled. Skipping.", config.region, config.method);
                continue;
            }
            let key = (config.region.clone(), config.method.clone());
            let client: Arc<dyn ProviderClient> = match config.method.as_str() {
                "jkopay" => Arc::new(JkoPayClient::new(config)?),
                other => {
                    warn!("🗂️ No integration exists for payment method '{other}'. Skipping this provider entry.");
                    continue;
                },
            };
            if clients.insert(key.clone(), client).is_some() {
                warn!("🗂️ Duplicate provider entry for {}/{}. The last one wins.", key.0, key.1);
            }
        }
        info!("🗂️ Gateway registry built with {} active provider(s).", clients.len());
        Ok(Self { clients })
    }

    pub fn lookup(&self, region: &Region, method: &PaymentMethod) -> Option<Arc<dyn ProviderClient>> {
        self.clients.get(&(region.clone(), method.clone())).cloned()
    }

    /// The methods available in a region, in deterministic (lexicographic) order.
    pub fn available_methods(&self, region: &Region) -> Vec<PaymentMethod> {
        self.clients.keys().filter(|(r, _)| r == region).map(|(_, m)| m.clone()).collect()
    }

    /// The currencies one specific provider accepts, deduplicated, uppercase. Empty when no such provider is
    /// registered.
    pub fn supported_currencies(&self, region: &Region, method: &PaymentMethod) -> Vec<String> {
        let mut currencies = self
            .lookup(region, method)
            .map(|client| client.supported_currencies().iter().map(|c| c.to_uppercase()).collect::<Vec<_>>())
            .unwrap_or_default();
        currencies.sort();
        currencies.dedup();
        currencies
    }

    /// All currencies accepted by any provider in the given region, deduplicated, uppercase.
    pub fn region_currencies(&self, region: &Region) -> Vec<String> {
        let mut currencies = self
            .clients
            .iter()
            .filter(|((r, _), _)| r == region)
            .flat_map(|(_, client)| client.supported_currencies().iter().map(|c| c.to_uppercase()))
            .collect::<Vec<_>>();
        currencies.sort();
        currencies.dedup();
        currencies
    }

    /// The method to use for a region when the caller does not name one: the region's configured default if that
    /// provider is actually registered, otherwise the first registered method for the region.
    pub fn default_method(&self, region: &Region) -> Option<PaymentMethod> {
        let preferred = REGION_DEFAULT_METHODS
            .iter()
            .find(|(r, _)| Region::new(r) == *region)
            .map(|(_, m)| PaymentMethod::new(m));
        if let Some(method) = preferred {
            if self.clients.contains_key(&(region.clone(), method.clone())) {
                return Some(method);
            }
        }
        self.available_methods(region).into_iter().next()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }
}
