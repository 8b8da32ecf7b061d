//! Provider clients.
//!
//! A provider client knows how to talk to one specific payment gateway for one (method, region) pair: how to build
//! and sign an outbound creation request, how to verify an inbound callback, which response codes count as
//! acceptance, and which unit convention amounts use on the wire. Everything above this module is
//! provider-agnostic.

pub mod config;
pub mod data_objects;
mod error;
pub mod jkopay;

use async_trait::async_trait;
use pg_common::Money;

pub use config::{ProviderCapabilities, ProviderConfig, DEFAULT_PROVIDER_TIMEOUT};
pub use data_objects::{
    CallbackNotification,
    CreatePaymentRequest,
    CreatePaymentResult,
    CustomerInfo,
    OrderItem,
    RefundResult,
    StatusResult,
};
pub use error::ProviderError;
pub use jkopay::JkoPayClient;

use crate::db_types::{PaymentMethod, Region};

/// The capability-set interface implemented by every gateway integration.
///
/// Transport and protocol failures are returned as typed [`ProviderError`]s, never raised as panics, so the
/// orchestrator's control flow stays total. Optional capabilities (refunds, status queries) default to a typed
/// `Unsupported` result rather than an error.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    fn method(&self) -> &PaymentMethod;

    fn region(&self) -> &Region;

    fn supported_currencies(&self) -> &[String];

    fn capabilities(&self) -> &ProviderCapabilities;

    /// Builds the full signed field set for this gateway and performs the outbound call.
    async fn create_payment(&self, request: &CreatePaymentRequest) -> Result<CreatePaymentResult, ProviderError>;

    /// Verifies the callback signature using the gateway's callback-specific field order.
    fn verify_callback(&self, callback: &CallbackNotification) -> bool;

    /// Whether the given response code is in this gateway's acceptance set. Gateways routinely have several codes
    /// meaning "success" or "pending-redirect"; the set is enumerated explicitly per provider, never inferred.
    fn is_acceptance_code(&self, resp_code: &str) -> bool;

    /// Parses an on-the-wire amount using this gateway's unit convention (integer minor or major units).
    fn parse_callback_amount(&self, raw: &str) -> Result<Money, ProviderError>;

    async fn refund(&self, provider_tx_id: &str, amount: Money, reason: &str) -> Result<RefundResult, ProviderError> {
        let _ = (provider_tx_id, amount, reason);
        Ok(RefundResult::Unsupported)
    }

    async fn query_status(&self, provider_tx_id: &str) -> Result<StatusResult, ProviderError> {
        let _ = provider_tx_id;
        Ok(StatusResult::Unsupported)
    }
}
