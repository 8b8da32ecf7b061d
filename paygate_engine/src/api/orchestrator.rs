use std::{str::FromStr, sync::Arc};

use log::*;
use pg_common::Money;
use serde::Serialize;

use crate::{
    api::GatewayError,
    db_types::{NewOrder, NewPayment, Order, OrderId, PaymentMethod, Region},
    helpers::{extract_link_id, new_order_reference},
    providers::{CallbackNotification, CreatePaymentRequest, CreatePaymentResult, CustomerInfo},
    registry::GatewayRegistry,
    traits::{PaymentStore, SettlementResult},
};

//--------------------------------------   SignaturePolicy   ---------------------------------------------------------
/// What to do with a callback whose signature does not verify.
///
/// `Reject` is the default and the only safe production setting. `AcceptUnverified` exists for sandbox gateways
/// with broken signing; settlements accepted under it are stored with `verified = false` so they stand out in
/// reconciliation and manual review.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignaturePolicy {
    #[default]
    Reject,
    AcceptUnverified,
}

impl FromStr for SignaturePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "accept_unverified" => Ok(Self::AcceptUnverified),
            s => Err(format!("Invalid signature policy: {s}")),
        }
    }
}

//--------------------------------------   CallbackOutcome   ---------------------------------------------------------
/// What a processed callback did. Returned to the HTTP layer for logging; the gateway itself only ever sees an
/// acknowledgement.
#[derive(Debug, Clone, Serialize)]
pub struct CallbackOutcome {
    pub success: bool,
    pub order_id: OrderId,
    pub payment_id: i64,
    pub amount: Money,
    pub provider_tx_id: String,
    /// False when this was a re-delivery of a callback that had already been applied.
    pub newly_applied: bool,
}

//--------------------------------------  PaymentOrchestrator  -------------------------------------------------------
/// Drives the payment lifecycle end to end: provider resolution, outbound payment creation, and the callback state
/// machine. Generic over the storage backend; owns no gateway-specific logic.
pub struct PaymentOrchestrator<B> {
    db: B,
    registry: Arc<GatewayRegistry>,
    signature_policy: SignaturePolicy,
}

impl<B: Clone> Clone for PaymentOrchestrator<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), registry: Arc::clone(&self.registry), signature_policy: self.signature_policy }
    }
}

impl<B> PaymentOrchestrator<B>
where B: PaymentStore
{
    pub fn new(db: B, registry: Arc<GatewayRegistry>, signature_policy: SignaturePolicy) -> Self {
        Self { db, registry, signature_policy }
    }

    pub fn registry(&self) -> &GatewayRegistry {
        &self.registry
    }

    pub fn signature_policy(&self) -> SignaturePolicy {
        self.signature_policy
    }

    /// The payment methods a buyer in `region` can pick from.
    pub fn available_methods(&self, region: &Region) -> Vec<PaymentMethod> {
        self.registry.available_methods(region)
    }

    /// Starts a payment attempt against an active payment link.
    ///
    /// Creates the pending order first and only then calls out to the gateway, so that a callback racing the
    /// response always finds its order. The returned [`CreatePaymentResult`] carries the gateway's verdict
    /// (including rejections) rather than mapping rejections to errors.
    pub async fn create_payment(
        &self,
        region: &Region,
        method: Option<PaymentMethod>,
        link_id: &crate::db_types::LinkId,
        customer: CustomerInfo,
    ) -> Result<(Order, CreatePaymentResult), GatewayError> {
        let method = match method {
            Some(m) => m,
            None => self.registry.default_method(region).ok_or(GatewayError::NoDefaultMethod(region.clone()))?,
        };
        let client = self
            .registry
            .lookup(region, &method)
            .ok_or_else(|| GatewayError::NoProviderAvailable { region: region.clone(), method: method.clone() })?;
        let link = self
            .db
            .fetch_payment_link(link_id)
            .await?
            .ok_or_else(|| GatewayError::PaymentLinkNotFound(link_id.clone()))?;
        if link.status != crate::db_types::LinkStatus::Active || link.is_exhausted() {
            return Err(GatewayError::PaymentLinkExhausted(link.id));
        }
        if !client.supported_currencies().iter().any(|c| c.eq_ignore_ascii_case(&link.currency)) {
            return Err(GatewayError::UnsupportedCurrency {
                currency: link.currency.clone(),
                region: region.clone(),
                method,
            });
        }
        let order_id = new_order_reference(&link.id);
        let mut new_order = NewOrder::new(order_id, link.user_id, link.amount, &link.currency).for_link(&link);
        new_order.method = Some(method.clone());
        let order = self.db.insert_order(new_order).await?;
        info!("💳️ Created pending order {} for link {} via {}/{}", order.id, link.id, region, method);
        let request = CreatePaymentRequest {
            order_reference: order.id.clone(),
            amount: order.amount,
            currency: order.currency.clone(),
            description: link.description.clone(),
            customer,
            items: Vec::new(),
        };
        let result = client.create_payment(&request).await?;
        if result.success {
            debug!("💳️ Gateway accepted order {} ({} {})", order.id, order.amount, order.currency);
        } else {
            warn!("💳️ Gateway declined order {}: {} ({})", order.id, result.resp_code, result.resp_msg);
        }
        Ok((order, result))
    }

    /// Runs the callback state machine for one provider notification.
    ///
    /// Signature verification happens before anything is read from storage. Acceptance codes settle the order;
    /// everything else records a failed attempt and cancels it. Both paths are idempotent under re-delivery.
    pub async fn handle_callback(
        &self,
        region: &Region,
        method: &PaymentMethod,
        callback: CallbackNotification,
    ) -> Result<CallbackOutcome, GatewayError> {
        let client = self
            .registry
            .lookup(region, method)
            .ok_or_else(|| GatewayError::NoProviderAvailable { region: region.clone(), method: method.clone() })?;
        let verified = client.verify_callback(&callback);
        if !verified {
            match self.signature_policy {
                SignaturePolicy::Reject => {
                    warn!("🚨️ Rejecting callback for order {}: signature mismatch", callback.order_no);
                    return Err(GatewayError::SignatureMismatch);
                },
                SignaturePolicy::AcceptUnverified => {
                    warn!(
                        "🚨️ Accepting UNVERIFIED callback for order {}. The payment will be flagged for review.",
                        callback.order_no
                    );
                },
            }
        }
        let order_id = OrderId(callback.order_no.clone());
        // Malformed references are rejected before any storage round trip, and the originating link must still
        // exist: settling an order against a vanished link would skip the link's own state transition.
        let link_id = extract_link_id(order_id.as_str())?;
        let link = self
            .db
            .fetch_payment_link(&link_id)
            .await?
            .ok_or_else(|| GatewayError::PaymentLinkNotFound(link_id.clone()))?;
        let order = self.db.fetch_order(&order_id).await?.ok_or_else(|| GatewayError::OrderNotFound(order_id.clone()))?;
        let amount = client.parse_callback_amount(&callback.amount)?;
        if amount != order.amount {
            warn!(
                "💰️ Callback for order {} reports {} {} but the order is for {} {}. Recording the gateway's figure.",
                order.id, amount, callback.currency_code, order.amount, order.currency
            );
        }
        let success = client.is_acceptance_code(&callback.resp_code);
        let payment = NewPayment {
            order_id: order.id.clone(),
            amount,
            method: method.clone(),
            provider_tx_id: callback.tx_id.clone(),
            currency: callback.currency_code.clone(),
            resp_code: Some(callback.resp_code.clone()),
            resp_msg: Some(callback.resp_msg.clone()),
            verified,
        };
        let result = if success {
            self.db.settle_order_payment(payment).await?
        } else {
            self.db.record_failed_payment(payment).await?
        };
        let outcome = match result {
            SettlementResult::Applied(settled) => {
                if success {
                    info!("✅️ Order {} settled by {} (link {})", settled.order.id, callback.tx_id, link.id);
                } else {
                    info!(
                        "❌️ Order {} cancelled. Gateway said {} ({})",
                        settled.order.id, callback.resp_code, callback.resp_msg
                    );
                }
                CallbackOutcome {
                    success,
                    order_id: settled.order.id.clone(),
                    payment_id: settled.payment.id,
                    amount: settled.payment.amount,
                    provider_tx_id: settled.payment.provider_tx_id.clone(),
                    newly_applied: true,
                }
            },
            SettlementResult::AlreadyProcessed(existing) => {
                debug!("🔁️ Callback for order {} / tx {} was already processed. No-op.", order.id, callback.tx_id);
                CallbackOutcome {
                    success,
                    order_id: existing.order_id.clone(),
                    payment_id: existing.id,
                    amount: existing.amount,
                    provider_tx_id: existing.provider_tx_id.clone(),
                    newly_applied: false,
                }
            },
        };
        Ok(outcome)
    }

    /// Verifies a callback signature without applying it. Used by diagnostic tooling.
    pub fn verify_callback(
        &self,
        region: &Region,
        method: &PaymentMethod,
        callback: &CallbackNotification,
    ) -> Result<bool, GatewayError> {
        let client = self
            .registry
            .lookup(region, method)
            .ok_or_else(|| GatewayError::NoProviderAvailable { region: region.clone(), method: method.clone() })?;
        Ok(client.verify_callback(callback))
    }
}
