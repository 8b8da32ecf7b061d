//! JkoPay client (Taiwan mobile-wallet gateway, method `jkopay`, region `TW`).
//!
//! The field orders and acceptance codes in this module are part of JkoPay's wire contract. They are fixed by the
//! gateway, not by us: reordering a field or dropping a code breaks interoperability with the production gateway
//! even though every unit test here would still pass. Treat the constants below the way you would treat a wire
//! format version.

use std::sync::Arc;

use async_trait::async_trait;
use log::*;
use pg_common::Money;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    db_types::{PaymentMethod, Region},
    helpers::{sign_fields, verify_fields},
    providers::{
        CallbackNotification,
        CreatePaymentRequest,
        CreatePaymentResult,
        ProviderCapabilities,
        ProviderClient,
        ProviderConfig,
        ProviderError,
    },
};

/// Signing order for outbound create-payment requests.
const CREATE_SIGN_ORDER: [&str; 7] =
    ["MerchantID", "TerminalID", "OrderNo", "Amount", "CurrencyCode", "ReturnURL", "NotifyURL"];

/// Signing order for inbound callbacks. Deliberately different from [`CREATE_SIGN_ORDER`]; the direction of the
/// message is part of the canonical string.
const CALLBACK_SIGN_ORDER: [&str; 7] =
    ["MerchantID", "TerminalID", "OrderNo", "TxID", "RespCode", "Amount", "CurrencyCode"];

/// Response codes JkoPay documents as acceptance: `000` approved, `0000` approved via the legacy gateway,
/// `0001` accepted and pending buyer redirect.
const ACCEPTANCE_CODES: [&str; 3] = ["000", "0000", "0001"];

/// JkoPay amounts are integer major units; TWD has no minor units on this wire.
fn wire_amount(amount: Money) -> String {
    amount.to_major_units().to_string()
}

pub struct JkoPayClient {
    config: ProviderConfig,
    client: Arc<Client>,
}

impl JkoPayClient {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    /// The signed field set for a create-payment request, in [`CREATE_SIGN_ORDER`].
    fn create_sign_fields(&self, request: &CreatePaymentRequest) -> Vec<(&'static str, String)> {
        vec![
            ("MerchantID", self.config.merchant_id.clone()),
            ("TerminalID", self.config.terminal_id.clone()),
            ("OrderNo", request.order_reference.as_str().to_string()),
            ("Amount", wire_amount(request.amount)),
            ("CurrencyCode", request.currency.to_uppercase()),
            ("ReturnURL", self.config.return_url.clone()),
            ("NotifyURL", self.config.notify_url.clone()),
        ]
    }

    /// The full form body: the signed fields, buyer metadata (unsigned) and the signature itself.
    fn create_form(&self, request: &CreatePaymentRequest) -> Vec<(&'static str, String)> {
        let mut form = self.create_sign_fields(request);
        let refs = form.iter().map(|(k, v)| (*k, v.as_str())).collect::<Vec<_>>();
        let signature = sign_fields(&refs, &self.config.secret);
        form.push(("BuyerName", request.customer.name.clone()));
        form.push(("BuyerEmail", request.customer.email.clone()));
        form.push(("BuyerPhone", request.customer.phone.clone().unwrap_or_default()));
        form.push(("BuyerIP", request.customer.ip.clone().unwrap_or_default()));
        form.push(("Description", request.description.clone().unwrap_or_default()));
        form.push(("Sign", signature));
        form
    }

    fn result_from_response(&self, response: JkoPayCreateResponse) -> CreatePaymentResult {
        CreatePaymentResult {
            success: self.is_acceptance_code(&response.resp_code),
            payment_url: response.payment_url,
            qr_code: response.qr_code,
            provider_tx_id: response.tx_id,
            resp_code: response.resp_code,
            resp_msg: response.resp_msg,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct JkoPayCreateResponse {
    #[serde(rename = "RespCode")]
    resp_code: String,
    #[serde(rename = "RespMsg", default)]
    resp_msg: String,
    #[serde(rename = "PaymentURL", default)]
    payment_url: Option<String>,
    #[serde(rename = "QRCode", default)]
    qr_code: Option<String>,
    #[serde(rename = "TxID", default)]
    tx_id: Option<String>,
}

#[async_trait]
impl ProviderClient for JkoPayClient {
    fn method(&self) -> &PaymentMethod {
        &self.config.method
    }

    fn region(&self) -> &Region {
        &self.config.region
    }

    fn supported_currencies(&self) -> &[String] {
        &self.config.currencies
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.config.capabilities
    }

    async fn create_payment(&self, request: &CreatePaymentRequest) -> Result<CreatePaymentResult, ProviderError> {
        let form = self.create_form(request);
        trace!("🏦️ Sending create-payment request for {} to JkoPay", request.order_reference);
        let response = self.client.post(&self.config.create_url).form(&form).send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Transport(format!(
                    "JkoPay did not respond within {}s",
                    self.config.timeout.as_secs()
                ))
            } else {
                ProviderError::Transport(e.to_string())
            }
        })?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Protocol(format!("JkoPay returned HTTP {status}. {message}")));
        }
        let body = response
            .json::<JkoPayCreateResponse>()
            .await
            .map_err(|e| ProviderError::Protocol(format!("Could not parse JkoPay response. {e}")))?;
        debug!(
            "🏦️ JkoPay answered {} ({}) for order {}",
            body.resp_code, body.resp_msg, request.order_reference
        );
        Ok(self.result_from_response(body))
    }

    fn verify_callback(&self, callback: &CallbackNotification) -> bool {
        let fields = callback_sign_fields(callback);
        verify_fields(&fields, &self.config.secret, &callback.signature)
    }

    fn is_acceptance_code(&self, resp_code: &str) -> bool {
        ACCEPTANCE_CODES.contains(&resp_code)
    }

    fn parse_callback_amount(&self, raw: &str) -> Result<Money, ProviderError> {
        Ok(Money::parse_major(raw)?)
    }
}

/// The callback field values in [`CALLBACK_SIGN_ORDER`].
fn callback_sign_fields(cb: &CallbackNotification) -> Vec<(&'static str, &str)> {
    vec![
        ("MerchantID", cb.merchant_id.as_str()),
        ("TerminalID", cb.terminal_id.as_str()),
        ("OrderNo", cb.order_no.as_str()),
        ("TxID", cb.tx_id.as_str()),
        ("RespCode", cb.resp_code.as_str()),
        ("Amount", cb.amount.as_str()),
        ("CurrencyCode", cb.currency_code.as_str()),
    ]
}
