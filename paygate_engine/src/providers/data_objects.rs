use pg_common::Money;
use serde::{Deserialize, Serialize};

use crate::db_types::OrderId;

//--------------------------------------  CreatePaymentRequest  ------------------------------------------------------
/// The create-payment boundary, as consumed from the checkout UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaymentRequest {
    /// The composite order reference sent to (and echoed back by) the gateway.
    /// See [`crate::helpers::order_reference`].
    pub order_reference: OrderId,
    pub amount: Money,
    pub currency: String,
    #[serde(default)]
    pub description: Option<String>,
    pub customer: CustomerInfo,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
}

//--------------------------------------  CreatePaymentResult  -------------------------------------------------------
/// The result of an outbound create-payment call, returned unchanged to the caller. `success` reflects the
/// provider's acceptance-code set, not a single code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaymentResult {
    pub success: bool,
    pub payment_url: Option<String>,
    pub qr_code: Option<String>,
    pub provider_tx_id: Option<String>,
    pub resp_code: String,
    pub resp_msg: String,
}

//--------------------------------------  Optional capabilities  -----------------------------------------------------
/// Refunds are optional per provider; a gateway without refund support returns `Unsupported` rather than erroring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RefundResult {
    Refunded { provider_tx_id: String, amount: Money },
    Rejected { resp_code: String, resp_msg: String },
    Unsupported,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StatusResult {
    Status { resp_code: String, resp_msg: String },
    Unsupported,
}

//--------------------------------------  CallbackNotification  ------------------------------------------------------
/// The asynchronous, provider-initiated callback reporting the outcome of a previously created payment.
/// Delivered form- or query-encoded over HTTP; field names below are the wire names.
///
/// `amount` is kept as the raw wire string: its unit convention is provider-specific and only the provider client
/// may parse it (see [`super::ProviderClient::parse_callback_amount`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackNotification {
    #[serde(rename = "MerchantID")]
    pub merchant_id: String,
    #[serde(rename = "TerminalID")]
    pub terminal_id: String,
    #[serde(rename = "OrderNo")]
    pub order_no: String,
    #[serde(rename = "RespCode")]
    pub resp_code: String,
    #[serde(rename = "RespMsg", default)]
    pub resp_msg: String,
    #[serde(rename = "Amount")]
    pub amount: String,
    #[serde(rename = "CurrencyCode")]
    pub currency_code: String,
    #[serde(rename = "TxID")]
    pub tx_id: String,
    #[serde(rename = "TxType", default)]
    pub tx_type: String,
    #[serde(rename = "Sign")]
    pub signature: String,
}
