use std::fmt::Display;

use paygate_engine::{
    db_types::{LinkId, OrderId, PaymentMethod},
    providers::CustomerInfo,
};
use pg_common::Money;
use serde::{Deserialize, Serialize};

/// The small acknowledgement body used by the callback endpoint and error responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// The create-payment request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequestParams {
    pub link_id: LinkId,
    #[serde(default)]
    pub customer: CustomerInfo,
}

/// What the checkout UI gets back from a create-payment call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCreatedResponse {
    pub order_id: OrderId,
    pub amount: Money,
    pub currency: String,
    pub success: bool,
    pub payment_url: Option<String>,
    pub qr_code: Option<String>,
    pub provider_tx_id: Option<String>,
    pub resp_code: String,
    pub resp_msg: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodsResponse {
    pub region: String,
    pub methods: Vec<PaymentMethod>,
    pub default_method: Option<PaymentMethod>,
    pub currencies: Vec<String>,
}
