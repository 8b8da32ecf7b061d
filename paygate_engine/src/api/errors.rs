use thiserror::Error;

use crate::{
    db_types::{LinkId, OrderId, PaymentMethod, Region},
    helpers::OrderReferenceError,
    providers::ProviderError,
    traits::PaymentStoreError,
};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("No payment provider is available for method '{method}' in region {region}")]
    NoProviderAvailable { region: Region, method: PaymentMethod },
    #[error("No payment method is configured for region {0}")]
    NoDefaultMethod(Region),
    #[error("Currency {currency} is not accepted by {method} in region {region}")]
    UnsupportedCurrency { currency: String, region: Region, method: PaymentMethod },
    #[error("Could not interpret the order reference. {0}")]
    InvalidOrderReference(#[from] OrderReferenceError),
    #[error("Payment link {0} does not exist")]
    PaymentLinkNotFound(LinkId),
    #[error("Payment link {0} cannot accept further payments")]
    PaymentLinkExhausted(LinkId),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("The callback signature did not verify")]
    SignatureMismatch,
    #[error("Provider failure. {0}")]
    Provider(#[from] ProviderError),
    #[error("Storage failure. {0}")]
    Store(#[from] PaymentStoreError),
}
