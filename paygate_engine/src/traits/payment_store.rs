use thiserror::Error;

use crate::{
    db_types::{LinkId, NewOrder, NewPayment, NewPaymentLink, NewUser, Order, OrderId, Payment, PaymentLink, User},
    traits::SettlementResult,
};

#[derive(Debug, Clone, Error)]
pub enum PaymentStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("User {0} does not exist")]
    UserNotFound(i64),
    #[error("Payment link {0} does not exist")]
    PaymentLinkNotFound(LinkId),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {0} is not in a state that allows this transition")]
    IllegalOrderState(OrderId),
}

impl From<sqlx::Error> for PaymentStoreError {
    fn from(e: sqlx::Error) -> Self {
        PaymentStoreError::DatabaseError(e.to_string())
    }
}

/// Transactional storage for the payment lifecycle.
///
/// The two settlement methods are the only mutation points for order, payment and link state after order creation,
/// and each must execute atomically: either every row it touches is updated, or none are.
#[allow(async_fn_in_trait)]
pub trait PaymentStore: Clone + Send + Sync {
    async fn insert_user(&self, user: NewUser) -> Result<User, PaymentStoreError>;

    async fn fetch_user(&self, id: i64) -> Result<Option<User>, PaymentStoreError>;

    async fn insert_payment_link(&self, link: NewPaymentLink) -> Result<PaymentLink, PaymentStoreError>;

    async fn fetch_payment_link(&self, id: &LinkId) -> Result<Option<PaymentLink>, PaymentStoreError>;

    async fn insert_order(&self, order: NewOrder) -> Result<Order, PaymentStoreError>;

    async fn fetch_order(&self, id: &OrderId) -> Result<Option<Order>, PaymentStoreError>;

    /// The most recent order created against the given link, if any.
    async fn fetch_order_for_link(&self, link_id: &LinkId) -> Result<Option<Order>, PaymentStoreError>;

    async fn fetch_payment_by_provider_tx(
        &self,
        order_id: &OrderId,
        provider_tx_id: &str,
    ) -> Result<Option<Payment>, PaymentStoreError>;

    /// Applies a successful settlement: records the payment, claims the order's Pending -> Completed transition,
    /// and advances the associated link (status and usage count). Re-delivery of an already recorded
    /// (order, provider transaction) pair returns [`SettlementResult::AlreadyProcessed`] and changes nothing.
    async fn settle_order_payment(&self, payment: NewPayment) -> Result<SettlementResult, PaymentStoreError>;

    /// Records a failed settlement attempt: stores the failed payment, cancels the pending order and marks the
    /// associated link Failed. Idempotent under re-delivery in the same way as [`Self::settle_order_payment`].
    async fn record_failed_payment(&self, payment: NewPayment) -> Result<SettlementResult, PaymentStoreError>;
}
