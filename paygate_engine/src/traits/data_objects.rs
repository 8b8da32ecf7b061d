use serde::Serialize;

use crate::db_types::{Order, Payment, PaymentLink};

/// The outcome of applying a settlement. Re-deliveries of a callback the store has already recorded resolve to
/// `AlreadyProcessed` with the original payment, so the caller can acknowledge them without side effects.
#[derive(Debug, Clone)]
pub enum SettlementResult {
    Applied(Box<SettledPayment>),
    AlreadyProcessed(Payment),
}

/// Everything a freshly applied settlement touched, in its post-settlement state.
#[derive(Debug, Clone, Serialize)]
pub struct SettledPayment {
    pub payment: Payment,
    pub order: Order,
    pub link: Option<PaymentLink>,
}
