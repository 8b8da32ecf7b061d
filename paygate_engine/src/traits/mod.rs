//! The database-agnostic persistence interfaces.
//!
//! The orchestrator and reconciliation engine are generic over these traits; `SqliteDatabase` is the shipped
//! implementation. Backends are `Clone` handles over a shared pool, cheap to pass by value.

mod data_objects;
mod payment_store;
mod reconciliation_store;

pub use data_objects::{SettledPayment, SettlementResult};
pub use payment_store::{PaymentStore, PaymentStoreError};
pub use reconciliation_store::ReconciliationStore;
