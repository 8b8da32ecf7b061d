use crate::{
    db_types::{Order, Payment, PaymentLink, User},
    traits::PaymentStoreError,
};

/// Read-only bulk access for the reconciliation engine. Reconciliation works on full table snapshots; datasets are
/// bounded by the storefront's scale and the checks need cross-table joins that are clearer in memory.
#[allow(async_fn_in_trait)]
pub trait ReconciliationStore: Clone + Send + Sync {
    async fn fetch_all_users(&self) -> Result<Vec<User>, PaymentStoreError>;

    async fn fetch_all_payment_links(&self) -> Result<Vec<PaymentLink>, PaymentStoreError>;

    async fn fetch_all_orders(&self) -> Result<Vec<Order>, PaymentStoreError>;

    async fn fetch_all_payments(&self) -> Result<Vec<Payment>, PaymentStoreError>;
}
