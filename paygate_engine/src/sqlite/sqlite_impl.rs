//! `SqliteDatabase` is the concrete storage backend for the payment engine.
//!
//! It implements every trait defined in the [`crate::traits`] module. The settlement methods are the interesting
//! part: each runs its payment insert, order claim and link update inside a single transaction, so a gateway
//! re-delivery or a crash mid-settlement can never leave the three tables disagreeing.

use std::fmt::Debug;

use chrono::Utc;
use log::*;
use sqlx::SqlitePool;

use super::db::{db_url, new_pool, orders, payment_links, payments, users};
use crate::{
    db_types::{
        LinkId,
        LinkStatus,
        NewOrder,
        NewPayment,
        NewPaymentLink,
        NewUser,
        Order,
        OrderId,
        OrderStatus,
        Payment,
        PaymentLink,
        PaymentStatus,
        User,
    },
    sqlite::db::payments::InsertPaymentResult,
    traits::{PaymentStore, PaymentStoreError, ReconciliationStore, SettledPayment, SettlementResult},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Connects to the database given by the `PGW_DATABASE_URL` environment variable (or the default).
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        Self::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl PaymentStore for SqliteDatabase {
    async fn insert_user(&self, user: NewUser) -> Result<User, PaymentStoreError> {
        let mut conn = self.pool.acquire().await?;
        users::insert_user(user, &mut conn).await
    }

    async fn fetch_user(&self, id: i64) -> Result<Option<User>, PaymentStoreError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_user_by_id(id, &mut conn).await
    }

    async fn insert_payment_link(&self, link: NewPaymentLink) -> Result<PaymentLink, PaymentStoreError> {
        let mut conn = self.pool.acquire().await?;
        let link = payment_links::insert_payment_link(link, &mut conn).await?;
        debug!("🔗️ Payment link {} created for user {}", link.id, link.user_id);
        Ok(link)
    }

    async fn fetch_payment_link(&self, id: &LinkId) -> Result<Option<PaymentLink>, PaymentStoreError> {
        let mut conn = self.pool.acquire().await?;
        payment_links::fetch_payment_link(id, &mut conn).await
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, PaymentStoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::insert_order(order, &mut conn).await?;
        debug!("📝️ Order {} inserted", order.id);
        Ok(order)
    }

    async fn fetch_order(&self, id: &OrderId) -> Result<Option<Order>, PaymentStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_id(id, &mut conn).await
    }

    async fn fetch_order_for_link(&self, link_id: &LinkId) -> Result<Option<Order>, PaymentStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_for_link(link_id, &mut conn).await
    }

    async fn fetch_payment_by_provider_tx(
        &self,
        order_id: &OrderId,
        provider_tx_id: &str,
    ) -> Result<Option<Payment>, PaymentStoreError> {
        let mut conn = self.pool.acquire().await?;
        payments::fetch_payment_by_provider_tx(order_id, provider_tx_id, &mut conn).await
    }

    async fn settle_order_payment(&self, payment: NewPayment) -> Result<SettlementResult, PaymentStoreError> {
        let order_id = payment.order_id.clone();
        let provider_tx_id = payment.provider_tx_id.clone();
        let mut tx = self.pool.begin().await?;
        let inserted = match payments::insert_payment(payment, PaymentStatus::Completed, &mut tx).await? {
            InsertPaymentResult::Inserted(p) => p,
            InsertPaymentResult::AlreadyExists => {
                let existing = payments::fetch_payment_by_provider_tx(&order_id, &provider_tx_id, &mut tx)
                    .await?
                    .ok_or_else(|| {
                        PaymentStoreError::DatabaseError(format!(
                            "Duplicate payment for order {order_id} / tx {provider_tx_id} could not be re-fetched"
                        ))
                    })?;
                tx.rollback().await?;
                return Ok(SettlementResult::AlreadyProcessed(existing));
            },
        };
        let claimed =
            orders::claim_pending_order(&order_id, OrderStatus::Completed, &provider_tx_id, Some(Utc::now()), &mut tx)
                .await?;
        let Some(order) = claimed else {
            let err = match orders::fetch_order_by_id(&order_id, &mut tx).await? {
                None => PaymentStoreError::OrderNotFound(order_id),
                Some(_) => PaymentStoreError::IllegalOrderState(order_id),
            };
            tx.rollback().await?;
            return Err(err);
        };
        let link = match &order.payment_link_id {
            Some(link_id) => payment_links::advance_link_on_success(link_id, &mut tx).await?,
            None => None,
        };
        tx.commit().await?;
        Ok(SettlementResult::Applied(Box::new(SettledPayment { payment: inserted, order, link })))
    }

    async fn record_failed_payment(&self, payment: NewPayment) -> Result<SettlementResult, PaymentStoreError> {
        let order_id = payment.order_id.clone();
        let provider_tx_id = payment.provider_tx_id.clone();
        let mut tx = self.pool.begin().await?;
        let inserted = match payments::insert_payment(payment, PaymentStatus::Failed, &mut tx).await? {
            InsertPaymentResult::Inserted(p) => p,
            InsertPaymentResult::AlreadyExists => {
                let existing = payments::fetch_payment_by_provider_tx(&order_id, &provider_tx_id, &mut tx)
                    .await?
                    .ok_or_else(|| {
                        PaymentStoreError::DatabaseError(format!(
                            "Duplicate payment for order {order_id} / tx {provider_tx_id} could not be re-fetched"
                        ))
                    })?;
                tx.rollback().await?;
                return Ok(SettlementResult::AlreadyProcessed(existing));
            },
        };
        let claimed =
            orders::claim_pending_order(&order_id, OrderStatus::Cancelled, &provider_tx_id, None, &mut tx).await?;
        let Some(order) = claimed else {
            let err = match orders::fetch_order_by_id(&order_id, &mut tx).await? {
                None => PaymentStoreError::OrderNotFound(order_id),
                Some(_) => PaymentStoreError::IllegalOrderState(order_id),
            };
            tx.rollback().await?;
            return Err(err);
        };
        let link = match &order.payment_link_id {
            Some(link_id) => payment_links::set_link_status(link_id, LinkStatus::Failed, &mut tx).await?,
            None => None,
        };
        tx.commit().await?;
        Ok(SettlementResult::Applied(Box::new(SettledPayment { payment: inserted, order, link })))
    }
}

impl ReconciliationStore for SqliteDatabase {
    async fn fetch_all_users(&self) -> Result<Vec<User>, PaymentStoreError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_all_users(&mut conn).await
    }

    async fn fetch_all_payment_links(&self) -> Result<Vec<PaymentLink>, PaymentStoreError> {
        let mut conn = self.pool.acquire().await?;
        payment_links::fetch_all_payment_links(&mut conn).await
    }

    async fn fetch_all_orders(&self) -> Result<Vec<Order>, PaymentStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_all_orders(&mut conn).await
    }

    async fn fetch_all_payments(&self) -> Result<Vec<Payment>, PaymentStoreError> {
        let mut conn = self.pool.acquire().await?;
        payments::fetch_all_payments(&mut conn).await
    }
}
