//! The reconciliation engine.
//!
//! A read-only batch pass over the full order, payment, payment-link and user collections. Each check is
//! independent and always runs to completion; a storage failure aborts the run, but no inconsistency ever does.
//! The report is the product, not the mutation: nothing here writes.

use std::collections::{HashMap, HashSet};

use log::*;
use pg_common::Money;
use thiserror::Error;

use crate::{
    api::report_objects::{CheckKind, CheckReport, FinancialTotals, ReconciliationIssue, ReconciliationReport},
    db_types::{LinkStatus, Order, OrderStatus, Payment, PaymentLink, PaymentStatus, User},
    traits::{PaymentStoreError, ReconciliationStore},
};

/// Two settlement amounts are considered equal when they differ by at most one cent.
const AMOUNT_TOLERANCE: Money = Money::CENT;

pub const DEFAULT_PLATFORM_FEE_PERCENT: f64 = 5.0;

#[derive(Debug, Clone, Error)]
pub enum ReconciliationError {
    #[error("Could not load reconciliation data. {0}")]
    Store(#[from] PaymentStoreError),
}

pub struct ReconciliationApi<B> {
    db: B,
    fee_percent: f64,
}

impl<B: Clone> Clone for ReconciliationApi<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), fee_percent: self.fee_percent }
    }
}

impl<B> ReconciliationApi<B>
where B: ReconciliationStore
{
    pub fn new(db: B, fee_percent: f64) -> Self {
        Self { db, fee_percent }
    }

    /// Runs all five checks over a snapshot of the store and assembles the report.
    pub async fn reconcile(&self) -> Result<ReconciliationReport, ReconciliationError> {
        let users = self.db.fetch_all_users().await?;
        let links = self.db.fetch_all_payment_links().await?;
        let orders = self.db.fetch_all_orders().await?;
        let payments = self.db.fetch_all_payments().await?;
        debug!(
            "🔍️ Reconciling {} order(s), {} payment(s), {} link(s), {} user(s)",
            orders.len(),
            payments.len(),
            links.len(),
            users.len()
        );
        let checks = vec![
            CheckReport::new(CheckKind::Referential, referential_check(&users, &orders)),
            CheckReport::new(CheckKind::OrderPayment, order_payment_check(&orders, &payments)),
            CheckReport::new(CheckKind::LinkOrder, link_order_check(&links, &orders)),
            CheckReport::new(CheckKind::Amount, amount_check(&orders, &payments)),
            CheckReport::new(CheckKind::Status, status_check(&orders, &payments)),
        ];
        let report = ReconciliationReport::new(checks);
        info!("🔍️ Reconciliation finished: {:?} with {} issue(s)", report.overall, report.issue_count());
        Ok(report)
    }

    /// Aggregate revenue over completed orders, with the platform fee taken at the configured percentage.
    pub async fn financial_totals(&self) -> Result<FinancialTotals, ReconciliationError> {
        let orders = self.db.fetch_all_orders().await?;
        let completed = orders.iter().filter(|o| o.status == OrderStatus::Completed).collect::<Vec<_>>();
        let total_sales = completed.iter().map(|o| o.amount).sum::<Money>();
        let platform_fee = Money::from_cents((total_sales.value() as f64 * self.fee_percent / 100.0).round() as i64);
        Ok(FinancialTotals {
            total_sales,
            order_count: completed.len(),
            fee_percent: self.fee_percent,
            platform_fee,
            net_revenue: total_sales - platform_fee,
        })
    }
}

//--------------------------------------     The five checks     -----------------------------------------------------

fn referential_check(users: &[User], orders: &[Order]) -> Vec<ReconciliationIssue> {
    let user_ids = users.iter().map(|u| u.id).collect::<HashSet<_>>();
    orders
        .iter()
        .filter(|o| !user_ids.contains(&o.user_id))
        .map(|o| ReconciliationIssue::MissingUser { order_id: o.id.clone(), user_id: o.user_id })
        .collect()
}

fn order_payment_check(orders: &[Order], payments: &[Payment]) -> Vec<ReconciliationIssue> {
    let order_ids = orders.iter().map(|o| &o.id).collect::<HashSet<_>>();
    let paid_orders = payments.iter().map(|p| &p.order_id).collect::<HashSet<_>>();
    let mut issues = orders
        .iter()
        .filter(|o| o.status == OrderStatus::Completed && !paid_orders.contains(&o.id))
        .map(|o| ReconciliationIssue::CompletedOrderWithoutPayment { order_id: o.id.clone() })
        .collect::<Vec<_>>();
    issues.extend(
        payments
            .iter()
            .filter(|p| !order_ids.contains(&p.order_id))
            .map(|p| ReconciliationIssue::OrphanPayment { payment_id: p.id, order_id: p.order_id.clone() }),
    );
    issues
}

fn link_order_check(links: &[PaymentLink], orders: &[Order]) -> Vec<ReconciliationIssue> {
    let link_ids = links.iter().map(|l| &l.id).collect::<HashSet<_>>();
    let linked = orders.iter().filter_map(|o| o.payment_link_id.as_ref()).collect::<HashSet<_>>();
    let mut issues = links
        .iter()
        .filter(|l| l.status == LinkStatus::Completed && !linked.contains(&l.id))
        .map(|l| ReconciliationIssue::CompletedLinkWithoutOrder { link_id: l.id.clone() })
        .collect::<Vec<_>>();
    issues.extend(orders.iter().filter_map(|o| {
        let link_id = o.payment_link_id.as_ref()?;
        (!link_ids.contains(link_id))
            .then(|| ReconciliationIssue::OrphanOrderLink { order_id: o.id.clone(), link_id: link_id.clone() })
    }));
    issues
}

fn amount_check(orders: &[Order], payments: &[Payment]) -> Vec<ReconciliationIssue> {
    let mut paid: HashMap<&crate::db_types::OrderId, Money> = HashMap::new();
    for p in payments.iter().filter(|p| p.status == PaymentStatus::Completed) {
        let entry = paid.entry(&p.order_id).or_insert_with(Money::default);
        *entry = *entry + p.amount;
    }
    orders
        .iter()
        .filter(|o| o.status == OrderStatus::Completed)
        .filter_map(|o| {
            // Orders with zero payments belong to the order/payment check, not here.
            let paid_amount = *paid.get(&o.id)?;
            let difference = paid_amount - o.amount;
            (difference.abs() > AMOUNT_TOLERANCE).then(|| ReconciliationIssue::AmountMismatch {
                order_id: o.id.clone(),
                order_amount: o.amount,
                paid_amount,
                difference,
            })
        })
        .collect()
}

fn status_check(orders: &[Order], payments: &[Payment]) -> Vec<ReconciliationIssue> {
    let settled = payments
        .iter()
        .filter(|p| p.status == PaymentStatus::Completed)
        .map(|p| (&p.order_id, p.id))
        .collect::<HashMap<_, _>>();
    let mut issues = orders
        .iter()
        .filter(|o| o.status == OrderStatus::Completed && !settled.contains_key(&o.id))
        .map(|o| ReconciliationIssue::MissingSettlement { order_id: o.id.clone() })
        .collect::<Vec<_>>();
    issues.extend(orders.iter().filter(|o| o.status == OrderStatus::Pending).filter_map(|o| {
        settled
            .get(&o.id)
            .map(|&payment_id| ReconciliationIssue::PrematureSettlement { order_id: o.id.clone(), payment_id })
    }));
    issues
}
