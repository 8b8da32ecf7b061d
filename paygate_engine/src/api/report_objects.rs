use pg_common::Money;
use serde::{Deserialize, Serialize};

use crate::db_types::{LinkId, OrderId};

//--------------------------------------     Check identity     ------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckKind {
    Referential,
    OrderPayment,
    LinkOrder,
    Amount,
    Status,
}

impl CheckKind {
    /// The fixed operator guidance for a non-clean check of this kind.
    pub fn recommendation(&self) -> &'static str {
        match self {
            CheckKind::Referential => "Restore the missing user records or reassign the affected orders.",
            CheckKind::OrderPayment => {
                "Cross-check the affected orders against the gateway transaction log and backfill missing payments."
            },
            CheckKind::LinkOrder => "Review the affected payment links and revert statuses with no supporting order.",
            CheckKind::Amount => "Compare gateway settlement reports against recorded payment amounts.",
            CheckKind::Status => "Replay or void the affected orders so their status agrees with their payments.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckStatus {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverallStatus {
    Healthy,
    Warning,
    Critical,
}

//--------------------------------------  ReconciliationIssue  -------------------------------------------------------
/// One concrete inconsistency found by a reconciliation check. Issues are reported, never acted on; fixing the data
/// is an operator decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReconciliationIssue {
    /// An order's `user_id` does not resolve to any user.
    MissingUser { order_id: OrderId, user_id: i64 },
    /// A completed order has no payment rows at all.
    CompletedOrderWithoutPayment { order_id: OrderId },
    /// A payment's `order_id` does not resolve to any order.
    OrphanPayment { payment_id: i64, order_id: OrderId },
    /// A completed payment link has no order referencing it.
    CompletedLinkWithoutOrder { link_id: LinkId },
    /// An order references a payment link that does not exist.
    OrphanOrderLink { order_id: OrderId, link_id: LinkId },
    /// The completed payments against an order do not sum to its amount. `difference` is signed: positive means the
    /// payments exceed the order.
    AmountMismatch { order_id: OrderId, order_amount: Money, paid_amount: Money, difference: Money },
    /// A completed order has no completed payment.
    MissingSettlement { order_id: OrderId },
    /// A pending order already has a completed payment.
    PrematureSettlement { order_id: OrderId, payment_id: i64 },
}

//--------------------------------------      CheckReport      -------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckReport {
    pub kind: CheckKind,
    pub status: CheckStatus,
    pub issues: Vec<ReconciliationIssue>,
}

impl CheckReport {
    /// An error-class check reports `Error` on any issue; all others report `Warning`.
    pub fn new(kind: CheckKind, issues: Vec<ReconciliationIssue>) -> Self {
        let status = if issues.is_empty() {
            CheckStatus::Success
        } else if kind == CheckKind::Referential {
            CheckStatus::Error
        } else {
            CheckStatus::Warning
        };
        Self { kind, status, issues }
    }

    pub fn is_clean(&self) -> bool {
        self.status == CheckStatus::Success
    }
}

//--------------------------------------  ReconciliationReport  ------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub overall: OverallStatus,
    pub checks: Vec<CheckReport>,
    /// One fixed recommendation per non-clean check, in check order.
    pub recommendations: Vec<String>,
}

impl ReconciliationReport {
    pub fn new(checks: Vec<CheckReport>) -> Self {
        let overall = if checks.iter().any(|c| c.status == CheckStatus::Error) {
            OverallStatus::Critical
        } else if checks.iter().any(|c| !c.issues.is_empty()) {
            OverallStatus::Warning
        } else {
            OverallStatus::Healthy
        };
        let recommendations =
            checks.iter().filter(|c| !c.is_clean()).map(|c| c.kind.recommendation().to_string()).collect();
        Self { overall, checks, recommendations }
    }

    pub fn check(&self, kind: CheckKind) -> Option<&CheckReport> {
        self.checks.iter().find(|c| c.kind == kind)
    }

    pub fn issue_count(&self) -> usize {
        self.checks.iter().map(|c| c.issues.len()).sum()
    }
}

//--------------------------------------    FinancialTotals     ------------------------------------------------------
/// Aggregate revenue figures over completed orders. The platform fee is a fixed percentage configured at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialTotals {
    pub total_sales: Money,
    pub order_count: usize,
    pub fee_percent: f64,
    pub platform_fee: Money,
    pub net_revenue: Money,
}
