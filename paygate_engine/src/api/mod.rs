//! The public engine API: the payment orchestrator (create-payment and callback state machine) and the
//! reconciliation engine. HTTP handlers call into this module and nothing below it.

mod errors;
mod orchestrator;
mod reconciliation;
mod report_objects;

pub use errors::GatewayError;
pub use orchestrator::{CallbackOutcome, PaymentOrchestrator, SignaturePolicy};
pub use reconciliation::{ReconciliationApi, ReconciliationError, DEFAULT_PLATFORM_FEE_PERCENT};
pub use report_objects::{
    CheckKind,
    CheckReport,
    CheckStatus,
    FinancialTotals,
    OverallStatus,
    ReconciliationIssue,
    ReconciliationReport,
};
