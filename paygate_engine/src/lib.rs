//! PayGate Engine
//!
//! The PayGate engine is the payment processing and reconciliation core of the PayGate storefront. It is
//! provider-agnostic: everything a specific gateway needs to know (wire field orders, acceptance codes, amount unit
//! conventions) lives behind the [`providers::ProviderClient`] interface, and everything the storefront persists
//! lives behind the traits in [`mod@traits`].
//!
//! The library is divided into four main sections:
//! 1. The data model ([`mod@db_types`]): orders, payments, payment links and the status enums that drive the
//!    callback state machine.
//! 2. Provider plumbing ([`mod@providers`] and [`mod@registry`]): one client per (method, region) pair, collected
//!    into an immutable [`registry::GatewayRegistry`] built at startup.
//! 3. The public API ([`mod@api`]): the [`PaymentOrchestrator`] façade used by request handlers, and the
//!    [`ReconciliationApi`] batch engine.
//! 4. Database management ([`mod@sqlite`]): the SQLite backend. You should never need to access the database
//!    directly; use the API types instead.
pub mod api;
pub mod db_types;
pub mod helpers;
pub mod providers;
pub mod registry;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

pub use api::{
    CallbackOutcome,
    CheckKind,
    CheckReport,
    CheckStatus,
    FinancialTotals,
    GatewayError,
    OverallStatus,
    PaymentOrchestrator,
    ReconciliationApi,
    ReconciliationError,
    ReconciliationIssue,
    ReconciliationReport,
    SignaturePolicy,
    DEFAULT_PLATFORM_FEE_PERCENT,
};
