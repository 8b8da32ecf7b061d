//! # PayGate server
//!
//! The HTTP boundary of the PayGate payment core. It is responsible for:
//! * Accepting create-payment requests from the checkout UI and forwarding them to the configured gateway.
//! * Receiving asynchronous gateway callbacks, running them through the callback state machine, and always
//!   acknowledging with HTTP 200 so the gateway stops retrying.
//! * Serving the reconciliation report and financial totals.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config] for more information.
//!
//! ## Routes
//! * `GET  /health`: liveness probe.
//! * `POST /payments/{region}`: create a payment using the region's default method.
//! * `POST /payments/{region}/{method}`: create a payment with an explicit method.
//! * `GET  /payments/{region}/methods`: the methods (and default) available in a region.
//! * `POST /callback/{region}/{method}`: the gateway notification endpoint.
//! * `GET  /reconcile`: the full reconciliation report.
//! * `GET  /reconcile/totals`: aggregate financial totals.

pub mod config;
pub mod data_objects;
pub mod errors;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
