//! Reconciliation of installed content against a manifest.
//!
//! [`plan`] is a pure diff; [`Reconciler`] applies it to disk and
//! persists the resulting installed state.

pub mod engine;
pub mod plan;

pub use engine::{ReconcileReport, Reconciler};
pub use plan::{ReconcilePlan, RemovalPolicy, plan, plan_with};
