pub mod config;
pub mod engine;
pub mod observability;
pub mod projector;
pub mod reconciliation;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{ConfigError, LedgerConfig};
pub use engine::LedgerEngine;
pub use projector::ReadModelProjector;
pub use reconciliation::{ReconciliationIssue, ReconciliationReport, Reconciler};
