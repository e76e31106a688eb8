//! Process-local implementations of the repository contracts.
//!
//! They honour the same conditional-write semantics as the PostgreSQL
//! repositories and back single-process deployments and the ledger tests.

pub mod account_store;
pub mod transaction_log;

pub use account_store::InMemoryAccountStore;
pub use transaction_log::InMemoryTransactionLog;
