pub mod cancellation_claim;
pub mod create_batch;
pub mod find_by_reference;
pub mod load_history;
pub mod repo_impl;
pub mod scan_transactions;

#[cfg(test)]
pub mod test_utils;

pub use repo_impl::TransactionRepositoryImpl;
