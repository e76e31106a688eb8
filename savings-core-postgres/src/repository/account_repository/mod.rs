pub mod compare_and_swap;
pub mod create_batch;
pub mod load_batch;
pub mod repo_impl;
pub mod scan_accounts;
pub mod update_status;

#[cfg(test)]
pub mod test_utils;

pub use repo_impl::AccountRepositoryImpl;
