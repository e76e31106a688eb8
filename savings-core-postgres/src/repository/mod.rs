pub mod account_repository;
pub mod db_init;
pub mod factory;
pub mod transaction_repository;

pub use account_repository::AccountRepositoryImpl;
pub use factory::{LedgerRepoFactory, LedgerRepositories};
pub use transaction_repository::TransactionRepositoryImpl;
