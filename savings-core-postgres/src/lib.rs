pub mod postgres_repositories;
pub mod repository;
pub mod utils;

pub use postgres_repositories::PostgresRepositories;
pub use repository::{AccountRepositoryImpl, LedgerRepositories, TransactionRepositoryImpl};

#[cfg(test)]
pub mod test_helper;
