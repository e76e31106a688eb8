use sqlx::PgPool;
use std::sync::Arc;

use super::{
    account_repository::AccountRepositoryImpl,
    transaction_repository::TransactionRepositoryImpl,
};

/// Factory for the ledger repositories.
///
/// Both repositories share one pool. Each statement runs on its own pooled
/// connection; atomicity comes from the conditional statements themselves.
#[derive(Default)]
pub struct LedgerRepoFactory {}

impl LedgerRepoFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {})
    }

    pub fn build_account_repo(&self, pool: &Arc<PgPool>) -> Arc<AccountRepositoryImpl> {
        Arc::new(AccountRepositoryImpl::new(pool.clone()))
    }

    pub fn build_transaction_repo(&self, pool: &Arc<PgPool>) -> Arc<TransactionRepositoryImpl> {
        Arc::new(TransactionRepositoryImpl::new(pool.clone()))
    }

    pub fn build_all_repos(&self, pool: &Arc<PgPool>) -> LedgerRepositories {
        LedgerRepositories {
            account_repository: self.build_account_repo(pool),
            transaction_repository: self.build_transaction_repo(pool),
        }
    }
}

/// Container for the ledger repositories
#[derive(Clone)]
pub struct LedgerRepositories {
    pub account_repository: Arc<AccountRepositoryImpl>,
    pub transaction_repository: Arc<TransactionRepositoryImpl>,
}
