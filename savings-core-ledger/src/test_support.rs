use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use savings_core_api::{AccountStatus, LedgerService, OpenAccountRequest};
use savings_core_db::memory::{InMemoryAccountStore, InMemoryTransactionLog};
use savings_core_db::models::account::AccountModel;
use savings_core_db::models::transaction::{CancellationMetadata, TransactionModel};
use savings_core_db::repository::{
    AccountFilter, CancellationClaim, ClaimOutcome, CompareAndSwap, CreateBatch, FindById,
    FindByReference, LoadBatch, LoadHistory, Page, PageRequest, ScanAccounts, ScanTransactions,
    SwapOutcome, TransactionFilter, UpdateStatus,
};
use std::error::Error;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::config::LedgerConfig;
use crate::engine::LedgerEngine;

pub type MemoryEngine = LedgerEngine<InMemoryAccountStore, InMemoryTransactionLog>;

pub fn fast_config() -> LedgerConfig {
    LedgerConfig {
        max_cas_retries: 200,
        base_backoff_ms: 1,
        max_backoff_ms: 4,
        ..LedgerConfig::default()
    }
}

pub fn memory_engine() -> (MemoryEngine, Arc<InMemoryAccountStore>, Arc<InMemoryTransactionLog>) {
    let accounts = Arc::new(InMemoryAccountStore::new());
    let transactions = Arc::new(InMemoryTransactionLog::new());
    let engine = LedgerEngine::with_config(accounts.clone(), transactions.clone(), fast_config());
    (engine, accounts, transactions)
}

pub fn open_request(customer_id: Uuid, opening_balance: i64, minimum_balance: i64) -> OpenAccountRequest {
    OpenAccountRequest {
        customer_id,
        product_id: None,
        opening_balance,
        minimum_balance,
        interest_rate: Decimal::new(150, 2),
        is_verified: true,
        actor: Uuid::new_v4(),
    }
}

pub async fn open_account<S: LedgerService>(engine: &S, opening_balance: i64, minimum_balance: i64) -> Uuid {
    engine
        .open_account(open_request(Uuid::new_v4(), opening_balance, minimum_balance))
        .await
        .unwrap()
        .id
}

/// Transaction log that can be told to fail, used to drive the engine into
/// its failure paths.
#[derive(Default)]
pub struct FaultyLog {
    pub inner: InMemoryTransactionLog,
    pub fail_appends: AtomicBool,
    pub fail_completions: AtomicBool,
    /// Appends that are stored but still reported as failed.
    pub commit_then_fail: AtomicBool,
    /// Reference lookups answered with `None` before the real store is asked.
    pub hidden_reference_lookups: AtomicUsize,
}

#[async_trait]
impl FindById<TransactionModel> for FaultyLog {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<TransactionModel>, Box<dyn Error + Send + Sync>> {
        self.inner.find_by_id(id).await
    }
}

#[async_trait]
impl CreateBatch<TransactionModel> for FaultyLog {
    async fn create_batch(
        &self,
        items: Vec<TransactionModel>,
    ) -> Result<Vec<TransactionModel>, Box<dyn Error + Send + Sync>> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err("connection reset by peer".into());
        }
        let stored = self.inner.create_batch(items).await?;
        if self.commit_then_fail.load(Ordering::SeqCst) {
            return Err("connection reset before commit acknowledgement".into());
        }
        Ok(stored)
    }
}

#[async_trait]
impl FindByReference for FaultyLog {
    async fn find_by_reference(
        &self,
        account_id: Uuid,
        reference: &str,
    ) -> Result<Option<TransactionModel>, Box<dyn Error + Send + Sync>> {
        let hidden = self
            .hidden_reference_lookups
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if hidden {
            return Ok(None);
        }
        self.inner.find_by_reference(account_id, reference).await
    }
}

#[async_trait]
impl LoadHistory for FaultyLog {
    async fn load_history(
        &self,
        account_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<TransactionModel>, Box<dyn Error + Send + Sync>> {
        self.inner.load_history(account_id, page).await
    }
}

#[async_trait]
impl ScanTransactions for FaultyLog {
    async fn scan_transactions(
        &self,
        filter: TransactionFilter,
    ) -> Result<Vec<TransactionModel>, Box<dyn Error + Send + Sync>> {
        self.inner.scan_transactions(filter).await
    }
}

#[async_trait]
impl CancellationClaim for FaultyLog {
    async fn claim_cancellation(
        &self,
        transaction_id: Uuid,
        claim_id: Uuid,
    ) -> Result<ClaimOutcome, Box<dyn Error + Send + Sync>> {
        self.inner.claim_cancellation(transaction_id, claim_id).await
    }

    async fn release_cancellation(
        &self,
        transaction_id: Uuid,
        claim_id: Uuid,
    ) -> Result<bool, Box<dyn Error + Send + Sync>> {
        self.inner.release_cancellation(transaction_id, claim_id).await
    }

    async fn complete_cancellation(
        &self,
        transaction_id: Uuid,
        claim_id: Uuid,
        metadata: CancellationMetadata,
    ) -> Result<Option<TransactionModel>, Box<dyn Error + Send + Sync>> {
        if self.fail_completions.load(Ordering::SeqCst) {
            return Err("statement timeout".into());
        }
        self.inner.complete_cancellation(transaction_id, claim_id, metadata).await
    }
}

pub type FaultyEngine = LedgerEngine<InMemoryAccountStore, FaultyLog>;

pub fn faulty_engine() -> (FaultyEngine, Arc<InMemoryAccountStore>, Arc<FaultyLog>) {
    let accounts = Arc::new(InMemoryAccountStore::new());
    let transactions = Arc::new(FaultyLog::default());
    let engine = LedgerEngine::with_config(accounts.clone(), transactions.clone(), fast_config());
    (engine, accounts, transactions)
}

/// Account store whose swaps can be slowed down or made to lose every race.
#[derive(Default)]
pub struct SlowAccounts {
    pub inner: InMemoryAccountStore,
    pub always_conflict: AtomicBool,
    pub swap_delay_ms: AtomicU64,
}

#[async_trait]
impl FindById<AccountModel> for SlowAccounts {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AccountModel>, Box<dyn Error + Send + Sync>> {
        self.inner.find_by_id(id).await
    }
}

#[async_trait]
impl LoadBatch<AccountModel> for SlowAccounts {
    async fn load_batch(&self, ids: &[Uuid]) -> Result<Vec<Option<AccountModel>>, Box<dyn Error + Send + Sync>> {
        self.inner.load_batch(ids).await
    }
}

#[async_trait]
impl CreateBatch<AccountModel> for SlowAccounts {
    async fn create_batch(
        &self,
        items: Vec<AccountModel>,
    ) -> Result<Vec<AccountModel>, Box<dyn Error + Send + Sync>> {
        self.inner.create_batch(items).await
    }
}

#[async_trait]
impl CompareAndSwap for SlowAccounts {
    async fn compare_and_swap(
        &self,
        account_id: Uuid,
        expected_version: i64,
        new_balance: i64,
        last_transaction_date: DateTime<Utc>,
    ) -> Result<SwapOutcome, Box<dyn Error + Send + Sync>> {
        let delay = self.swap_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.always_conflict.load(Ordering::SeqCst) {
            return Ok(SwapOutcome::VersionConflict);
        }
        self.inner
            .compare_and_swap(account_id, expected_version, new_balance, last_transaction_date)
            .await
    }
}

#[async_trait]
impl UpdateStatus for SlowAccounts {
    async fn update_status(
        &self,
        account_id: Uuid,
        expected_version: i64,
        status: AccountStatus,
    ) -> Result<SwapOutcome, Box<dyn Error + Send + Sync>> {
        self.inner.update_status(account_id, expected_version, status).await
    }
}

#[async_trait]
impl ScanAccounts for SlowAccounts {
    async fn scan_accounts(&self, filter: AccountFilter) -> Result<Vec<AccountModel>, Box<dyn Error + Send + Sync>> {
        self.inner.scan_accounts(filter).await
    }
}

pub type SlowEngine = LedgerEngine<SlowAccounts, InMemoryTransactionLog>;

pub fn slow_engine(config: LedgerConfig) -> (SlowEngine, Arc<SlowAccounts>, Arc<InMemoryTransactionLog>) {
    let accounts = Arc::new(SlowAccounts::default());
    let transactions = Arc::new(InMemoryTransactionLog::new());
    let engine = LedgerEngine::with_config(accounts.clone(), transactions.clone(), config);
    (engine, accounts, transactions)
}
