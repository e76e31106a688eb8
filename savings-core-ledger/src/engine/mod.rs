//! Balance mutations.
//!
//! Every balance change goes through [`CompareAndSwap`] on the account
//! version and is paired with exactly one transaction log write. Nothing in
//! here holds a lock across a storage call, so several engines (or several
//! processes) may share the same stores.
//!
//! [`CompareAndSwap`]: savings_core_db::repository::CompareAndSwap

mod cancel;
mod lifecycle;
mod movement;
pub mod retry;
pub mod rules;

use async_trait::async_trait;
use heapless::String as HeaplessString;
use savings_core_api::{
    AccountView, CancellationReceipt, CancellationRequest, ChangeStatusRequest, LedgerError,
    LedgerResult, LedgerService, MovementReceipt, MovementRequest, OpenAccountRequest,
    TransactionView, WithdrawalDecision,
};
use savings_core_db::models::account::AccountModel;
use savings_core_db::repository::{AccountStore, TransactionLog};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::config::LedgerConfig;

/// Maps a repository failure to `InternalError`. The text is kept for logs
/// only; `LedgerError::reason()` never shows it.
pub(crate) fn storage_error(err: Box<dyn std::error::Error + Send + Sync>) -> LedgerError {
    LedgerError::internal(err.to_string())
}

pub(crate) fn bounded<const N: usize>(field: &str, value: &str) -> LedgerResult<HeaplessString<N>> {
    HeaplessString::try_from(value)
        .map_err(|_| LedgerError::validation(format!("{field} exceeds {N} bytes")))
}

pub(crate) fn bounded_opt<const N: usize>(
    field: &str,
    value: Option<&str>,
) -> LedgerResult<Option<HeaplessString<N>>> {
    value.map(|v| bounded(field, v)).transpose()
}

/// The ledger engine.
///
/// Generic over the two stores so the same orchestration runs against
/// PostgreSQL and against the in-process stores.
pub struct LedgerEngine<A, T> {
    accounts: Arc<A>,
    transactions: Arc<T>,
    config: LedgerConfig,
}

impl<A, T> Clone for LedgerEngine<A, T> {
    fn clone(&self) -> Self {
        Self {
            accounts: self.accounts.clone(),
            transactions: self.transactions.clone(),
            config: self.config.clone(),
        }
    }
}

impl<A, T> LedgerEngine<A, T>
where
    A: AccountStore + 'static,
    T: TransactionLog + 'static,
{
    pub fn new(accounts: Arc<A>, transactions: Arc<T>) -> Self {
        Self::with_config(accounts, transactions, LedgerConfig::default())
    }

    pub fn with_config(accounts: Arc<A>, transactions: Arc<T>, config: LedgerConfig) -> Self {
        Self {
            accounts,
            transactions,
            config,
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub(crate) async fn load_account(&self, account_id: Uuid) -> LedgerResult<AccountModel> {
        self.accounts
            .find_by_id(account_id)
            .await
            .map_err(storage_error)?
            .ok_or(LedgerError::AccountNotFound(account_id))
    }

    /// Runs `operation` on its own task and waits at most `deadline` for it.
    ///
    /// The task is not aborted when the deadline passes: the mutation either
    /// lands completely (swap plus record) or not at all, and the caller gets
    /// `UnknownOutcome` and must look the movement up by reference.
    async fn run_within<R, F, Fut>(&self, deadline: Duration, what: &str, operation: F) -> LedgerResult<R>
    where
        R: Send + 'static,
        F: FnOnce(Self) -> Fut,
        Fut: Future<Output = LedgerResult<R>> + Send + 'static,
    {
        let handle = tokio::spawn(operation(self.clone()));
        match tokio::time::timeout(deadline, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(LedgerError::internal(join_error.to_string())),
            Err(_) => {
                tracing::warn!(operation = what, deadline_ms = deadline.as_millis() as u64, "deadline elapsed");
                Err(LedgerError::UnknownOutcome(format!(
                    "{what} did not finish within {}ms; look it up by reference before retrying",
                    deadline.as_millis()
                )))
            }
        }
    }

    /// Deposit under an explicit deadline.
    pub async fn deposit_within(&self, request: MovementRequest, deadline: Duration) -> LedgerResult<MovementReceipt> {
        self.run_within(deadline, "deposit", |engine| async move { engine.deposit_now(request).await })
            .await
    }

    /// Withdrawal under an explicit deadline.
    pub async fn withdraw_within(&self, request: MovementRequest, deadline: Duration) -> LedgerResult<MovementReceipt> {
        self.run_within(deadline, "withdrawal", |engine| async move { engine.withdraw_now(request).await })
            .await
    }

    /// Cancellation under an explicit deadline.
    pub async fn cancel_within(
        &self,
        request: CancellationRequest,
        deadline: Duration,
    ) -> LedgerResult<CancellationReceipt> {
        self.run_within(deadline, "cancellation", |engine| async move {
            engine.cancel_now(request).await
        })
        .await
    }
}

#[async_trait]
impl<A, T> LedgerService for LedgerEngine<A, T>
where
    A: AccountStore + 'static,
    T: TransactionLog + 'static,
{
    async fn open_account(&self, request: OpenAccountRequest) -> LedgerResult<AccountView> {
        self.open_account_now(request).await
    }

    async fn get_account(&self, account_id: Uuid) -> LedgerResult<AccountView> {
        self.load_account(account_id).await.map(AccountView::from)
    }

    async fn change_status(&self, request: ChangeStatusRequest) -> LedgerResult<AccountView> {
        self.change_status_now(request).await
    }

    async fn deposit(&self, request: MovementRequest) -> LedgerResult<MovementReceipt> {
        match self.config.operation_timeout() {
            Some(deadline) => self.deposit_within(request, deadline).await,
            None => self.deposit_now(request).await,
        }
    }

    async fn withdraw(&self, request: MovementRequest) -> LedgerResult<MovementReceipt> {
        match self.config.operation_timeout() {
            Some(deadline) => self.withdraw_within(request, deadline).await,
            None => self.withdraw_now(request).await,
        }
    }

    async fn can_withdraw(&self, account_id: Uuid, amount: i64) -> LedgerResult<WithdrawalDecision> {
        if amount <= 0 {
            return Err(LedgerError::validation("amount must be positive"));
        }
        let account = self.load_account(account_id).await?;
        Ok(rules::withdrawal_decision(&account, amount))
    }

    async fn cancel_transaction(&self, request: CancellationRequest) -> LedgerResult<CancellationReceipt> {
        match self.config.operation_timeout() {
            Some(deadline) => self.cancel_within(request, deadline).await,
            None => self.cancel_now(request).await,
        }
    }

    async fn find_by_reference(&self, account_id: Uuid, reference: &str) -> LedgerResult<Option<TransactionView>> {
        let found = self
            .transactions
            .find_by_reference(account_id, reference)
            .await
            .map_err(storage_error)?;
        Ok(found.map(TransactionView::from))
    }
}
