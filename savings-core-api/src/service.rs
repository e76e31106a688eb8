use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::{
    AccountView, CancellationReceipt, CancellationRequest, ChangeStatusRequest, CustomerSummary,
    DailyReport, GlobalStatistics, HistoryPage, MovementReceipt, MovementRequest,
    OpenAccountRequest, TransactionView, WithdrawalDecision,
};
use crate::error::LedgerResult;

/// Mutating entry points of the ledger.
///
/// Callers supply an authenticated actor and validated numbers; the ledger
/// still re-validates and returns typed errors rather than panicking.
#[async_trait]
pub trait LedgerService: Send + Sync {
    async fn open_account(&self, request: OpenAccountRequest) -> LedgerResult<AccountView>;

    async fn get_account(&self, account_id: Uuid) -> LedgerResult<AccountView>;

    async fn change_status(&self, request: ChangeStatusRequest) -> LedgerResult<AccountView>;

    async fn deposit(&self, request: MovementRequest) -> LedgerResult<MovementReceipt>;

    async fn withdraw(&self, request: MovementRequest) -> LedgerResult<MovementReceipt>;

    async fn can_withdraw(&self, account_id: Uuid, amount: i64) -> LedgerResult<WithdrawalDecision>;

    async fn cancel_transaction(
        &self,
        request: CancellationRequest,
    ) -> LedgerResult<CancellationReceipt>;

    /// Lookup used after an `UnknownOutcome` before retrying a movement.
    async fn find_by_reference(
        &self,
        account_id: Uuid,
        reference: &str,
    ) -> LedgerResult<Option<TransactionView>>;
}

/// Read-only projections over the ledger.
#[async_trait]
pub trait ReportService: Send + Sync {
    async fn get_history(
        &self,
        account_id: Uuid,
        page: usize,
        limit: Option<usize>,
    ) -> LedgerResult<HistoryPage>;

    async fn get_low_balance_accounts(&self, threshold: i64) -> LedgerResult<Vec<AccountView>>;

    async fn get_daily_report(&self, date: NaiveDate) -> LedgerResult<DailyReport>;

    async fn get_customer_summary(
        &self,
        customer_id: Uuid,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> LedgerResult<CustomerSummary>;

    async fn get_global_statistics(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> LedgerResult<GlobalStatistics>;
}
