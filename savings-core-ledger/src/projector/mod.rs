//! Read models over the account store and the transaction log.
//!
//! Nothing in here writes. Every report is computed from whatever the stores
//! return at query time, so a report racing with a movement may or may not
//! include it.

pub mod summary;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use savings_core_api::{
    average, AccountView, CustomerSummary, DailyReport, GlobalStatistics, HistoryPage,
    LedgerError, LedgerResult, Pagination, ReportService, TransactionView,
};
use savings_core_db::models::account::AccountModel;
use savings_core_db::repository::{
    AccountFilter, AccountStore, PageRequest, TransactionFilter, TransactionLog,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::LedgerConfig;
use crate::engine::storage_error;

pub struct ReadModelProjector<A, T> {
    accounts: Arc<A>,
    transactions: Arc<T>,
    config: LedgerConfig,
}

impl<A, T> Clone for ReadModelProjector<A, T> {
    fn clone(&self) -> Self {
        Self {
            accounts: self.accounts.clone(),
            transactions: self.transactions.clone(),
            config: self.config.clone(),
        }
    }
}

impl<A, T> ReadModelProjector<A, T>
where
    A: AccountStore,
    T: TransactionLog,
{
    pub fn new(accounts: Arc<A>, transactions: Arc<T>, config: LedgerConfig) -> Self {
        Self {
            accounts,
            transactions,
            config,
        }
    }

    async fn ensure_account(&self, account_id: Uuid) -> LedgerResult<AccountModel> {
        self.accounts
            .find_by_id(account_id)
            .await
            .map_err(storage_error)?
            .ok_or(LedgerError::AccountNotFound(account_id))
    }

    async fn scan_accounts(&self, filter: AccountFilter) -> LedgerResult<Vec<AccountModel>> {
        self.accounts.scan_accounts(filter).await.map_err(storage_error)
    }
}

/// `[00:00, 24:00)` of `date` in UTC.
fn utc_day(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
    (start, start + Duration::days(1))
}

#[async_trait]
impl<A, T> ReportService for ReadModelProjector<A, T>
where
    A: AccountStore,
    T: TransactionLog,
{
    #[tracing::instrument(skip(self), err)]
    async fn get_history(&self, account_id: Uuid, page: usize, limit: Option<usize>) -> LedgerResult<HistoryPage> {
        if page == 0 {
            return Err(LedgerError::validation("page numbers start at 1"));
        }
        self.ensure_account(account_id).await?;

        let request = PageRequest::clamped(
            page,
            limit.unwrap_or(self.config.default_page_limit),
            self.config.max_page_limit,
        );
        let found = self
            .transactions
            .load_history(account_id, request)
            .await
            .map_err(storage_error)?;

        let pagination = Pagination {
            page,
            limit: found.limit,
            total: found.total,
            pages: found.total_pages(),
        };
        Ok(HistoryPage {
            account_id,
            transactions: found.items.into_iter().map(TransactionView::from).collect(),
            pagination,
        })
    }

    async fn get_low_balance_accounts(&self, threshold: i64) -> LedgerResult<Vec<AccountView>> {
        let accounts = self.scan_accounts(AccountFilter::low_balance(threshold)).await?;
        tracing::debug!(threshold, found = accounts.len(), "low balance scan");
        Ok(accounts.into_iter().map(AccountView::from).collect())
    }

    async fn get_daily_report(&self, date: NaiveDate) -> LedgerResult<DailyReport> {
        let (from, to) = utc_day(date);
        let records = self
            .transactions
            .scan_transactions(TransactionFilter::all().between(Some(from), Some(to)))
            .await
            .map_err(storage_error)?;

        Ok(DailyReport {
            date,
            summary: summary::summarize(&records),
            transactions: records.into_iter().map(TransactionView::from).collect(),
        })
    }

    async fn get_customer_summary(
        &self,
        customer_id: Uuid,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> LedgerResult<CustomerSummary> {
        let accounts = self.scan_accounts(AccountFilter::for_customer(customer_id)).await?;
        let records = self
            .transactions
            .scan_transactions(TransactionFilter::for_customer(customer_id).between(start, end))
            .await
            .map_err(storage_error)?;

        Ok(CustomerSummary {
            customer_id,
            start,
            end,
            account_count: accounts.len() as u64,
            total_balance: summary::total_balance(&accounts),
            totals: summary::summarize(&records),
        })
    }

    async fn get_global_statistics(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> LedgerResult<GlobalStatistics> {
        let accounts = self.scan_accounts(AccountFilter::all()).await?;
        let records = self
            .transactions
            .scan_transactions(TransactionFilter::all().between(start, end))
            .await
            .map_err(storage_error)?;

        let counts = summary::count_accounts(&accounts);
        let total_balance = summary::total_balance(&accounts);
        Ok(GlobalStatistics {
            accounts: counts,
            total_balance,
            average_balance: average(total_balance, counts.total),
            transactions: summary::summarize(&records),
        })
    }
}
