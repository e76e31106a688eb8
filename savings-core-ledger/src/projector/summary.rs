//! Folds over transaction records.

use savings_core_api::{AccountCounts, AccountStatus, ReportSummary, TransactionStatus, TransactionType, TypeTotals};
use savings_core_db::models::{account::AccountModel, transaction::TransactionModel};

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    count: u64,
    total: i64,
}

impl Tally {
    fn add(&mut self, amount: i64) {
        self.count += 1;
        self.total = self.total.saturating_add(amount);
    }

    fn totals(self) -> TypeTotals {
        TypeTotals::from_parts(self.count, self.total)
    }
}

/// Per-type totals over completed records; cancelled ones are only counted.
pub fn summarize<'a>(records: impl IntoIterator<Item = &'a TransactionModel>) -> ReportSummary {
    let mut deposits = Tally::default();
    let mut withdrawals = Tally::default();
    let mut transaction_count = 0u64;
    let mut cancelled_count = 0u64;

    for record in records {
        transaction_count += 1;
        if record.status == TransactionStatus::Cancelled {
            cancelled_count += 1;
            continue;
        }
        match record.transaction_type {
            TransactionType::Deposit => deposits.add(record.amount),
            TransactionType::Withdrawal => withdrawals.add(record.amount),
        }
    }

    ReportSummary {
        transaction_count,
        deposits: deposits.totals(),
        withdrawals: withdrawals.totals(),
        cancelled_count,
        net: deposits.total.saturating_sub(withdrawals.total),
    }
}

pub fn count_accounts<'a>(accounts: impl IntoIterator<Item = &'a AccountModel>) -> AccountCounts {
    accounts.into_iter().fold(AccountCounts::default(), |mut counts, account| {
        counts.total += 1;
        match account.status {
            AccountStatus::Active => counts.active += 1,
            AccountStatus::Suspended => counts.suspended += 1,
            AccountStatus::Closed => counts.closed += 1,
        }
        counts
    })
}

pub fn total_balance<'a>(accounts: impl IntoIterator<Item = &'a AccountModel>) -> i64 {
    accounts
        .into_iter()
        .fold(0i64, |sum, account| sum.saturating_add(account.balance))
}
