use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::views::TransactionView;

/// Pagination metadata returned with every history page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// 1-based page number
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub pages: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPage {
    pub account_id: Uuid,
    pub transactions: Vec<TransactionView>,
    pub pagination: Pagination,
}

/// Count, sum and mean of the completed transactions of one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TypeTotals {
    pub count: u64,
    pub total: i64,
    pub average: Decimal,
}

impl TypeTotals {
    pub fn from_parts(count: u64, total: i64) -> Self {
        Self {
            count,
            total,
            average: average(total, count),
        }
    }
}

/// Mean in minor units, rounded half-away-from-zero to two decimal places.
pub fn average(total: i64, count: u64) -> Decimal {
    if count == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(total) / Decimal::from(count))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReportSummary {
    pub transaction_count: u64,
    pub deposits: TypeTotals,
    pub withdrawals: TypeTotals,
    pub cancelled_count: u64,
    /// Completed deposits minus completed withdrawals
    pub net: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub transactions: Vec<TransactionView>,
    pub summary: ReportSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSummary {
    pub customer_id: Uuid,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub account_count: u64,
    pub total_balance: i64,
    pub totals: ReportSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountCounts {
    pub total: u64,
    pub active: u64,
    pub suspended: u64,
    pub closed: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalStatistics {
    pub accounts: AccountCounts,
    pub total_balance: i64,
    pub average_balance: Decimal,
    pub transactions: ReportSummary,
}
