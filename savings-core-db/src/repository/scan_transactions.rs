use async_trait::async_trait;
use chrono::{DateTime, Utc};
use savings_core_api::TransactionStatus;
use uuid::Uuid;

use crate::models::transaction::TransactionModel;

/// Filter for transaction scans. Unset fields do not constrain the scan.
///
/// The creation window is half open: `created_from <= created_at < created_to`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub account_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub status: Option<TransactionStatus>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

impl TransactionFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_account(account_id: Uuid) -> Self {
        Self {
            account_id: Some(account_id),
            ..Self::default()
        }
    }

    pub fn for_customer(customer_id: Uuid) -> Self {
        Self {
            customer_id: Some(customer_id),
            ..Self::default()
        }
    }

    pub fn between(mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        self.created_from = from;
        self.created_to = to;
        self
    }

    pub fn matches(&self, item: &TransactionModel) -> bool {
        self.account_id.map_or(true, |id| item.account_id == id)
            && self.customer_id.map_or(true, |id| item.customer_id == id)
            && self.status.map_or(true, |status| item.status == status)
            && self.created_from.map_or(true, |from| item.created_at >= from)
            && self.created_to.map_or(true, |to| item.created_at < to)
    }
}

/// Read-only scan over the transaction log
///
/// Results are ordered by `created_at` descending, ties broken by
/// `account_version` descending.
#[async_trait]
pub trait ScanTransactions: Send + Sync {
    async fn scan_transactions(
        &self,
        filter: TransactionFilter,
    ) -> Result<Vec<TransactionModel>, Box<dyn std::error::Error + Send + Sync>>;
}
