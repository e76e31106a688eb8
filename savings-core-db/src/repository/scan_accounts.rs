use async_trait::async_trait;
use savings_core_api::AccountStatus;
use uuid::Uuid;

use crate::models::account::AccountModel;

/// Filter for account scans. Unset fields do not constrain the scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountFilter {
    pub customer_id: Option<Uuid>,
    pub status: Option<AccountStatus>,
    /// Strict upper bound on the balance
    pub balance_below: Option<i64>,
}

impl AccountFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_customer(customer_id: Uuid) -> Self {
        Self {
            customer_id: Some(customer_id),
            ..Self::default()
        }
    }

    /// Active accounts whose balance is strictly below `threshold`.
    pub fn low_balance(threshold: i64) -> Self {
        Self {
            status: Some(AccountStatus::Active),
            balance_below: Some(threshold),
            ..Self::default()
        }
    }

    pub fn matches(&self, account: &AccountModel) -> bool {
        self.customer_id.map_or(true, |id| account.customer_id == id)
            && self.status.map_or(true, |status| account.status == status)
            && self.balance_below.map_or(true, |limit| account.balance < limit)
    }
}

/// Read-only scan over accounts, ordered by balance ascending then id
#[async_trait]
pub trait ScanAccounts: Send + Sync {
    async fn scan_accounts(
        &self,
        filter: AccountFilter,
    ) -> Result<Vec<AccountModel>, Box<dyn std::error::Error + Send + Sync>>;
}
