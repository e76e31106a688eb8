use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use savings_core_api::AccountStatus;
use std::collections::HashMap;
use std::error::Error;
use uuid::Uuid;

use crate::models::account::AccountModel;
use crate::repository::{
    AccountFilter, CompareAndSwap, CreateBatch, FindById, LoadBatch, ScanAccounts, SwapOutcome,
    UpdateStatus,
};

/// Process-local account store.
///
/// Every conditional write happens under one write lock, which gives the same
/// atomicity as a single conditional `UPDATE`. No lock is held across an await.
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    accounts: RwLock<HashMap<Uuid, AccountModel>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.accounts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.read().is_empty()
    }

    fn conditional_write(
        &self,
        account_id: Uuid,
        expected_version: i64,
        apply: impl FnOnce(&mut AccountModel),
    ) -> SwapOutcome {
        let mut accounts = self.accounts.write();
        let Some(account) = accounts.get_mut(&account_id) else {
            return SwapOutcome::NotFound;
        };
        if account.version != expected_version {
            return SwapOutcome::VersionConflict;
        }
        apply(account);
        account.version += 1;
        SwapOutcome::Swapped(account.clone())
    }
}

#[async_trait]
impl FindById<AccountModel> for InMemoryAccountStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AccountModel>, Box<dyn Error + Send + Sync>> {
        Ok(self.accounts.read().get(&id).cloned())
    }
}

#[async_trait]
impl LoadBatch<AccountModel> for InMemoryAccountStore {
    async fn load_batch(&self, ids: &[Uuid]) -> Result<Vec<Option<AccountModel>>, Box<dyn Error + Send + Sync>> {
        let accounts = self.accounts.read();
        Ok(ids.iter().map(|id| accounts.get(id).cloned()).collect())
    }
}

#[async_trait]
impl CreateBatch<AccountModel> for InMemoryAccountStore {
    async fn create_batch(
        &self,
        items: Vec<AccountModel>,
    ) -> Result<Vec<AccountModel>, Box<dyn Error + Send + Sync>> {
        let mut accounts = self.accounts.write();
        if let Some(duplicate) = items.iter().find(|item| accounts.contains_key(&item.id)) {
            return Err(format!("Account {} already exists", duplicate.id).into());
        }
        for item in &items {
            accounts.insert(item.id, item.clone());
        }
        Ok(items)
    }
}

#[async_trait]
impl CompareAndSwap for InMemoryAccountStore {
    async fn compare_and_swap(
        &self,
        account_id: Uuid,
        expected_version: i64,
        new_balance: i64,
        last_transaction_date: DateTime<Utc>,
    ) -> Result<SwapOutcome, Box<dyn Error + Send + Sync>> {
        Ok(self.conditional_write(account_id, expected_version, |account| {
            account.balance = new_balance;
            account.last_transaction_date = Some(last_transaction_date);
        }))
    }
}

#[async_trait]
impl UpdateStatus for InMemoryAccountStore {
    async fn update_status(
        &self,
        account_id: Uuid,
        expected_version: i64,
        status: AccountStatus,
    ) -> Result<SwapOutcome, Box<dyn Error + Send + Sync>> {
        Ok(self.conditional_write(account_id, expected_version, |account| {
            account.status = status;
        }))
    }
}

#[async_trait]
impl ScanAccounts for InMemoryAccountStore {
    async fn scan_accounts(
        &self,
        filter: AccountFilter,
    ) -> Result<Vec<AccountModel>, Box<dyn Error + Send + Sync>> {
        let mut items: Vec<AccountModel> = self
            .accounts
            .read()
            .values()
            .filter(|account| filter.matches(account))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.balance.cmp(&b.balance).then(a.id.cmp(&b.id)));
        Ok(items)
    }
}
