use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use savings_core_api::TransactionStatus;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::error::Error;
use uuid::Uuid;

use crate::models::transaction::{CancellationMetadata, TransactionModel};
use crate::repository::{
    CancellationClaim, ClaimOutcome, CreateBatch, FindById, FindByReference, LoadHistory, Page,
    PageRequest, ScanTransactions, TransactionFilter,
};

#[derive(Debug, Default)]
struct LogState {
    records: HashMap<Uuid, TransactionModel>,
    references: HashMap<(Uuid, String), Uuid>,
}

/// Process-local transaction log with the same uniqueness rules as the
/// `ledger_transaction` table: unique ids and unique `(account_id, reference)`.
#[derive(Debug, Default)]
pub struct InMemoryTransactionLog {
    state: RwLock<LogState>,
}

/// Newest first; within the same instant the higher account version first.
fn history_order(a: &TransactionModel, b: &TransactionModel) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then(b.account_version.cmp(&a.account_version))
        .then(a.id.cmp(&b.id))
}

impl InMemoryTransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().records.is_empty()
    }

    fn ordered(&self, filter: &TransactionFilter) -> Vec<TransactionModel> {
        let mut items: Vec<TransactionModel> = self
            .state
            .read()
            .records
            .values()
            .filter(|item| filter.matches(item))
            .cloned()
            .collect();
        items.sort_by(history_order);
        items
    }
}

#[async_trait]
impl FindById<TransactionModel> for InMemoryTransactionLog {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<TransactionModel>, Box<dyn Error + Send + Sync>> {
        Ok(self.state.read().records.get(&id).cloned())
    }
}

#[async_trait]
impl CreateBatch<TransactionModel> for InMemoryTransactionLog {
    async fn create_batch(
        &self,
        items: Vec<TransactionModel>,
    ) -> Result<Vec<TransactionModel>, Box<dyn Error + Send + Sync>> {
        let mut state = self.state.write();

        for (position, item) in items.iter().enumerate() {
            if state.records.contains_key(&item.id) {
                return Err(format!("Transaction {} already exists", item.id).into());
            }
            if let Some(reference) = item.reference_str() {
                let key = (item.account_id, reference.to_string());
                let repeated_in_batch = items[..position]
                    .iter()
                    .any(|other| other.account_id == item.account_id && other.reference_str() == Some(reference));
                if state.references.contains_key(&key) || repeated_in_batch {
                    return Err(format!(
                        "Reference '{reference}' already used on account {}",
                        item.account_id
                    )
                    .into());
                }
            }
        }

        for item in &items {
            if let Some(reference) = item.reference_str() {
                state
                    .references
                    .insert((item.account_id, reference.to_string()), item.id);
            }
            state.records.insert(item.id, item.clone());
        }
        Ok(items)
    }
}

#[async_trait]
impl FindByReference for InMemoryTransactionLog {
    async fn find_by_reference(
        &self,
        account_id: Uuid,
        reference: &str,
    ) -> Result<Option<TransactionModel>, Box<dyn Error + Send + Sync>> {
        let state = self.state.read();
        Ok(state
            .references
            .get(&(account_id, reference.to_string()))
            .and_then(|id| state.records.get(id))
            .cloned())
    }
}

#[async_trait]
impl LoadHistory for InMemoryTransactionLog {
    async fn load_history(
        &self,
        account_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<TransactionModel>, Box<dyn Error + Send + Sync>> {
        let all = self.ordered(&TransactionFilter::for_account(account_id));
        Ok(Page::from_ordered(all, page))
    }
}

#[async_trait]
impl ScanTransactions for InMemoryTransactionLog {
    async fn scan_transactions(
        &self,
        filter: TransactionFilter,
    ) -> Result<Vec<TransactionModel>, Box<dyn Error + Send + Sync>> {
        Ok(self.ordered(&filter))
    }
}

#[async_trait]
impl CancellationClaim for InMemoryTransactionLog {
    async fn claim_cancellation(
        &self,
        transaction_id: Uuid,
        claim_id: Uuid,
    ) -> Result<ClaimOutcome, Box<dyn Error + Send + Sync>> {
        let mut state = self.state.write();
        let Some(item) = state.records.get_mut(&transaction_id) else {
            return Ok(ClaimOutcome::NotFound);
        };
        if item.status == TransactionStatus::Cancelled {
            return Ok(ClaimOutcome::AlreadyCancelled);
        }
        if item.cancellation_claim.is_some() {
            return Ok(ClaimOutcome::InProgress);
        }
        item.cancellation_claim = Some(claim_id);
        item.cancellation_claimed_at = Some(Utc::now());
        Ok(ClaimOutcome::Claimed(item.clone()))
    }

    async fn release_cancellation(
        &self,
        transaction_id: Uuid,
        claim_id: Uuid,
    ) -> Result<bool, Box<dyn Error + Send + Sync>> {
        let mut state = self.state.write();
        match state.records.get_mut(&transaction_id) {
            Some(item)
                if item.status == TransactionStatus::Completed
                    && item.cancellation_claim == Some(claim_id) =>
            {
                item.cancellation_claim = None;
                item.cancellation_claimed_at = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn complete_cancellation(
        &self,
        transaction_id: Uuid,
        claim_id: Uuid,
        metadata: CancellationMetadata,
    ) -> Result<Option<TransactionModel>, Box<dyn Error + Send + Sync>> {
        let mut state = self.state.write();
        match state.records.get_mut(&transaction_id) {
            Some(item)
                if item.status == TransactionStatus::Completed
                    && item.cancellation_claim == Some(claim_id) =>
            {
                item.status = TransactionStatus::Cancelled;
                item.cancellation = Some(metadata);
                Ok(Some(item.clone()))
            }
            _ => Ok(None),
        }
    }
}
