use chrono::{DateTime, Utc};
use heapless::String as HeaplessString;
use savings_core_api::{
    CancellationView, TransactionStatus, TransactionType, TransactionView, MAX_REFERENCE_LEN,
    MAX_TEXT_LEN,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::identifiable::Identifiable;
use crate::utils::hash_as_i64;

/// Evidence of a cancellation, set once when the transaction flips to `Cancelled`.
///
/// The balance snapshots and version belong to the compensating entry that
/// applied the inverse amount, not to the original movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationMetadata {
    pub reason: HeaplessString<MAX_TEXT_LEN>,
    pub cancelled_by: Uuid,
    pub cancelled_at: DateTime<Utc>,
    pub balance_before: i64,
    pub balance_after: i64,
    pub account_version: i64,
}

/// One balance mutation of one account.
///
/// Everything except `status`, `cancellation` and the claim fields is
/// fixed at creation and covered by `hash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionModel {
    pub id: Uuid,
    pub account_id: Uuid,
    pub customer_id: Uuid,
    pub transaction_type: TransactionType,
    pub amount: i64,
    pub balance_before: i64,
    pub balance_after: i64,
    pub status: TransactionStatus,
    pub reference: Option<HeaplessString<MAX_REFERENCE_LEN>>,
    pub description: Option<HeaplessString<MAX_TEXT_LEN>>,
    pub processed_by: Uuid,
    /// Account version produced by this mutation
    pub account_version: i64,
    pub created_at: DateTime<Utc>,
    pub cancellation: Option<CancellationMetadata>,
    /// Token of an in-flight cancellation; cleared again if it fails
    pub cancellation_claim: Option<Uuid>,
    /// When `cancellation_claim` was taken
    pub cancellation_claimed_at: Option<DateTime<Utc>>,
    /// XxHash64 of the immutable fields
    pub hash: i64,
}

#[derive(Serialize)]
struct ImmutableFields<'a> {
    id: &'a Uuid,
    account_id: &'a Uuid,
    customer_id: &'a Uuid,
    transaction_type: &'a TransactionType,
    amount: i64,
    balance_before: i64,
    balance_after: i64,
    reference: Option<&'a str>,
    description: Option<&'a str>,
    processed_by: &'a Uuid,
    account_version: i64,
    created_at: i64,
}

impl TransactionModel {
    /// Builds a completed record for a swap that moved `balance_before` to
    /// `balance_after` and produced `account_version`.
    #[allow(clippy::too_many_arguments)]
    pub fn completed(
        account_id: Uuid,
        customer_id: Uuid,
        transaction_type: TransactionType,
        amount: i64,
        balance_before: i64,
        balance_after: i64,
        account_version: i64,
        processed_by: Uuid,
        reference: Option<HeaplessString<MAX_REFERENCE_LEN>>,
        description: Option<HeaplessString<MAX_TEXT_LEN>>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, String> {
        let mut item = Self {
            id: Uuid::new_v4(),
            account_id,
            customer_id,
            transaction_type,
            amount,
            balance_before,
            balance_after,
            status: TransactionStatus::Completed,
            reference,
            description,
            processed_by,
            account_version,
            created_at,
            cancellation: None,
            cancellation_claim: None,
            cancellation_claimed_at: None,
            hash: 0,
        };
        item.hash = item.compute_hash()?;
        Ok(item)
    }

    pub fn compute_hash(&self) -> Result<i64, String> {
        hash_as_i64(&ImmutableFields {
            id: &self.id,
            account_id: &self.account_id,
            customer_id: &self.customer_id,
            transaction_type: &self.transaction_type,
            amount: self.amount,
            balance_before: self.balance_before,
            balance_after: self.balance_after,
            reference: self.reference.as_ref().map(|s| s.as_str()),
            description: self.description.as_ref().map(|s| s.as_str()),
            processed_by: &self.processed_by,
            account_version: self.account_version,
            created_at: self.created_at.timestamp_micros(),
        })
    }

    /// True when the stored hash still matches the immutable fields.
    pub fn verify_hash(&self) -> bool {
        self.compute_hash().map(|h| h == self.hash).unwrap_or(false)
    }

    /// Checks `balance_after` against `balance_before` and the signed amount.
    pub fn snapshots_agree(&self) -> bool {
        self.balance_before
            .checked_add(self.signed_amount())
            .map(|expected| expected == self.balance_after)
            .unwrap_or(false)
    }

    pub fn signed_amount(&self) -> i64 {
        self.transaction_type.signed(self.amount)
    }

    pub fn is_completed(&self) -> bool {
        self.status == TransactionStatus::Completed
    }

    pub fn reference_str(&self) -> Option<&str> {
        self.reference.as_ref().map(|s| s.as_str())
    }
}

impl Identifiable for TransactionModel {
    fn get_id(&self) -> Uuid {
        self.id
    }
}

impl From<&CancellationMetadata> for CancellationView {
    fn from(metadata: &CancellationMetadata) -> Self {
        CancellationView {
            reason: metadata.reason.to_string(),
            cancelled_by: metadata.cancelled_by,
            cancelled_at: metadata.cancelled_at,
            balance_before: metadata.balance_before,
            balance_after: metadata.balance_after,
            account_version: metadata.account_version,
        }
    }
}

impl From<&TransactionModel> for TransactionView {
    fn from(item: &TransactionModel) -> Self {
        TransactionView {
            id: item.id,
            account_id: item.account_id,
            customer_id: item.customer_id,
            transaction_type: item.transaction_type,
            amount: item.amount,
            balance_before: item.balance_before,
            balance_after: item.balance_after,
            status: item.status,
            reference: item.reference.as_ref().map(|s| s.to_string()),
            description: item.description.as_ref().map(|s| s.to_string()),
            processed_by: item.processed_by,
            account_version: item.account_version,
            created_at: item.created_at,
            cancellation: item.cancellation.as_ref().map(CancellationView::from),
        }
    }
}

impl From<TransactionModel> for TransactionView {
    fn from(item: TransactionModel) -> Self {
        TransactionView::from(&item)
    }
}
