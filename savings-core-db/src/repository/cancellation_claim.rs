use async_trait::async_trait;
use uuid::Uuid;

use crate::models::transaction::{CancellationMetadata, TransactionModel};

/// Result of trying to reserve a transaction for cancellation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The claim was recorded; carries the claimed record.
    Claimed(TransactionModel),
    AlreadyCancelled,
    /// Another request holds the claim.
    InProgress,
    NotFound,
}

/// Conditional writes that drive a transaction from `Completed` to `Cancelled`
///
/// A cancellation happens in three steps so that concurrent duplicate requests
/// apply the compensating entry at most once:
/// 1. `claim_cancellation` sets the claim token only if the record is completed
///    and unclaimed. Exactly one concurrent caller wins.
/// 2. The winner applies the compensating balance swap.
/// 3. `complete_cancellation` flips the status and stores the metadata, only if
///    the claim token still matches. If step 2 failed instead,
///    `release_cancellation` clears the token and leaves the record completed.
#[async_trait]
pub trait CancellationClaim: Send + Sync {
    async fn claim_cancellation(
        &self,
        transaction_id: Uuid,
        claim_id: Uuid,
    ) -> Result<ClaimOutcome, Box<dyn std::error::Error + Send + Sync>>;

    /// Returns false when the claim was not held by `claim_id`.
    async fn release_cancellation(
        &self,
        transaction_id: Uuid,
        claim_id: Uuid,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;

    /// Returns the cancelled record, or None when the claim was not held by `claim_id`.
    async fn complete_cancellation(
        &self,
        transaction_id: Uuid,
        claim_id: Uuid,
        metadata: CancellationMetadata,
    ) -> Result<Option<TransactionModel>, Box<dyn std::error::Error + Send + Sync>>;
}
