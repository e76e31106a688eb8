use chrono::{DateTime, Utc};
use savings_core_api::{CancellationReceipt, CancellationRequest, LedgerError, LedgerResult, MAX_TEXT_LEN};
use savings_core_db::models::transaction::{CancellationMetadata, TransactionModel};
use savings_core_db::repository::{AccountStore, ClaimOutcome, SwapOutcome, TransactionLog};
use uuid::Uuid;
use validator::Validate;

use super::retry::Backoff;
use super::{bounded, rules, storage_error, LedgerEngine};

/// The compensating swap of a cancellation.
struct Compensation {
    balance_before: i64,
    balance_after: i64,
    account_version: i64,
    at: DateTime<Utc>,
}

impl<A, T> LedgerEngine<A, T>
where
    A: AccountStore + 'static,
    T: TransactionLog + 'static,
{
    /// Claim, compensate, complete.
    ///
    /// The claim makes the cancellation exclusive: of several concurrent
    /// requests for the same transaction exactly one reaches the compensating
    /// swap. A failed swap releases the claim again.
    #[tracing::instrument(skip(self, request), fields(transaction_id = %request.transaction_id))]
    pub(crate) async fn cancel_now(&self, request: CancellationRequest) -> LedgerResult<CancellationReceipt> {
        request.validate()?;
        let reason = bounded::<MAX_TEXT_LEN>("reason", &request.reason)?;
        let transaction_id = request.transaction_id;
        let claim_id = Uuid::new_v4();

        let original = match self
            .transactions
            .claim_cancellation(transaction_id, claim_id)
            .await
            .map_err(storage_error)?
        {
            ClaimOutcome::Claimed(original) => original,
            ClaimOutcome::AlreadyCancelled => {
                tracing::info!("transaction already cancelled");
                return Err(LedgerError::AlreadyCancelled(transaction_id));
            }
            ClaimOutcome::InProgress => {
                tracing::info!("cancellation already in progress");
                return Err(LedgerError::CancellationInProgress(transaction_id));
            }
            ClaimOutcome::NotFound => return Err(LedgerError::TransactionNotFound(transaction_id)),
        };

        let compensation = match self.compensate(&original).await {
            Ok(compensation) => compensation,
            Err(err) => {
                self.release_claim(transaction_id, claim_id).await;
                return Err(err);
            }
        };

        let metadata = CancellationMetadata {
            reason,
            cancelled_by: request.actor,
            cancelled_at: compensation.at,
            balance_before: compensation.balance_before,
            balance_after: compensation.balance_after,
            account_version: compensation.account_version,
        };

        let detail = match self
            .transactions
            .complete_cancellation(transaction_id, claim_id, metadata)
            .await
        {
            Ok(Some(cancelled)) => {
                tracing::info!(
                    account_id = %cancelled.account_id,
                    new_balance = compensation.balance_after,
                    account_version = compensation.account_version,
                    "transaction cancelled"
                );
                return Ok(CancellationReceipt {
                    transaction_id,
                    account_id: cancelled.account_id,
                    new_balance: compensation.balance_after,
                    account_version: compensation.account_version,
                });
            }
            Ok(None) => "cancellation claim was lost before completion".to_string(),
            Err(err) => err.to_string(),
        };

        tracing::error!(
            account_id = %original.account_id,
            account_version = compensation.account_version,
            balance_before = compensation.balance_before,
            balance_after = compensation.balance_after,
            detail = %detail,
            "compensating swap applied but cancellation was not recorded; account needs reconciliation"
        );
        Err(LedgerError::InconsistentWrite {
            account_id: original.account_id,
            account_version: compensation.account_version,
            detail,
        })
    }

    /// Applies the inverse of `original` to the current balance.
    async fn compensate(&self, original: &TransactionModel) -> LedgerResult<Compensation> {
        let account_id = original.account_id;
        let mut backoff = Backoff::new(&self.config);
        loop {
            let account = self.load_account(account_id).await?;
            let restored = rules::balance_after_compensation(&account, original.signed_amount())
                .inspect_err(|err| tracing::info!(reason = %err, "cancellation refused"))?;
            let at = Utc::now();

            match self
                .accounts
                .compare_and_swap(account_id, account.version, restored, at)
                .await
                .map_err(storage_error)?
            {
                SwapOutcome::Swapped(updated) => {
                    return Ok(Compensation {
                        balance_before: account.balance,
                        balance_after: updated.balance,
                        account_version: updated.version,
                        at,
                    })
                }
                SwapOutcome::VersionConflict => backoff.wait(account_id).await?,
                SwapOutcome::NotFound => return Err(LedgerError::AccountNotFound(account_id)),
            }
        }
    }

    async fn release_claim(&self, transaction_id: Uuid, claim_id: Uuid) {
        match self.transactions.release_cancellation(transaction_id, claim_id).await {
            Ok(true) => tracing::debug!("cancellation claim released"),
            Ok(false) => tracing::warn!(%claim_id, "cancellation claim was already gone"),
            // Nothing moved; the reconciler lists the claim as stale.
            Err(err) => tracing::warn!(%claim_id, error = %err, "failed to release cancellation claim"),
        }
    }
}
