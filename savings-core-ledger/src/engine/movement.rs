use chrono::Utc;
use savings_core_api::{
    LedgerError, LedgerResult, MovementReceipt, MovementRequest, TransactionStatus,
    TransactionType, MAX_REFERENCE_LEN, MAX_TEXT_LEN,
};
use savings_core_db::models::account::AccountModel;
use savings_core_db::models::transaction::{CancellationMetadata, TransactionModel};
use savings_core_db::repository::{AccountStore, SwapOutcome, TransactionLog};
use validator::Validate;

use super::retry::Backoff;
use super::{bounded, bounded_opt, rules, storage_error, LedgerEngine};

fn receipt(record: &TransactionModel, replayed: bool) -> MovementReceipt {
    MovementReceipt {
        transaction_id: record.id,
        account_id: record.account_id,
        new_balance: record.balance_after,
        account_version: record.account_version,
        replayed,
    }
}

/// A reference already on file answers the request only when it describes
/// the same movement.
fn replay(existing: &TransactionModel, kind: TransactionType, amount: i64) -> LedgerResult<MovementReceipt> {
    if existing.transaction_type == kind && existing.amount == amount {
        Ok(receipt(existing, true))
    } else {
        Err(LedgerError::validation(format!(
            "reference '{}' is already used by a different movement",
            existing.reference_str().unwrap_or_default()
        )))
    }
}

impl<A, T> LedgerEngine<A, T>
where
    A: AccountStore + 'static,
    T: TransactionLog + 'static,
{
    #[tracing::instrument(skip(self, request), fields(account_id = %request.account_id, amount = request.amount))]
    pub(crate) async fn deposit_now(&self, request: MovementRequest) -> LedgerResult<MovementReceipt> {
        self.apply_movement(request, TransactionType::Deposit).await
    }

    #[tracing::instrument(skip(self, request), fields(account_id = %request.account_id, amount = request.amount))]
    pub(crate) async fn withdraw_now(&self, request: MovementRequest) -> LedgerResult<MovementReceipt> {
        self.apply_movement(request, TransactionType::Withdrawal).await
    }

    async fn apply_movement(&self, request: MovementRequest, kind: TransactionType) -> LedgerResult<MovementReceipt> {
        request.validate()?;
        let reference = bounded_opt::<MAX_REFERENCE_LEN>("reference", request.reference.as_deref())?;
        let description = bounded_opt::<MAX_TEXT_LEN>("description", request.description.as_deref())?;
        let account_id = request.account_id;

        if let Some(reference) = reference.as_ref() {
            let existing = self
                .transactions
                .find_by_reference(account_id, reference.as_str())
                .await
                .map_err(storage_error)?;
            if let Some(existing) = existing {
                tracing::info!(transaction_id = %existing.id, "reference already recorded, replaying");
                return replay(&existing, kind, request.amount);
            }
        }

        let mut backoff = Backoff::new(&self.config);
        loop {
            let account = self.load_account(account_id).await?;
            let new_balance = match kind {
                TransactionType::Deposit => rules::balance_after_deposit(&account, request.amount),
                TransactionType::Withdrawal => rules::balance_after_withdrawal(&account, request.amount),
            }
            .inspect_err(|err| tracing::info!(reason = %err, "movement refused"))?;

            // Sealed before the swap so nothing can fail between swap and append
            // except the append itself.
            let record = TransactionModel::completed(
                account_id,
                account.customer_id,
                kind,
                request.amount,
                account.balance,
                new_balance,
                account.version + 1,
                request.actor,
                reference.clone(),
                description.clone(),
                Utc::now(),
            )
            .map_err(LedgerError::internal)?;

            match self
                .accounts
                .compare_and_swap(account_id, account.version, new_balance, record.created_at)
                .await
                .map_err(storage_error)?
            {
                SwapOutcome::Swapped(updated) => return self.append_movement(&account, updated, record).await,
                SwapOutcome::VersionConflict => backoff.wait(account_id).await?,
                SwapOutcome::NotFound => return Err(LedgerError::AccountNotFound(account_id)),
            }
        }
    }

    /// Writes the record for a swap that already happened.
    async fn append_movement(
        &self,
        before: &AccountModel,
        updated: AccountModel,
        record: TransactionModel,
    ) -> LedgerResult<MovementReceipt> {
        debug_assert_eq!(updated.version, record.account_version);
        let ours = record.clone();

        let failure = match self.transactions.create_batch(vec![record]).await {
            Ok(mut saved) => match saved.pop() {
                Some(saved) => {
                    tracing::info!(
                        transaction_id = %saved.id,
                        new_balance = saved.balance_after,
                        account_version = saved.account_version,
                        "movement recorded"
                    );
                    return Ok(receipt(&saved, false));
                }
                None => "transaction log accepted an empty batch".to_string(),
            },
            Err(err) => err.to_string(),
        };

        // The write may have committed even though it reported a failure.
        if let Ok(Some(saved)) = self.transactions.find_by_id(ours.id).await {
            tracing::warn!(transaction_id = %saved.id, detail = %failure, "movement recorded despite a reported failure");
            return Ok(receipt(&saved, false));
        }

        // A concurrent request with the same reference won the append. Undo our
        // swap and answer as a replay of the winner.
        if let Some(reference) = ours.reference.as_ref() {
            if let Ok(Some(winner)) = self
                .transactions
                .find_by_reference(before.id, reference.as_str())
                .await
            {
                if winner.id != ours.id && self.undo_swap(&ours, &winner).await.is_ok() {
                    tracing::warn!(transaction_id = %winner.id, "lost reference race, swap compensated");
                    return replay(&winner, ours.transaction_type, ours.amount);
                }
            }
        }

        tracing::error!(
            account_id = %before.id,
            account_version = updated.version,
            balance_before = before.balance,
            balance_after = updated.balance,
            detail = %failure,
            "balance swapped but transaction record was not written; account needs reconciliation"
        );
        Err(LedgerError::InconsistentWrite {
            account_id: before.id,
            account_version: updated.version,
            detail: failure,
        })
    }

    /// Reverses the swap of `ours` against the current balance and records
    /// both as one cancelled entry, so the log still explains every version.
    async fn undo_swap(&self, ours: &TransactionModel, winner: &TransactionModel) -> LedgerResult<()> {
        let account_id = ours.account_id;
        let reason = bounded::<MAX_TEXT_LEN>(
            "reason",
            &format!(
                "reference '{}' already recorded by transaction {}",
                winner.reference_str().unwrap_or_default(),
                winner.id
            ),
        )?;
        let mut entry = TransactionModel::completed(
            account_id,
            ours.customer_id,
            ours.transaction_type,
            ours.amount,
            ours.balance_before,
            ours.balance_after,
            ours.account_version,
            ours.processed_by,
            None,
            ours.description.clone(),
            ours.created_at,
        )
        .map_err(LedgerError::internal)?;

        let mut backoff = Backoff::new(&self.config);
        let (account, undone, at) = loop {
            let account = self.load_account(account_id).await?;
            let restored = account
                .balance
                .checked_sub(ours.signed_amount())
                .ok_or_else(|| LedgerError::internal("undo would overflow"))?;
            let at = Utc::now();
            match self
                .accounts
                .compare_and_swap(account_id, account.version, restored, at)
                .await
                .map_err(storage_error)?
            {
                SwapOutcome::Swapped(undone) => break (account, undone, at),
                SwapOutcome::VersionConflict => backoff.wait(account_id).await?,
                SwapOutcome::NotFound => return Err(LedgerError::AccountNotFound(account_id)),
            }
        };

        entry.status = TransactionStatus::Cancelled;
        entry.cancellation = Some(CancellationMetadata {
            reason,
            cancelled_by: ours.processed_by,
            cancelled_at: at,
            balance_before: account.balance,
            balance_after: undone.balance,
            account_version: undone.version,
        });
        // The balance is right either way; a missing entry only shows up in reconciliation.
        if let Err(err) = self.transactions.create_batch(vec![entry]).await {
            tracing::error!(
                %account_id,
                account_version = undone.version,
                error = %err,
                "duplicate-reference undo applied but not recorded; account needs reconciliation"
            );
        }
        Ok(())
    }
}
