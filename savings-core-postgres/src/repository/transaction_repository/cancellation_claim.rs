use async_trait::async_trait;
use savings_core_api::TransactionStatus;
use savings_core_db::models::transaction::{CancellationMetadata, TransactionModel};
use savings_core_db::repository::cancellation_claim::{CancellationClaim, ClaimOutcome};
use sqlx::Row;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::{TransactionRepositoryImpl, TRANSACTION_COLUMNS};
use crate::utils::TryFromRow;

impl TransactionRepositoryImpl {
    pub(super) async fn claim_cancellation_impl(
        &self,
        transaction_id: Uuid,
        claim_id: Uuid,
    ) -> Result<ClaimOutcome, Box<dyn Error + Send + Sync>> {
        let sql = format!(
            r#"
            UPDATE ledger_transaction
            SET cancellation_claim = $2, cancellation_claimed_at = now()
            WHERE id = $1 AND status = 'completed' AND cancellation_claim IS NULL
            RETURNING {TRANSACTION_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(transaction_id)
            .bind(claim_id)
            .fetch_optional(&*self.pool)
            .await?;

        if let Some(row) = row {
            return Ok(ClaimOutcome::Claimed(TransactionModel::try_from_row(&row)?));
        }

        // Nothing claimed; report why.
        let current = sqlx::query("SELECT status FROM ledger_transaction WHERE id = $1")
            .bind(transaction_id)
            .fetch_optional(&*self.pool)
            .await?;

        match current {
            None => Ok(ClaimOutcome::NotFound),
            Some(row) => {
                let status: TransactionStatus = row.try_get("status")?;
                Ok(match status {
                    TransactionStatus::Cancelled => ClaimOutcome::AlreadyCancelled,
                    TransactionStatus::Completed => ClaimOutcome::InProgress,
                })
            }
        }
    }

    pub(super) async fn release_cancellation_impl(
        &self,
        transaction_id: Uuid,
        claim_id: Uuid,
    ) -> Result<bool, Box<dyn Error + Send + Sync>> {
        let result = sqlx::query(
            r#"
            UPDATE ledger_transaction
            SET cancellation_claim = NULL, cancellation_claimed_at = NULL
            WHERE id = $1 AND status = 'completed' AND cancellation_claim = $2
            "#,
        )
        .bind(transaction_id)
        .bind(claim_id)
        .execute(&*self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub(super) async fn complete_cancellation_impl(
        &self,
        transaction_id: Uuid,
        claim_id: Uuid,
        metadata: CancellationMetadata,
    ) -> Result<Option<TransactionModel>, Box<dyn Error + Send + Sync>> {
        let sql = format!(
            r#"
            UPDATE ledger_transaction
            SET status = 'cancelled',
                cancellation_reason = $3,
                cancelled_by = $4,
                cancelled_at = $5,
                cancellation_balance_before = $6,
                cancellation_balance_after = $7,
                cancellation_account_version = $8
            WHERE id = $1 AND status = 'completed' AND cancellation_claim = $2
            RETURNING {TRANSACTION_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(transaction_id)
            .bind(claim_id)
            .bind(metadata.reason.as_str())
            .bind(metadata.cancelled_by)
            .bind(metadata.cancelled_at)
            .bind(metadata.balance_before)
            .bind(metadata.balance_after)
            .bind(metadata.account_version)
            .fetch_optional(&*self.pool)
            .await?;

        row.map(|row| TransactionModel::try_from_row(&row)).transpose()
    }
}

#[async_trait]
impl CancellationClaim for TransactionRepositoryImpl {
    async fn claim_cancellation(
        &self,
        transaction_id: Uuid,
        claim_id: Uuid,
    ) -> Result<ClaimOutcome, Box<dyn Error + Send + Sync>> {
        self.claim_cancellation_impl(transaction_id, claim_id).await
    }

    async fn release_cancellation(
        &self,
        transaction_id: Uuid,
        claim_id: Uuid,
    ) -> Result<bool, Box<dyn Error + Send + Sync>> {
        self.release_cancellation_impl(transaction_id, claim_id).await
    }

    async fn complete_cancellation(
        &self,
        transaction_id: Uuid,
        claim_id: Uuid,
        metadata: CancellationMetadata,
    ) -> Result<Option<TransactionModel>, Box<dyn Error + Send + Sync>> {
        self.complete_cancellation_impl(transaction_id, claim_id, metadata).await
    }
}
