use async_trait::async_trait;
use chrono::{DateTime, Utc};
use savings_core_db::models::account::AccountModel;
use savings_core_db::repository::compare_and_swap::{CompareAndSwap, SwapOutcome};
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::{AccountRepositoryImpl, ACCOUNT_COLUMNS};
use crate::utils::TryFromRow;

impl AccountRepositoryImpl {
    /// Tells a lost race apart from a missing account after a guarded
    /// statement matched no row.
    pub(super) async fn miss_outcome(
        &self,
        account_id: Uuid,
    ) -> Result<SwapOutcome, Box<dyn Error + Send + Sync>> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM savings_account WHERE id = $1)")
            .bind(account_id)
            .fetch_one(&*self.pool)
            .await?;

        Ok(if exists {
            SwapOutcome::VersionConflict
        } else {
            SwapOutcome::NotFound
        })
    }

    pub(super) async fn compare_and_swap_impl(
        &self,
        account_id: Uuid,
        expected_version: i64,
        new_balance: i64,
        last_transaction_date: DateTime<Utc>,
    ) -> Result<SwapOutcome, Box<dyn Error + Send + Sync>> {
        let sql = format!(
            r#"
            UPDATE savings_account
            SET balance = $3, last_transaction_date = $4, version = version + 1
            WHERE id = $1 AND version = $2
            RETURNING {ACCOUNT_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(account_id)
            .bind(expected_version)
            .bind(new_balance)
            .bind(last_transaction_date)
            .fetch_optional(&*self.pool)
            .await?;

        match row {
            Some(row) => Ok(SwapOutcome::Swapped(AccountModel::try_from_row(&row)?)),
            None => self.miss_outcome(account_id).await,
        }
    }
}

#[async_trait]
impl CompareAndSwap for AccountRepositoryImpl {
    async fn compare_and_swap(
        &self,
        account_id: Uuid,
        expected_version: i64,
        new_balance: i64,
        last_transaction_date: DateTime<Utc>,
    ) -> Result<SwapOutcome, Box<dyn Error + Send + Sync>> {
        self.compare_and_swap_impl(account_id, expected_version, new_balance, last_transaction_date)
            .await
    }
}
