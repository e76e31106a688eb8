use async_trait::async_trait;
use savings_core_api::AccountStatus;
use savings_core_db::models::account::AccountModel;
use savings_core_db::repository::{compare_and_swap::SwapOutcome, update_status::UpdateStatus};
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::{AccountRepositoryImpl, ACCOUNT_COLUMNS};
use crate::utils::TryFromRow;

impl AccountRepositoryImpl {
    pub(super) async fn update_status_impl(
        &self,
        account_id: Uuid,
        expected_version: i64,
        status: AccountStatus,
    ) -> Result<SwapOutcome, Box<dyn Error + Send + Sync>> {
        let sql = format!(
            r#"
            UPDATE savings_account
            SET status = $3, version = version + 1
            WHERE id = $1 AND version = $2
            RETURNING {ACCOUNT_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(account_id)
            .bind(expected_version)
            .bind(status)
            .fetch_optional(&*self.pool)
            .await?;

        match row {
            Some(row) => Ok(SwapOutcome::Swapped(AccountModel::try_from_row(&row)?)),
            None => self.miss_outcome(account_id).await,
        }
    }
}

#[async_trait]
impl UpdateStatus for AccountRepositoryImpl {
    async fn update_status(
        &self,
        account_id: Uuid,
        expected_version: i64,
        status: AccountStatus,
    ) -> Result<SwapOutcome, Box<dyn Error + Send + Sync>> {
        self.update_status_impl(account_id, expected_version, status).await
    }
}

#[cfg(test)]
#[serial_test::serial]
mod tests {
    use super::super::test_utils::create_test_account;
    use crate::test_helper::setup_test_context;
    use savings_core_api::AccountStatus;
    use savings_core_db::repository::{
        compare_and_swap::SwapOutcome, create_batch::CreateBatch, update_status::UpdateStatus,
    };

    #[tokio::test]
    #[ignore = "requires PostgreSQL at DATABASE_URL"]
    async fn test_update_status_bumps_version() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let repo = &ctx.repos().account_repository;

        let account = create_test_account(100, 0);
        repo.create_batch(vec![account.clone()]).await?;

        let outcome = repo.update_status(account.id, 0, AccountStatus::Suspended).await?;
        let SwapOutcome::Swapped(updated) = outcome else {
            panic!("expected swap, got {outcome:?}");
        };
        assert_eq!(updated.status, AccountStatus::Suspended);
        assert_eq!(updated.version, 1);
        assert_eq!(updated.balance, 100);

        let stale = repo.update_status(account.id, 0, AccountStatus::Closed).await?;
        assert_eq!(stale, SwapOutcome::VersionConflict);

        Ok(())
    }
}
