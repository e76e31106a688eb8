use async_trait::async_trait;
use savings_core_db::models::transaction::TransactionModel;
use savings_core_db::repository::find_by_reference::FindByReference;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::{TransactionRepositoryImpl, TRANSACTION_COLUMNS};
use crate::utils::TryFromRow;

#[async_trait]
impl FindByReference for TransactionRepositoryImpl {
    async fn find_by_reference(
        &self,
        account_id: Uuid,
        reference: &str,
    ) -> Result<Option<TransactionModel>, Box<dyn Error + Send + Sync>> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM ledger_transaction WHERE account_id = $1 AND reference = $2"
        );
        let row = sqlx::query(&sql)
            .bind(account_id)
            .bind(reference)
            .fetch_optional(&*self.pool)
            .await?;

        row.map(|row| TransactionModel::try_from_row(&row)).transpose()
    }
}

#[cfg(test)]
#[serial_test::serial]
mod tests {
    use super::super::test_utils::{create_test_deposit, setup_account};
    use crate::test_helper::setup_test_context;
    use savings_core_db::repository::{create_batch::CreateBatch, find_by_reference::FindByReference};

    #[tokio::test]
    #[ignore = "requires PostgreSQL at DATABASE_URL"]
    async fn test_find_by_reference() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let account = setup_account(&ctx, 0).await?;
        let other = setup_account(&ctx, 0).await?;
        let repo = &ctx.repos().transaction_repository;

        let item = create_test_deposit(&account, 75, 1, Some("salary-2024-05"));
        repo.create_batch(vec![item.clone()]).await?;

        let found = repo.find_by_reference(account.id, "salary-2024-05").await?;
        assert_eq!(found.map(|t| t.id), Some(item.id));
        assert!(repo.find_by_reference(other.id, "salary-2024-05").await?.is_none());

        Ok(())
    }
}
