use async_trait::async_trait;
use savings_core_db::models::transaction::TransactionModel;
use savings_core_db::repository::create_batch::CreateBatch;
use std::error::Error;

use super::repo_impl::TransactionRepositoryImpl;

impl TransactionRepositoryImpl {
    pub(super) async fn create_batch_impl(
        &self,
        items: Vec<TransactionModel>,
    ) -> Result<Vec<TransactionModel>, Box<dyn Error + Send + Sync>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let mut transaction = self.pool.begin().await?;
        for item in &items {
            let cancellation = item.cancellation.as_ref();
            sqlx::query(
                r#"
                INSERT INTO ledger_transaction
                (id, account_id, customer_id, transaction_type, amount, balance_before, balance_after, status,
                 reference, description, processed_by, account_version, created_at,
                 cancellation_reason, cancelled_by, cancelled_at, cancellation_balance_before,
                 cancellation_balance_after, cancellation_account_version, cancellation_claim,
                 cancellation_claimed_at, hash)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22)
                "#,
            )
            .bind(item.id)
            .bind(item.account_id)
            .bind(item.customer_id)
            .bind(item.transaction_type)
            .bind(item.amount)
            .bind(item.balance_before)
            .bind(item.balance_after)
            .bind(item.status)
            .bind(item.reference.as_ref().map(|s| s.as_str()))
            .bind(item.description.as_ref().map(|s| s.as_str()))
            .bind(item.processed_by)
            .bind(item.account_version)
            .bind(item.created_at)
            .bind(cancellation.map(|c| c.reason.as_str()))
            .bind(cancellation.map(|c| c.cancelled_by))
            .bind(cancellation.map(|c| c.cancelled_at))
            .bind(cancellation.map(|c| c.balance_before))
            .bind(cancellation.map(|c| c.balance_after))
            .bind(cancellation.map(|c| c.account_version))
            .bind(item.cancellation_claim)
            .bind(item.cancellation_claimed_at)
            .bind(item.hash)
            .execute(&mut *transaction)
            .await?;
        }
        transaction.commit().await?;

        Ok(items)
    }
}

#[async_trait]
impl CreateBatch<TransactionModel> for TransactionRepositoryImpl {
    async fn create_batch(
        &self,
        items: Vec<TransactionModel>,
    ) -> Result<Vec<TransactionModel>, Box<dyn Error + Send + Sync>> {
        self.create_batch_impl(items).await
    }
}

#[cfg(test)]
#[serial_test::serial]
mod tests {
    use super::super::test_utils::{create_test_deposit, setup_account};
    use crate::test_helper::setup_test_context;
    use savings_core_db::repository::{create_batch::CreateBatch, find_by_id::FindById};

    #[tokio::test]
    #[ignore = "requires PostgreSQL at DATABASE_URL"]
    async fn test_create_and_find() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let account = setup_account(&ctx, 1_000).await?;
        let repo = &ctx.repos().transaction_repository;

        let item = create_test_deposit(&account, 250, 1, Some("dep-1"));
        repo.create_batch(vec![item.clone()]).await?;

        let loaded = repo.find_by_id(item.id).await?.expect("transaction stored");
        assert_eq!(loaded.amount, 250);
        assert_eq!(loaded.reference_str(), Some("dep-1"));
        assert!(loaded.cancellation.is_none());
        assert!(loaded.verify_hash());

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires PostgreSQL at DATABASE_URL"]
    async fn test_duplicate_reference_is_rejected() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let account = setup_account(&ctx, 1_000).await?;
        let repo = &ctx.repos().transaction_repository;

        repo.create_batch(vec![create_test_deposit(&account, 10, 1, Some("dup"))]).await?;
        tokio_test::assert_err!(
            repo.create_batch(vec![create_test_deposit(&account, 10, 2, Some("dup"))]).await
        );

        Ok(())
    }
}
