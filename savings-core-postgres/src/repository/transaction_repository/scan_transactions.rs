use async_trait::async_trait;
use savings_core_db::models::transaction::TransactionModel;
use savings_core_db::repository::scan_transactions::{ScanTransactions, TransactionFilter};
use std::error::Error;

use super::repo_impl::{TransactionRepositoryImpl, TRANSACTION_COLUMNS};
use crate::utils::collect_rows;

impl TransactionRepositoryImpl {
    pub(super) async fn scan_transactions_impl(
        &self,
        filter: TransactionFilter,
    ) -> Result<Vec<TransactionModel>, Box<dyn Error + Send + Sync>> {
        let sql = format!(
            r#"
            SELECT {TRANSACTION_COLUMNS} FROM ledger_transaction
            WHERE ($1::uuid IS NULL OR account_id = $1)
              AND ($2::uuid IS NULL OR customer_id = $2)
              AND ($3::transaction_status IS NULL OR status = $3)
              AND ($4::timestamptz IS NULL OR created_at >= $4)
              AND ($5::timestamptz IS NULL OR created_at < $5)
            ORDER BY created_at DESC, account_version DESC, id ASC
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(filter.account_id)
            .bind(filter.customer_id)
            .bind(filter.status)
            .bind(filter.created_from)
            .bind(filter.created_to)
            .fetch_all(&*self.pool)
            .await?;

        collect_rows(rows)
    }
}

#[async_trait]
impl ScanTransactions for TransactionRepositoryImpl {
    async fn scan_transactions(
        &self,
        filter: TransactionFilter,
    ) -> Result<Vec<TransactionModel>, Box<dyn Error + Send + Sync>> {
        self.scan_transactions_impl(filter).await
    }
}

#[cfg(test)]
#[serial_test::serial]
mod tests {
    use super::super::test_utils::{create_test_deposit, setup_account};
    use crate::test_helper::setup_test_context;
    use chrono::Duration;
    use savings_core_db::repository::{
        create_batch::CreateBatch,
        scan_transactions::{ScanTransactions, TransactionFilter},
    };

    #[tokio::test]
    #[ignore = "requires PostgreSQL at DATABASE_URL"]
    async fn test_scan_by_customer_and_window() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let account = setup_account(&ctx, 0).await?;
        let repo = &ctx.repos().transaction_repository;

        let first = create_test_deposit(&account, 10, 1, None);
        let second = create_test_deposit(&account, 20, 2, None);
        repo.create_batch(vec![first.clone(), second.clone()]).await?;

        let all = repo
            .scan_transactions(TransactionFilter::for_customer(account.customer_id))
            .await?;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);

        let window = TransactionFilter::for_customer(account.customer_id)
            .between(Some(second.created_at), Some(second.created_at + Duration::seconds(1)));
        let only_second = repo.scan_transactions(window).await?;
        assert_eq!(only_second.len(), 1);
        assert_eq!(only_second[0].amount, 20);

        Ok(())
    }
}
