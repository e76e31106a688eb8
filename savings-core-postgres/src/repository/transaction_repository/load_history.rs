use async_trait::async_trait;
use savings_core_db::models::transaction::TransactionModel;
use savings_core_db::repository::{
    load_history::LoadHistory,
    pagination::{Page, PageRequest},
};
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::{TransactionRepositoryImpl, TRANSACTION_COLUMNS};
use crate::utils::collect_rows;

impl TransactionRepositoryImpl {
    pub(super) async fn load_history_impl(
        &self,
        account_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<TransactionModel>, Box<dyn Error + Send + Sync>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ledger_transaction WHERE account_id = $1")
            .bind(account_id)
            .fetch_one(&*self.pool)
            .await?;

        let sql = format!(
            r#"
            SELECT {TRANSACTION_COLUMNS} FROM ledger_transaction
            WHERE account_id = $1
            ORDER BY created_at DESC, account_version DESC, id ASC
            LIMIT $2 OFFSET $3
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(account_id)
            .bind(i64::try_from(page.limit)?)
            .bind(i64::try_from(page.offset)?)
            .fetch_all(&*self.pool)
            .await?;

        Ok(Page::new(
            collect_rows(rows)?,
            usize::try_from(total)?,
            page.limit,
            page.offset,
        ))
    }
}

#[async_trait]
impl LoadHistory for TransactionRepositoryImpl {
    async fn load_history(
        &self,
        account_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<TransactionModel>, Box<dyn Error + Send + Sync>> {
        self.load_history_impl(account_id, page).await
    }
}

#[cfg(test)]
#[serial_test::serial]
mod tests {
    use super::super::test_utils::{create_test_deposit, setup_account};
    use crate::test_helper::setup_test_context;
    use savings_core_db::repository::{
        create_batch::CreateBatch, load_history::LoadHistory, pagination::PageRequest,
    };

    #[tokio::test]
    #[ignore = "requires PostgreSQL at DATABASE_URL"]
    async fn test_load_history_pages() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let account = setup_account(&ctx, 0).await?;
        let repo = &ctx.repos().transaction_repository;

        let items = (1..=25)
            .map(|version| create_test_deposit(&account, 10, version, None))
            .collect();
        repo.create_batch(items).await?;

        let page = repo.load_history(account.id, PageRequest::for_page(10, 2)).await?;
        assert_eq!(page.total, 25);
        assert_eq!(page.total_pages(), 3);
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.items[0].account_version, 15);
        assert_eq!(page.items[9].account_version, 6);

        Ok(())
    }
}
