use async_trait::async_trait;
use savings_core_db::models::account::AccountModel;
use savings_core_db::repository::create_batch::CreateBatch;
use std::error::Error;

use super::repo_impl::AccountRepositoryImpl;

impl AccountRepositoryImpl {
    pub(super) async fn create_batch_impl(
        &self,
        items: Vec<AccountModel>,
    ) -> Result<Vec<AccountModel>, Box<dyn Error + Send + Sync>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let mut transaction = self.pool.begin().await?;
        for item in &items {
            sqlx::query(
                r#"
                INSERT INTO savings_account
                (id, customer_id, product_id, opening_balance, balance, minimum_balance, interest_rate, status, is_verified, last_transaction_date, version, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                "#,
            )
            .bind(item.id)
            .bind(item.customer_id)
            .bind(item.product_id)
            .bind(item.opening_balance)
            .bind(item.balance)
            .bind(item.minimum_balance)
            .bind(item.interest_rate)
            .bind(item.status)
            .bind(item.is_verified)
            .bind(item.last_transaction_date)
            .bind(item.version)
            .bind(item.created_at)
            .execute(&mut *transaction)
            .await?;
        }
        transaction.commit().await?;

        Ok(items)
    }
}

#[async_trait]
impl CreateBatch<AccountModel> for AccountRepositoryImpl {
    async fn create_batch(
        &self,
        items: Vec<AccountModel>,
    ) -> Result<Vec<AccountModel>, Box<dyn Error + Send + Sync>> {
        self.create_batch_impl(items).await
    }
}
