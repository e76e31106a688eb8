use async_trait::async_trait;
use savings_core_db::models::account::AccountModel;
use savings_core_db::repository::scan_accounts::{AccountFilter, ScanAccounts};
use std::error::Error;

use super::repo_impl::{AccountRepositoryImpl, ACCOUNT_COLUMNS};
use crate::utils::collect_rows;

impl AccountRepositoryImpl {
    pub(super) async fn scan_accounts_impl(
        &self,
        filter: AccountFilter,
    ) -> Result<Vec<AccountModel>, Box<dyn Error + Send + Sync>> {
        let sql = format!(
            r#"
            SELECT {ACCOUNT_COLUMNS} FROM savings_account
            WHERE ($1::uuid IS NULL OR customer_id = $1)
              AND ($2::account_status IS NULL OR status = $2)
              AND ($3::bigint IS NULL OR balance < $3)
            ORDER BY balance ASC, id ASC
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(filter.customer_id)
            .bind(filter.status)
            .bind(filter.balance_below)
            .fetch_all(&*self.pool)
            .await?;

        collect_rows(rows)
    }
}

#[async_trait]
impl ScanAccounts for AccountRepositoryImpl {
    async fn scan_accounts(
        &self,
        filter: AccountFilter,
    ) -> Result<Vec<AccountModel>, Box<dyn Error + Send + Sync>> {
        self.scan_accounts_impl(filter).await
    }
}

#[cfg(test)]
#[serial_test::serial]
mod tests {
    use super::super::test_utils::create_test_account;
    use crate::test_helper::setup_test_context;
    use savings_core_api::AccountStatus;
    use savings_core_db::repository::{
        create_batch::CreateBatch,
        scan_accounts::{AccountFilter, ScanAccounts},
    };
    use uuid::Uuid;

    #[tokio::test]
    #[ignore = "requires PostgreSQL at DATABASE_URL"]
    async fn test_scan_accounts_by_customer() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let repo = &ctx.repos().account_repository;

        let customer_id = Uuid::new_v4();
        let mut rich = create_test_account(9_000, 0);
        rich.customer_id = customer_id;
        let mut poor = create_test_account(10, 0);
        poor.customer_id = customer_id;
        poor.status = AccountStatus::Suspended;
        repo.create_batch(vec![rich, poor, create_test_account(1, 0)]).await?;

        let found = repo.scan_accounts(AccountFilter::for_customer(customer_id)).await?;
        let balances: Vec<i64> = found.iter().map(|a| a.balance).collect();
        assert_eq!(balances, vec![10, 9_000]);

        let mut filter = AccountFilter::low_balance(100);
        filter.customer_id = Some(customer_id);
        // The suspended account is excluded from low balance scans.
        assert!(repo.scan_accounts(filter).await?.is_empty());

        Ok(())
    }
}
