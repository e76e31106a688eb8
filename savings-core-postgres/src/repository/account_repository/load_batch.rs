use async_trait::async_trait;
use savings_core_db::models::account::AccountModel;
use savings_core_db::repository::load_batch::LoadBatch;
use std::collections::HashMap;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::{AccountRepositoryImpl, ACCOUNT_COLUMNS};
use crate::utils::collect_rows;

impl AccountRepositoryImpl {
    pub(super) async fn load_batch_impl(
        &self,
        ids: &[Uuid],
    ) -> Result<Vec<Option<AccountModel>>, Box<dyn Error + Send + Sync>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM savings_account WHERE id = ANY($1)");
        let rows = sqlx::query(&sql).bind(ids).fetch_all(&*self.pool).await?;

        let mut map: HashMap<Uuid, AccountModel> = collect_rows::<AccountModel>(rows)?
            .into_iter()
            .map(|item| (item.id, item))
            .collect();

        // Return results in the same order as input ids
        Ok(ids.iter().map(|id| map.remove(id)).collect())
    }
}

#[async_trait]
impl LoadBatch<AccountModel> for AccountRepositoryImpl {
    async fn load_batch(&self, ids: &[Uuid]) -> Result<Vec<Option<AccountModel>>, Box<dyn Error + Send + Sync>> {
        self.load_batch_impl(ids).await
    }
}
