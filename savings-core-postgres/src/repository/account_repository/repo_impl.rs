use async_trait::async_trait;
use savings_core_db::models::account::AccountModel;
use savings_core_db::repository::{find_by_id::FindById, load_batch::LoadBatch};
use sqlx::{postgres::PgRow, PgPool, Row};
use std::error::Error;
use std::sync::Arc;
use uuid::Uuid;

use crate::utils::TryFromRow;

/// Columns selected for every account read, in `TryFromRow` order.
pub(crate) const ACCOUNT_COLUMNS: &str = "id, customer_id, product_id, opening_balance, balance, \
    minimum_balance, interest_rate, status, is_verified, last_transaction_date, version, created_at";

/// PostgreSQL backed account store.
///
/// Every statement runs on its own pooled connection so that no lock or
/// transaction spans more than one storage round-trip.
pub struct AccountRepositoryImpl {
    pub(crate) pool: Arc<PgPool>,
}

impl AccountRepositoryImpl {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

impl TryFromRow<PgRow> for AccountModel {
    fn try_from_row(row: &PgRow) -> Result<Self, Box<dyn Error + Send + Sync>> {
        Ok(AccountModel {
            id: row.try_get("id")?,
            customer_id: row.try_get("customer_id")?,
            product_id: row.try_get("product_id")?,
            opening_balance: row.try_get("opening_balance")?,
            balance: row.try_get("balance")?,
            minimum_balance: row.try_get("minimum_balance")?,
            interest_rate: row.try_get("interest_rate")?,
            status: row.try_get("status")?,
            is_verified: row.try_get("is_verified")?,
            last_transaction_date: row.try_get("last_transaction_date")?,
            version: row.try_get("version")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl FindById<AccountModel> for AccountRepositoryImpl {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AccountModel>, Box<dyn Error + Send + Sync>> {
        let results = self.load_batch(&[id]).await?;
        Ok(results.into_iter().next().flatten())
    }
}
