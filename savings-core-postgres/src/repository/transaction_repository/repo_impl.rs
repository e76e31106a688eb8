use async_trait::async_trait;
use savings_core_db::models::transaction::{CancellationMetadata, TransactionModel};
use savings_core_db::repository::find_by_id::FindById;
use sqlx::{postgres::PgRow, PgPool, Row};
use std::error::Error;
use std::sync::Arc;
use uuid::Uuid;

use crate::utils::{get_heapless_string, get_optional_heapless_string, TryFromRow};

pub(crate) const TRANSACTION_COLUMNS: &str = "id, account_id, customer_id, transaction_type, amount, \
    balance_before, balance_after, status, reference, description, processed_by, account_version, \
    created_at, cancellation_reason, cancelled_by, cancelled_at, cancellation_balance_before, \
    cancellation_balance_after, cancellation_account_version, cancellation_claim, \
    cancellation_claimed_at, hash";

/// PostgreSQL backed transaction log. Rows are inserted once and afterwards
/// only their cancellation columns change.
pub struct TransactionRepositoryImpl {
    pub(crate) pool: Arc<PgPool>,
}

impl TransactionRepositoryImpl {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

fn cancellation_from_row(row: &PgRow) -> Result<Option<CancellationMetadata>, Box<dyn Error + Send + Sync>> {
    if row.try_get::<Option<String>, _>("cancellation_reason")?.is_none() {
        return Ok(None);
    }

    let cancelled_by: Option<Uuid> = row.try_get("cancelled_by")?;
    let cancelled_at = row.try_get("cancelled_at")?;
    let balance_before: Option<i64> = row.try_get("cancellation_balance_before")?;
    let balance_after: Option<i64> = row.try_get("cancellation_balance_after")?;
    let account_version: Option<i64> = row.try_get("cancellation_account_version")?;

    match (cancelled_by, cancelled_at, balance_before, balance_after, account_version) {
        (Some(cancelled_by), Some(cancelled_at), Some(balance_before), Some(balance_after), Some(account_version)) => {
            Ok(Some(CancellationMetadata {
                reason: get_heapless_string(row, "cancellation_reason")?,
                cancelled_by,
                cancelled_at,
                balance_before,
                balance_after,
                account_version,
            }))
        }
        _ => Err("Cancellation columns are only partially populated".into()),
    }
}

impl TryFromRow<PgRow> for TransactionModel {
    fn try_from_row(row: &PgRow) -> Result<Self, Box<dyn Error + Send + Sync>> {
        Ok(TransactionModel {
            id: row.try_get("id")?,
            account_id: row.try_get("account_id")?,
            customer_id: row.try_get("customer_id")?,
            transaction_type: row.try_get("transaction_type")?,
            amount: row.try_get("amount")?,
            balance_before: row.try_get("balance_before")?,
            balance_after: row.try_get("balance_after")?,
            status: row.try_get("status")?,
            reference: get_optional_heapless_string(row, "reference")?,
            description: get_optional_heapless_string(row, "description")?,
            processed_by: row.try_get("processed_by")?,
            account_version: row.try_get("account_version")?,
            created_at: row.try_get("created_at")?,
            cancellation: cancellation_from_row(row)?,
            cancellation_claim: row.try_get("cancellation_claim")?,
            cancellation_claimed_at: row.try_get("cancellation_claimed_at")?,
            hash: row.try_get("hash")?,
        })
    }
}

#[async_trait]
impl FindById<TransactionModel> for TransactionRepositoryImpl {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<TransactionModel>, Box<dyn Error + Send + Sync>> {
        let sql = format!("SELECT {TRANSACTION_COLUMNS} FROM ledger_transaction WHERE id = $1");
        let row = sqlx::query(&sql).bind(id).fetch_optional(&*self.pool).await?;

        match row {
            Some(row) => Ok(Some(TransactionModel::try_from_row(&row)?)),
            None => Ok(None),
        }
    }
}
