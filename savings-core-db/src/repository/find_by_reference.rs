use async_trait::async_trait;
use uuid::Uuid;

use crate::models::transaction::TransactionModel;

/// Lookup of a transaction by its client supplied idempotency key
///
/// References are unique per account, so at most one record matches.
#[async_trait]
pub trait FindByReference: Send + Sync {
    async fn find_by_reference(
        &self,
        account_id: Uuid,
        reference: &str,
    ) -> Result<Option<TransactionModel>, Box<dyn std::error::Error + Send + Sync>>;
}
