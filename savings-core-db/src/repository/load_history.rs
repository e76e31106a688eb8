use async_trait::async_trait;
use uuid::Uuid;

use super::pagination::{Page, PageRequest};
use crate::models::transaction::TransactionModel;

/// Paginated transaction history of one account
///
/// Items are ordered by `created_at` descending (newest first), ties broken by
/// `account_version` descending. `Page::total` counts every record of the
/// account, cancelled ones included.
#[async_trait]
pub trait LoadHistory: Send + Sync {
    async fn load_history(
        &self,
        account_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<TransactionModel>, Box<dyn std::error::Error + Send + Sync>>;
}
