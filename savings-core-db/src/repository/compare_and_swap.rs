use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::account::AccountModel;

/// Result of a conditional write against an account version.
#[derive(Debug, Clone, PartialEq)]
pub enum SwapOutcome {
    /// The write committed; carries the account as stored afterwards.
    Swapped(AccountModel),
    /// The stored version no longer matched the expected one.
    VersionConflict,
    NotFound,
}

/// Atomic balance update guarded by the account version
///
/// This is the only sanctioned way to change an account balance. Implementations
/// must perform a single conditional write (`... WHERE version = expected`) so that
/// two mutators that read the same version can never both succeed. On success the
/// stored version is `expected_version + 1`.
#[async_trait]
pub trait CompareAndSwap: Send + Sync {
    /// Swap the balance of `account_id` if its version is still `expected_version`
    ///
    /// # Arguments
    /// * `account_id` - The account to update
    /// * `expected_version` - The version the caller read before computing `new_balance`
    /// * `new_balance` - The balance to store
    /// * `last_transaction_date` - Timestamp of this mutation
    async fn compare_and_swap(
        &self,
        account_id: Uuid,
        expected_version: i64,
        new_balance: i64,
        last_transaction_date: DateTime<Utc>,
    ) -> Result<SwapOutcome, Box<dyn std::error::Error + Send + Sync>>;
}
