use async_trait::async_trait;
use savings_core_api::AccountStatus;
use uuid::Uuid;

use super::compare_and_swap::SwapOutcome;

/// Status change guarded by the account version
///
/// Same contract as [`CompareAndSwap`](super::compare_and_swap::CompareAndSwap):
/// a single conditional write that bumps the version by one.
#[async_trait]
pub trait UpdateStatus: Send + Sync {
    async fn update_status(
        &self,
        account_id: Uuid,
        expected_version: i64,
        status: AccountStatus,
    ) -> Result<SwapOutcome, Box<dyn std::error::Error + Send + Sync>>;
}
