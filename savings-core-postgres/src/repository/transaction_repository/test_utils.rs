use chrono::Duration;
use heapless::String as HeaplessString;
use savings_core_api::TransactionType;
use savings_core_db::models::{account::AccountModel, transaction::TransactionModel};
use savings_core_db::repository::create_batch::CreateBatch;
use uuid::Uuid;

use crate::repository::account_repository::test_utils::create_test_account;
use crate::test_helper::TestContext;

/// Stores a fresh account the transaction rows can reference.
pub async fn setup_account(
    ctx: &TestContext,
    balance: i64,
) -> Result<AccountModel, Box<dyn std::error::Error + Send + Sync>> {
    let account = create_test_account(balance, 0);
    ctx.repos()
        .account_repository
        .create_batch(vec![account.clone()])
        .await?;
    Ok(account)
}

/// A deposit of `amount` that produced `version`; each version is one second
/// later than the previous so history order is deterministic.
pub fn create_test_deposit(
    account: &AccountModel,
    amount: i64,
    version: i64,
    reference: Option<&str>,
) -> TransactionModel {
    let balance_before = account.opening_balance + amount * (version - 1);
    TransactionModel::completed(
        account.id,
        account.customer_id,
        TransactionType::Deposit,
        amount,
        balance_before,
        balance_before + amount,
        version,
        Uuid::new_v4(),
        reference.map(|r| HeaplessString::try_from(r).unwrap()),
        None,
        account.created_at + Duration::seconds(version),
    )
    .unwrap()
}

