use chrono::Utc;
use rust_decimal::Decimal;
use savings_core_api::AccountStatus;
use savings_core_db::models::account::AccountModel;
use uuid::Uuid;

pub fn create_test_account(balance: i64, minimum_balance: i64) -> AccountModel {
    AccountModel {
        id: Uuid::new_v4(),
        customer_id: Uuid::new_v4(),
        product_id: None,
        opening_balance: balance,
        balance,
        minimum_balance,
        interest_rate: Decimal::new(250, 2),
        status: AccountStatus::Active,
        is_verified: true,
        last_transaction_date: None,
        version: 0,
        created_at: Utc::now(),
    }
}
