use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use savings_core_api::{AccountStatus, AccountView, OpenAccountRequest};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::identifiable::Identifiable;

/// A customer savings account.
///
/// `balance` is only ever changed through a compare-and-swap on `version`.
/// `version` starts at 0 when the account is opened and every successful
/// mutation (balance or status) increments it by exactly one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountModel {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub product_id: Option<Uuid>,
    /// Balance at opening, in minor units. Never changes.
    pub opening_balance: i64,
    /// Current balance, in minor units
    pub balance: i64,
    pub minimum_balance: i64,
    /// Informational only, never applied by the ledger
    pub interest_rate: Decimal,
    pub status: AccountStatus,
    pub is_verified: bool,
    pub last_transaction_date: Option<DateTime<Utc>>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

impl AccountModel {
    pub fn open(request: &OpenAccountRequest, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id: request.customer_id,
            product_id: request.product_id,
            opening_balance: request.opening_balance,
            balance: request.opening_balance,
            minimum_balance: request.minimum_balance,
            interest_rate: request.interest_rate,
            status: AccountStatus::Active,
            is_verified: request.is_verified,
            last_transaction_date: None,
            version: 0,
            created_at,
        }
    }

    /// Balance remaining above the withdrawal floor.
    pub fn available_to_withdraw(&self) -> i64 {
        (self.balance - self.minimum_balance).max(0)
    }
}

impl Identifiable for AccountModel {
    fn get_id(&self) -> Uuid {
        self.id
    }
}

impl From<&AccountModel> for AccountView {
    fn from(account: &AccountModel) -> Self {
        AccountView {
            id: account.id,
            customer_id: account.customer_id,
            product_id: account.product_id,
            opening_balance: account.opening_balance,
            balance: account.balance,
            minimum_balance: account.minimum_balance,
            interest_rate: account.interest_rate,
            status: account.status,
            is_verified: account.is_verified,
            last_transaction_date: account.last_transaction_date,
            version: account.version,
            created_at: account.created_at,
        }
    }
}

impl From<AccountModel> for AccountView {
    fn from(account: AccountModel) -> Self {
        AccountView::from(&account)
    }
}
