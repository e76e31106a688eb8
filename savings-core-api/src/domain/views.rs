use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{AccountStatus, TransactionStatus, TransactionType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountView {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub product_id: Option<Uuid>,
    pub opening_balance: i64,
    pub balance: i64,
    pub minimum_balance: i64,
    pub interest_rate: Decimal,
    pub status: AccountStatus,
    pub is_verified: bool,
    pub last_transaction_date: Option<DateTime<Utc>>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationView {
    pub reason: String,
    pub cancelled_by: Uuid,
    pub cancelled_at: DateTime<Utc>,
    /// Balance snapshots of the compensating entry.
    pub balance_before: i64,
    pub balance_after: i64,
    pub account_version: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionView {
    pub id: Uuid,
    pub account_id: Uuid,
    pub customer_id: Uuid,
    pub transaction_type: TransactionType,
    pub amount: i64,
    pub balance_before: i64,
    pub balance_after: i64,
    pub status: TransactionStatus,
    pub reference: Option<String>,
    pub description: Option<String>,
    pub processed_by: Uuid,
    pub account_version: i64,
    pub created_at: DateTime<Utc>,
    pub cancellation: Option<CancellationView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementReceipt {
    pub transaction_id: Uuid,
    pub account_id: Uuid,
    pub new_balance: i64,
    pub account_version: i64,
    /// True when the reference matched an earlier movement and nothing was applied.
    pub replayed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationReceipt {
    pub transaction_id: Uuid,
    pub account_id: Uuid,
    pub new_balance: i64,
    pub account_version: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum WithdrawalRefusal {
    InsufficientFunds,
    AccountNotActive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalDecision {
    pub allowed: bool,
    pub reason: Option<WithdrawalRefusal>,
}

impl WithdrawalDecision {
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn refused(reason: WithdrawalRefusal) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
        }
    }
}
