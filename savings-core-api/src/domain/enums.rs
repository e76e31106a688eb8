use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "account_status", rename_all = "lowercase"))]
pub enum AccountStatus {
    Active,
    Suspended,
    Closed,
}

impl AccountStatus {
    /// Only active accounts accept balance mutations.
    pub fn allows_mutation(&self) -> bool {
        matches!(self, AccountStatus::Active)
    }

    /// `Closed` is terminal. A status never transitions to itself.
    pub fn can_transition_to(&self, next: AccountStatus) -> bool {
        match (self, next) {
            (AccountStatus::Closed, _) => false,
            (current, next) => *current != next,
        }
    }
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountStatus::Active => write!(f, "active"),
            AccountStatus::Suspended => write!(f, "suspended"),
            AccountStatus::Closed => write!(f, "closed"),
        }
    }
}

impl FromStr for AccountStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AccountStatus::Active),
            "suspended" => Ok(AccountStatus::Suspended),
            "closed" => Ok(AccountStatus::Closed),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "transaction_type", rename_all = "lowercase"))]
pub enum TransactionType {
    Deposit,
    Withdrawal,
}

impl TransactionType {
    /// Sign applied to `amount` when the transaction is folded into a balance.
    pub fn signed(&self, amount: i64) -> i64 {
        match self {
            TransactionType::Deposit => amount,
            TransactionType::Withdrawal => -amount,
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Deposit => write!(f, "deposit"),
            TransactionType::Withdrawal => write!(f, "withdrawal"),
        }
    }
}

impl FromStr for TransactionType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(TransactionType::Deposit),
            "withdrawal" => Ok(TransactionType::Withdrawal),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "transaction_status", rename_all = "lowercase"))]
pub enum TransactionStatus {
    Completed,
    Cancelled,
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Completed => write!(f, "completed"),
            TransactionStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(TransactionStatus::Completed),
            "cancelled" => Ok(TransactionStatus::Cancelled),
            _ => Err(()),
        }
    }
}
