use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Stable classification of ledger failures.
///
/// Callers branch on the kind; the message text is for humans only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InvalidState,
    InsufficientFunds,
    Contended,
    InconsistentWrite,
    ValidationError,
    UnknownOutcome,
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::NotFound => write!(f, "not_found"),
            ErrorKind::InvalidState => write!(f, "invalid_state"),
            ErrorKind::InsufficientFunds => write!(f, "insufficient_funds"),
            ErrorKind::Contended => write!(f, "contended"),
            ErrorKind::InconsistentWrite => write!(f, "inconsistent_write"),
            ErrorKind::ValidationError => write!(f, "validation_error"),
            ErrorKind::UnknownOutcome => write!(f, "unknown_outcome"),
            ErrorKind::Internal => write!(f, "internal"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(Uuid),

    #[error("Account {account_id} is not active (status: {status})")]
    AccountNotActive { account_id: Uuid, status: String },

    #[error("Account {account_id} cannot move from {from} to {to}")]
    IllegalStatusTransition {
        account_id: Uuid,
        from: String,
        to: String,
    },

    #[error("Transaction already cancelled: {0}")]
    AlreadyCancelled(Uuid),

    #[error("Cancellation of transaction {0} is already in progress")]
    CancellationInProgress(Uuid),

    #[error("Insufficient funds on account {account_id}: balance {balance}, requested {requested}, floor {floor}")]
    InsufficientFunds {
        account_id: Uuid,
        balance: i64,
        requested: i64,
        floor: i64,
    },

    #[error("Account {account_id} is contended: gave up after {attempts} attempts")]
    Contended { account_id: Uuid, attempts: u32 },

    /// The balance swap committed but its audit record did not.
    #[error("Inconsistent write on account {account_id} at version {account_version}: {detail}")]
    InconsistentWrite {
        account_id: Uuid,
        account_version: i64,
        detail: String,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Operation outcome unknown: {0}")]
    UnknownOutcome(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::AccountNotFound(_) | LedgerError::TransactionNotFound(_) => {
                ErrorKind::NotFound
            }
            LedgerError::AccountNotActive { .. }
            | LedgerError::IllegalStatusTransition { .. }
            | LedgerError::AlreadyCancelled(_)
            | LedgerError::CancellationInProgress(_) => ErrorKind::InvalidState,
            LedgerError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            LedgerError::Contended { .. } => ErrorKind::Contended,
            LedgerError::InconsistentWrite { .. } => ErrorKind::InconsistentWrite,
            LedgerError::ValidationError(_) => ErrorKind::ValidationError,
            LedgerError::UnknownOutcome(_) => ErrorKind::UnknownOutcome,
            LedgerError::InternalError(_) => ErrorKind::Internal,
        }
    }

    /// Human readable reason that is safe to hand to a caller.
    ///
    /// Storage details carried by `InconsistentWrite` and `InternalError`
    /// stay in the logs.
    pub fn reason(&self) -> String {
        match self {
            LedgerError::InconsistentWrite { account_id, .. } => format!(
                "Account {account_id} requires reconciliation before further use"
            ),
            LedgerError::InternalError(_) => "The ledger storage is unavailable".to_string(),
            other => other.to_string(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Contended { .. })
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }
}

impl From<validator::ValidationErrors> for LedgerError {
    fn from(errors: validator::ValidationErrors) -> Self {
        LedgerError::ValidationError(errors.to_string())
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
