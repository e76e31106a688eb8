use crate::models::{account::AccountModel, transaction::TransactionModel};

use super::{
    cancellation_claim::CancellationClaim, compare_and_swap::CompareAndSwap,
    create_batch::CreateBatch, find_by_id::FindById, find_by_reference::FindByReference,
    load_batch::LoadBatch, load_history::LoadHistory, scan_accounts::ScanAccounts,
    scan_transactions::ScanTransactions, update_status::UpdateStatus,
};

/// Everything the ledger needs from account storage.
pub trait AccountStore:
    FindById<AccountModel>
    + LoadBatch<AccountModel>
    + CreateBatch<AccountModel>
    + CompareAndSwap
    + UpdateStatus
    + ScanAccounts
{
}

impl<R> AccountStore for R where
    R: FindById<AccountModel>
        + LoadBatch<AccountModel>
        + CreateBatch<AccountModel>
        + CompareAndSwap
        + UpdateStatus
        + ScanAccounts
{
}

/// Everything the ledger needs from the transaction log.
pub trait TransactionLog:
    FindById<TransactionModel>
    + CreateBatch<TransactionModel>
    + FindByReference
    + LoadHistory
    + ScanTransactions
    + CancellationClaim
{
}

impl<R> TransactionLog for R where
    R: FindById<TransactionModel>
        + CreateBatch<TransactionModel>
        + FindByReference
        + LoadHistory
        + ScanTransactions
        + CancellationClaim
{
}
