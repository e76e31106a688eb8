//! Replays an account's transaction log against its stored balance.
//!
//! The engine reports an `InconsistentWrite` when a swap commits without its
//! record. The reconciler is how such accounts are found afterwards, and how
//! operators confirm the ledger is sound after an incident.

use chrono::{DateTime, Duration, Utc};
use savings_core_api::{LedgerError, LedgerResult};
use savings_core_db::models::account::AccountModel;
use savings_core_db::models::transaction::TransactionModel;
use savings_core_db::repository::{AccountFilter, AccountStore, TransactionFilter, TransactionLog};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::engine::storage_error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum ReconciliationIssue {
    /// `opening_balance + Σ completed` differs from the stored balance.
    BalanceMismatch { expected: i64, actual: i64 },
    /// An entry does not start where the previous one ended.
    BrokenChain {
        account_version: i64,
        expected_before: i64,
        recorded_before: i64,
    },
    /// The last entry does not end at the stored balance.
    ChainEndsOffBalance { last_after: i64, balance: i64 },
    /// Two entries claim the same account version.
    DuplicateVersion { account_version: i64 },
    /// An entry carries a version the account never reached.
    VersionAhead { account_version: i64, account_at: i64 },
    /// `balance_after` is not `balance_before` plus the signed amount.
    SnapshotArithmetic { transaction_id: Uuid },
    HashMismatch { transaction_id: Uuid },
    /// A completed transaction still holds a cancellation claim.
    OutstandingClaim {
        transaction_id: Uuid,
        claim_id: Uuid,
        claimed_at: Option<DateTime<Utc>>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationReport {
    pub account_id: Uuid,
    pub consistent: bool,
    pub expected_balance: i64,
    pub actual_balance: i64,
    pub transactions_checked: usize,
    pub issues: Vec<ReconciliationIssue>,
}

/// One balance move seen in the log: either an original record or the
/// compensating entry stored on a cancelled record.
#[derive(Debug, Clone, Copy)]
struct Entry {
    account_version: i64,
    before: i64,
    after: i64,
}

fn entries(records: &[TransactionModel]) -> Vec<Entry> {
    let mut entries = Vec::with_capacity(records.len());
    for record in records {
        entries.push(Entry {
            account_version: record.account_version,
            before: record.balance_before,
            after: record.balance_after,
        });
        if let Some(cancellation) = &record.cancellation {
            entries.push(Entry {
                account_version: cancellation.account_version,
                before: cancellation.balance_before,
                after: cancellation.balance_after,
            });
        }
    }
    entries.sort_by_key(|entry| entry.account_version);
    entries
}

/// Runs every check over `records` of `account`. Pure; no storage access.
pub fn check(account: &AccountModel, records: &[TransactionModel]) -> ReconciliationReport {
    let mut issues = Vec::new();

    let expected_balance = records
        .iter()
        .filter(|record| record.is_completed())
        .fold(account.opening_balance, |sum, record| {
            sum.saturating_add(record.signed_amount())
        });
    if expected_balance != account.balance {
        issues.push(ReconciliationIssue::BalanceMismatch {
            expected: expected_balance,
            actual: account.balance,
        });
    }

    for record in records {
        if !record.verify_hash() {
            issues.push(ReconciliationIssue::HashMismatch {
                transaction_id: record.id,
            });
        }
        if !record.snapshots_agree() {
            issues.push(ReconciliationIssue::SnapshotArithmetic {
                transaction_id: record.id,
            });
        }
        if let (true, Some(claim_id)) = (record.is_completed(), record.cancellation_claim) {
            issues.push(ReconciliationIssue::OutstandingClaim {
                transaction_id: record.id,
                claim_id,
                claimed_at: record.cancellation_claimed_at,
            });
        }
    }

    let entries = entries(records);
    let mut seen: BTreeMap<i64, usize> = BTreeMap::new();
    for entry in &entries {
        *seen.entry(entry.account_version).or_default() += 1;
        if entry.account_version > account.version {
            issues.push(ReconciliationIssue::VersionAhead {
                account_version: entry.account_version,
                account_at: account.version,
            });
        }
    }
    issues.extend(
        seen.into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(account_version, _)| ReconciliationIssue::DuplicateVersion { account_version }),
    );

    // Versions may skip: status changes bump the version without a record.
    let mut running = account.opening_balance;
    for entry in &entries {
        if entry.before != running {
            issues.push(ReconciliationIssue::BrokenChain {
                account_version: entry.account_version,
                expected_before: running,
                recorded_before: entry.before,
            });
        }
        running = entry.after;
    }
    if running != account.balance {
        issues.push(ReconciliationIssue::ChainEndsOffBalance {
            last_after: running,
            balance: account.balance,
        });
    }

    ReconciliationReport {
        account_id: account.id,
        consistent: issues.is_empty(),
        expected_balance,
        actual_balance: account.balance,
        transactions_checked: records.len(),
        issues,
    }
}

pub struct Reconciler<A, T> {
    accounts: Arc<A>,
    transactions: Arc<T>,
}

impl<A, T> Reconciler<A, T>
where
    A: AccountStore,
    T: TransactionLog,
{
    pub fn new(accounts: Arc<A>, transactions: Arc<T>) -> Self {
        Self {
            accounts,
            transactions,
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn reconcile_account(&self, account_id: Uuid) -> LedgerResult<ReconciliationReport> {
        let account = self.load_account(account_id).await?;
        self.reconcile(&account).await
    }

    /// Clears cancellation claims on `account_id` that were taken at least
    /// `older_than` ago and returns the transactions freed.
    ///
    /// A claim is only left behind when its cancellation stopped between the
    /// claim and the record update. If the compensating swap already landed,
    /// releasing would let the transaction be cancelled twice, so the account
    /// must reconcile on balance first.
    #[tracing::instrument(skip(self))]
    pub async fn release_stale_claims(&self, account_id: Uuid, older_than: Duration) -> LedgerResult<Vec<Uuid>> {
        let account = self.load_account(account_id).await?;
        let records = self.account_records(&account).await?;

        let report = check(&account, &records);
        let off_balance = report.issues.iter().any(|issue| {
            matches!(
                issue,
                ReconciliationIssue::BalanceMismatch { .. } | ReconciliationIssue::ChainEndsOffBalance { .. }
            )
        });
        if off_balance {
            tracing::warn!(
                %account_id,
                expected_balance = report.expected_balance,
                actual_balance = report.actual_balance,
                "claims kept; balance does not match the log"
            );
            return Err(LedgerError::validation(format!(
                "account {account_id} does not reconcile; resolve the balance before releasing claims"
            )));
        }

        let cutoff = Utc::now() - older_than;
        let mut released = Vec::new();
        for record in records.iter().filter(|record| record.is_completed()) {
            let Some(claim_id) = record.cancellation_claim else {
                continue;
            };
            if record.cancellation_claimed_at.is_some_and(|at| at > cutoff) {
                continue;
            }
            let freed = self
                .transactions
                .release_cancellation(record.id, claim_id)
                .await
                .map_err(storage_error)?;
            if freed {
                tracing::warn!(
                    transaction_id = %record.id,
                    %claim_id,
                    claimed_at = ?record.cancellation_claimed_at,
                    "stale cancellation claim released"
                );
                released.push(record.id);
            }
        }
        Ok(released)
    }

    /// Reports for every account in the store, consistent ones included.
    pub async fn reconcile_all(&self) -> LedgerResult<Vec<ReconciliationReport>> {
        let accounts = self
            .accounts
            .scan_accounts(AccountFilter::all())
            .await
            .map_err(storage_error)?;

        let mut reports = Vec::with_capacity(accounts.len());
        for account in &accounts {
            reports.push(self.reconcile(account).await?);
        }
        let broken = reports.iter().filter(|report| !report.consistent).count();
        tracing::info!(accounts = reports.len(), inconsistent = broken, "reconciliation finished");
        Ok(reports)
    }

    async fn load_account(&self, account_id: Uuid) -> LedgerResult<AccountModel> {
        self.accounts
            .find_by_id(account_id)
            .await
            .map_err(storage_error)?
            .ok_or(LedgerError::AccountNotFound(account_id))
    }

    async fn account_records(&self, account: &AccountModel) -> LedgerResult<Vec<TransactionModel>> {
        self.transactions
            .scan_transactions(TransactionFilter::for_account(account.id))
            .await
            .map_err(storage_error)
    }

    async fn reconcile(&self, account: &AccountModel) -> LedgerResult<ReconciliationReport> {
        let records = self.account_records(account).await?;

        let report = check(account, &records);
        if report.consistent {
            tracing::debug!(account_id = %account.id, checked = report.transactions_checked, "account reconciled");
        } else {
            tracing::warn!(
                account_id = %account.id,
                expected_balance = report.expected_balance,
                actual_balance = report.actual_balance,
                issues = report.issues.len(),
                "account ledger is inconsistent"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use savings_core_api::{
        AccountStatus, CancellationRequest, ChangeStatusRequest, ErrorKind, LedgerService,
        MovementRequest,
    };
    use savings_core_db::memory::{InMemoryAccountStore, InMemoryTransactionLog};
    use savings_core_db::repository::{CancellationClaim, CreateBatch, FindById};
    use std::sync::atomic::Ordering;

    use crate::test_support::{faulty_engine, memory_engine, open_account};

    fn cancellation(transaction_id: Uuid) -> CancellationRequest {
        CancellationRequest {
            transaction_id,
            reason: "reversal".to_string(),
            actor: Uuid::new_v4(),
        }
    }

    fn reconciler(
        accounts: Arc<InMemoryAccountStore>,
        transactions: Arc<InMemoryTransactionLog>,
    ) -> Reconciler<InMemoryAccountStore, InMemoryTransactionLog> {
        Reconciler::new(accounts, transactions)
    }

    #[tokio::test]
    async fn clean_ledger_is_consistent() {
        let (engine, accounts, transactions) = memory_engine();
        let account_id = open_account(&engine, 1_000, 100).await;
        let actor = Uuid::new_v4();

        let deposit = engine
            .deposit(MovementRequest::new(account_id, 500, actor))
            .await
            .unwrap();
        engine
            .withdraw(MovementRequest::new(account_id, 300, actor))
            .await
            .unwrap();
        engine
            .change_status(ChangeStatusRequest {
                account_id,
                status: AccountStatus::Suspended,
                actor,
            })
            .await
            .unwrap();
        engine
            .change_status(ChangeStatusRequest {
                account_id,
                status: AccountStatus::Active,
                actor,
            })
            .await
            .unwrap();
        engine
            .cancel_transaction(cancellation(deposit.transaction_id))
            .await
            .unwrap();

        let report = reconciler(accounts, transactions)
            .reconcile_account(account_id)
            .await
            .unwrap();
        assert!(report.consistent, "{:?}", report.issues);
        assert_eq!(report.expected_balance, 700);
        assert_eq!(report.actual_balance, 700);
        assert_eq!(report.transactions_checked, 2);
    }

    #[tokio::test]
    async fn unknown_account_is_not_found() {
        let (_, accounts, transactions) = memory_engine();
        let id = Uuid::new_v4();
        let err = reconciler(accounts, transactions)
            .reconcile_account(id)
            .await
            .unwrap_err();
        assert_eq!(err, LedgerError::AccountNotFound(id));
    }

    #[tokio::test]
    async fn lost_record_is_detected() {
        let (engine, accounts, transactions) = faulty_engine();
        let account_id = open_account(&engine, 1_000, 0).await;
        engine
            .deposit(MovementRequest::new(account_id, 200, Uuid::new_v4()))
            .await
            .unwrap();

        transactions.fail_appends.store(true, Ordering::SeqCst);
        let err = engine
            .deposit(MovementRequest::new(account_id, 50, Uuid::new_v4()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InconsistentWrite);

        let report = Reconciler::new(accounts, transactions)
            .reconcile_account(account_id)
            .await
            .unwrap();
        assert!(!report.consistent);
        assert_eq!(report.expected_balance, 1_200);
        assert_eq!(report.actual_balance, 1_250);
        assert!(report.issues.contains(&ReconciliationIssue::BalanceMismatch {
            expected: 1_200,
            actual: 1_250
        }));
        assert!(report.issues.contains(&ReconciliationIssue::ChainEndsOffBalance {
            last_after: 1_200,
            balance: 1_250
        }));
    }

    #[tokio::test]
    async fn unrecorded_cancellation_is_detected() {
        let (engine, accounts, transactions) = faulty_engine();
        let account_id = open_account(&engine, 0, 0).await;
        let receipt = engine
            .deposit(MovementRequest::new(account_id, 400, Uuid::new_v4()))
            .await
            .unwrap();

        transactions.fail_completions.store(true, Ordering::SeqCst);
        let err = engine
            .cancel_transaction(cancellation(receipt.transaction_id))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InconsistentWrite);

        let report = Reconciler::new(accounts, transactions)
            .reconcile_account(account_id)
            .await
            .unwrap();
        assert!(!report.consistent);
        assert!(report.issues.contains(&ReconciliationIssue::BalanceMismatch {
            expected: 400,
            actual: 0
        }));
        assert!(report.issues.iter().any(|issue| matches!(
            issue,
            ReconciliationIssue::OutstandingClaim { transaction_id, .. } if *transaction_id == receipt.transaction_id
        )));
    }

    #[tokio::test]
    async fn abandoned_claim_is_released_once_old_enough() {
        let (engine, accounts, transactions) = memory_engine();
        let account_id = open_account(&engine, 1_000, 0).await;
        let receipt = engine
            .deposit(MovementRequest::new(account_id, 300, Uuid::new_v4()))
            .await
            .unwrap();

        // A cancellation that stopped right after taking its claim.
        let abandoned = Uuid::new_v4();
        transactions
            .claim_cancellation(receipt.transaction_id, abandoned)
            .await
            .unwrap();
        let err = engine
            .cancel_transaction(cancellation(receipt.transaction_id))
            .await
            .unwrap_err();
        assert_eq!(err, LedgerError::CancellationInProgress(receipt.transaction_id));

        let reconciler = reconciler(accounts, transactions);
        let report = reconciler.reconcile_account(account_id).await.unwrap();
        assert!(report.issues.iter().any(|issue| matches!(
            issue,
            ReconciliationIssue::OutstandingClaim { claim_id, claimed_at: Some(_), .. } if *claim_id == abandoned
        )));

        let kept = reconciler
            .release_stale_claims(account_id, Duration::hours(1))
            .await
            .unwrap();
        assert!(kept.is_empty());

        let released = reconciler
            .release_stale_claims(account_id, Duration::zero())
            .await
            .unwrap();
        assert_eq!(released, vec![receipt.transaction_id]);
        assert!(reconciler.reconcile_account(account_id).await.unwrap().consistent);

        let cancelled = engine
            .cancel_transaction(cancellation(receipt.transaction_id))
            .await
            .unwrap();
        assert_eq!(cancelled.new_balance, 1_000);
        assert!(reconciler.reconcile_account(account_id).await.unwrap().consistent);
    }

    #[tokio::test]
    async fn claim_behind_an_applied_swap_is_kept() {
        let (engine, accounts, transactions) = faulty_engine();
        let account_id = open_account(&engine, 0, 0).await;
        let receipt = engine
            .deposit(MovementRequest::new(account_id, 400, Uuid::new_v4()))
            .await
            .unwrap();

        transactions.fail_completions.store(true, Ordering::SeqCst);
        engine
            .cancel_transaction(cancellation(receipt.transaction_id))
            .await
            .unwrap_err();
        transactions.fail_completions.store(false, Ordering::SeqCst);

        let reconciler = Reconciler::new(accounts, transactions.clone());
        let err = reconciler
            .release_stale_claims(account_id, Duration::zero())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);

        let record = transactions.find_by_id(receipt.transaction_id).await.unwrap().unwrap();
        assert!(record.cancellation_claim.is_some());
        assert_eq!(engine.get_account(account_id).await.unwrap().balance, 0);
    }

    #[tokio::test]
    async fn tampered_record_is_detected() {
        let (engine, accounts, transactions) = memory_engine();
        let account_id = open_account(&engine, 100, 0).await;
        let account = accounts.find_by_id(account_id).await.unwrap().unwrap();

        let mut forged = TransactionModel::completed(
            account_id,
            account.customer_id,
            savings_core_api::TransactionType::Deposit,
            10,
            100,
            110,
            1,
            Uuid::new_v4(),
            None,
            None,
            chrono::Utc::now(),
        )
        .unwrap();
        forged.amount = 20;
        let forged_id = forged.id;
        let mut duplicate = forged.clone();
        duplicate.id = Uuid::new_v4();
        transactions.create_batch(vec![forged, duplicate]).await.unwrap();

        let report = reconciler(accounts, transactions)
            .reconcile_account(account_id)
            .await
            .unwrap();
        assert!(report
            .issues
            .contains(&ReconciliationIssue::HashMismatch { transaction_id: forged_id }));
        assert!(report
            .issues
            .contains(&ReconciliationIssue::SnapshotArithmetic { transaction_id: forged_id }));
        assert!(report
            .issues
            .contains(&ReconciliationIssue::DuplicateVersion { account_version: 1 }));
        assert!(report.issues.contains(&ReconciliationIssue::VersionAhead {
            account_version: 1,
            account_at: 0
        }));
        assert!(report.issues.contains(&ReconciliationIssue::BrokenChain {
            account_version: 1,
            expected_before: 110,
            recorded_before: 100
        }));
    }

    #[tokio::test]
    async fn reconcile_all_reports_every_account() {
        let (engine, accounts, transactions) = memory_engine();
        open_account(&engine, 10, 0).await;
        open_account(&engine, 20, 0).await;

        let reports = reconciler(accounts, transactions).reconcile_all().await.unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|report| report.consistent));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Deposit(i64),
        Withdraw(i64),
        Cancel(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (1i64..2_000).prop_map(Op::Deposit),
            (1i64..2_000).prop_map(Op::Withdraw),
            any::<usize>().prop_map(Op::Cancel),
        ]
    }

    /// Applies `ops` one by one and checks every outcome against a plain model.
    async fn replay_against_model(opening: i64, minimum: i64, ops: Vec<Op>) -> Result<(), TestCaseError> {
        let (engine, accounts, transactions) = memory_engine();
        let account_id = open_account(&engine, opening, minimum).await;
        let actor = Uuid::new_v4();

        let mut balance = opening;
        // (transaction id, signed amount, cancelled)
        let mut applied: Vec<(Uuid, i64, bool)> = Vec::new();

        for op in ops {
            match op {
                Op::Deposit(amount) => {
                    let receipt = engine
                        .deposit(MovementRequest::new(account_id, amount, actor))
                        .await
                        .map_err(|e| TestCaseError::fail(e.to_string()))?;
                    balance += amount;
                    prop_assert_eq!(receipt.new_balance, balance);
                    applied.push((receipt.transaction_id, amount, false));
                }
                Op::Withdraw(amount) => {
                    let result = engine
                        .withdraw(MovementRequest::new(account_id, amount, actor))
                        .await;
                    if balance - amount >= minimum {
                        let receipt = result.map_err(|e| TestCaseError::fail(e.to_string()))?;
                        balance -= amount;
                        prop_assert_eq!(receipt.new_balance, balance);
                        applied.push((receipt.transaction_id, -amount, false));
                    } else {
                        prop_assert!(
                            matches!(result, Err(LedgerError::InsufficientFunds { .. })),
                            "expected insufficient funds, got {:?}",
                            result
                        );
                    }
                }
                Op::Cancel(pick) => {
                    if applied.is_empty() {
                        continue;
                    }
                    let slot = pick % applied.len();
                    let (transaction_id, signed, cancelled) = applied[slot];
                    let result = engine.cancel_transaction(cancellation(transaction_id)).await;
                    if cancelled {
                        prop_assert_eq!(result, Err(LedgerError::AlreadyCancelled(transaction_id)));
                    } else if signed > 0 && balance - signed < 0 {
                        prop_assert!(
                            matches!(result, Err(LedgerError::InsufficientFunds { floor: 0, .. })),
                            "expected insufficient funds above a zero floor, got {:?}",
                            result
                        );
                    } else {
                        let receipt = result.map_err(|e| TestCaseError::fail(e.to_string()))?;
                        balance -= signed;
                        prop_assert_eq!(receipt.new_balance, balance);
                        applied[slot].2 = true;
                    }
                }
            }
        }

        let stored = engine
            .get_account(account_id)
            .await
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(stored.balance, balance);
        let completed: i64 = applied
            .iter()
            .filter(|(_, _, cancelled)| !cancelled)
            .map(|(_, signed, _)| signed)
            .sum();
        prop_assert_eq!(stored.balance, opening + completed);

        let report = Reconciler::new(accounts, transactions)
            .reconcile_account(account_id)
            .await
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert!(report.consistent, "{:?}", report.issues);
        Ok(())
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            ..ProptestConfig::default()
        })]

        /// Any sequence of movements and cancellations keeps the balance equal
        /// to the opening balance plus the completed records, and leaves a log
        /// the reconciler accepts.
        #[test]
        fn balance_always_matches_the_log(
            opening in 0i64..5_000,
            minimum in 0i64..1_000,
            ops in prop::collection::vec(op(), 1..40),
        ) {
            let opening = opening.max(minimum);
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(replay_against_model(opening, minimum, ops))?;
        }
    }
}
