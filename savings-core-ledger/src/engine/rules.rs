//! Business checks evaluated against a freshly read account on every attempt.

use savings_core_api::{LedgerError, LedgerResult, WithdrawalDecision, WithdrawalRefusal};
use savings_core_db::models::account::AccountModel;

pub fn ensure_active(account: &AccountModel) -> LedgerResult<()> {
    if account.status.allows_mutation() {
        Ok(())
    } else {
        Err(LedgerError::AccountNotActive {
            account_id: account.id,
            status: account.status.to_string(),
        })
    }
}

/// Whether `amount` may leave `account` without breaching its minimum balance.
pub fn withdrawal_decision(account: &AccountModel, amount: i64) -> WithdrawalDecision {
    if !account.status.allows_mutation() {
        return WithdrawalDecision::refused(WithdrawalRefusal::AccountNotActive);
    }
    match account.balance.checked_sub(amount) {
        Some(remaining) if remaining >= account.minimum_balance => WithdrawalDecision::allowed(),
        _ => WithdrawalDecision::refused(WithdrawalRefusal::InsufficientFunds),
    }
}

/// Balance after a withdrawal, or the typed refusal.
pub fn balance_after_withdrawal(account: &AccountModel, amount: i64) -> LedgerResult<i64> {
    ensure_active(account)?;
    match withdrawal_decision(account, amount).reason {
        None => Ok(account.balance - amount),
        Some(_) => Err(LedgerError::InsufficientFunds {
            account_id: account.id,
            balance: account.balance,
            requested: amount,
            floor: account.minimum_balance,
        }),
    }
}

pub fn balance_after_deposit(account: &AccountModel, amount: i64) -> LedgerResult<i64> {
    ensure_active(account)?;
    account
        .balance
        .checked_add(amount)
        .ok_or_else(|| LedgerError::validation("deposit would overflow the account balance"))
}

/// Balance after the compensating entry of a cancellation.
///
/// Cancelling a deposit takes the amount back out and may not drive the
/// balance negative; the minimum balance does not apply to corrections.
pub fn balance_after_compensation(account: &AccountModel, signed_amount: i64) -> LedgerResult<i64> {
    ensure_active(account)?;
    let next = account
        .balance
        .checked_sub(signed_amount)
        .ok_or_else(|| LedgerError::validation("cancellation would overflow the account balance"))?;
    if signed_amount > 0 && next < 0 {
        return Err(LedgerError::InsufficientFunds {
            account_id: account.id,
            balance: account.balance,
            requested: signed_amount,
            floor: 0,
        });
    }
    Ok(next)
}
