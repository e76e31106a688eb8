use chrono::Utc;
use savings_core_api::{AccountView, ChangeStatusRequest, LedgerError, LedgerResult, OpenAccountRequest};
use savings_core_db::models::account::AccountModel;
use savings_core_db::repository::{AccountStore, SwapOutcome, TransactionLog};
use validator::Validate;

use super::retry::Backoff;
use super::{storage_error, LedgerEngine};

impl<A, T> LedgerEngine<A, T>
where
    A: AccountStore + 'static,
    T: TransactionLog + 'static,
{
    #[tracing::instrument(skip(self, request), fields(customer_id = %request.customer_id))]
    pub(crate) async fn open_account_now(&self, request: OpenAccountRequest) -> LedgerResult<AccountView> {
        request.validate()?;
        let account = AccountModel::open(&request, Utc::now());

        let mut saved = self
            .accounts
            .create_batch(vec![account])
            .await
            .map_err(storage_error)?;
        let account = saved
            .pop()
            .ok_or_else(|| LedgerError::internal("account store accepted an empty batch"))?;

        tracing::info!(account_id = %account.id, opening_balance = account.opening_balance, "account opened");
        Ok(AccountView::from(account))
    }

    /// Moves the account to `request.status` through the version CAS.
    /// `Closed` is terminal.
    #[tracing::instrument(skip(self, request), fields(account_id = %request.account_id, status = %request.status))]
    pub(crate) async fn change_status_now(&self, request: ChangeStatusRequest) -> LedgerResult<AccountView> {
        let account_id = request.account_id;
        let mut backoff = Backoff::new(&self.config);
        loop {
            let account = self.load_account(account_id).await?;
            if !account.status.can_transition_to(request.status) {
                return Err(LedgerError::IllegalStatusTransition {
                    account_id,
                    from: account.status.to_string(),
                    to: request.status.to_string(),
                });
            }

            match self
                .accounts
                .update_status(account_id, account.version, request.status)
                .await
                .map_err(storage_error)?
            {
                SwapOutcome::Swapped(updated) => {
                    tracing::info!(from = %account.status, actor = %request.actor, "account status changed");
                    return Ok(AccountView::from(updated));
                }
                SwapOutcome::VersionConflict => backoff.wait(account_id).await?,
                SwapOutcome::NotFound => return Err(LedgerError::AccountNotFound(account_id)),
            }
        }
    }
}
