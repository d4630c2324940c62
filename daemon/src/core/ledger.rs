// Account ledger: cash wallets and token holdings
//
// Every balance change is one conditional write through the storage,
// so concurrent credits and debits on the same account never lose an update.

use std::sync::Arc;

use log::{debug, trace};
use meridian_common::{
    account::{AccountMutation, HoldingMutation, IcoHolding, WalletAccount},
    id::UserId,
};

use crate::core::{error::LedgerError, storage::Storage};

pub struct AccountLedger<S: Storage> {
    storage: Arc<S>,
    currency: String,
}

impl<S: Storage> Clone for AccountLedger<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            currency: self.currency.clone(),
        }
    }
}

impl<S: Storage> AccountLedger<S> {
    pub fn new(storage: Arc<S>, currency: String) -> Self {
        Self { storage, currency }
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub async fn get_or_create(&self, user: &UserId) -> Result<WalletAccount, LedgerError> {
        self.storage
            .get_or_create_wallet_account(user, &self.currency)
            .await
    }

    async fn apply(
        &self,
        user: &UserId,
        mutation: AccountMutation,
    ) -> Result<WalletAccount, LedgerError> {
        if mutation.amount() == 0 {
            return Err(LedgerError::InvalidAmount);
        }

        let account = self
            .storage
            .update_wallet_account(user, &self.currency, mutation)
            .await?;
        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "{:?} on wallet of {}: balance {}, pending withdrawals {}",
                mutation, user, account.balance, account.pending_withdrawals
            );
        }
        Ok(account)
    }

    pub async fn credit(&self, user: &UserId, amount: u64) -> Result<WalletAccount, LedgerError> {
        self.apply(user, AccountMutation::Credit(amount)).await
    }

    // Fails with InsufficientFunds and leaves the account untouched
    pub async fn debit(&self, user: &UserId, amount: u64) -> Result<WalletAccount, LedgerError> {
        self.apply(user, AccountMutation::Debit(amount)).await
    }

    // Move funds from the balance to the pending withdrawals
    pub async fn reserve_withdrawal(
        &self,
        user: &UserId,
        amount: u64,
    ) -> Result<WalletAccount, LedgerError> {
        self.apply(user, AccountMutation::ReserveWithdrawal(amount))
            .await
    }

    // Withdrawal paid out: funds leave the account for good
    pub async fn settle_withdrawal(
        &self,
        user: &UserId,
        amount: u64,
    ) -> Result<WalletAccount, LedgerError> {
        self.apply(user, AccountMutation::SettleWithdrawal(amount))
            .await
    }

    // Withdrawal refused: funds go back to the balance
    pub async fn release_withdrawal(
        &self,
        user: &UserId,
        amount: u64,
    ) -> Result<WalletAccount, LedgerError> {
        self.apply(user, AccountMutation::ReleaseWithdrawal(amount))
            .await
    }

    /// Holding of a user, an empty one if nothing was ever bought
    pub async fn get_holding(&self, user: &UserId) -> Result<IcoHolding, LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("get holding of {}", user);
        }
        Ok(self
            .storage
            .get_holding(user)
            .await?
            .unwrap_or_else(|| IcoHolding::new(*user)))
    }

    pub async fn increment_holding(
        &self,
        user: &UserId,
        tokens: u64,
    ) -> Result<IcoHolding, LedgerError> {
        if tokens == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        self.storage
            .update_holding(user, HoldingMutation::Increment(tokens))
            .await
    }

    // Fails with InsufficientTokens and leaves the holding untouched
    pub async fn decrement_holding(
        &self,
        user: &UserId,
        tokens: u64,
    ) -> Result<IcoHolding, LedgerError> {
        if tokens == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        self.storage
            .update_holding(user, HoldingMutation::Decrement(tokens))
            .await
    }
}
