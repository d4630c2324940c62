use crate::core::error::LedgerError;
use async_trait::async_trait;
use meridian_common::{
    account::{AccountMutation, WalletAccount},
    id::UserId,
};

#[async_trait]
pub trait AccountProvider {
    // Get the wallet account of a user, if it was created
    async fn get_wallet_account(&self, user: &UserId)
        -> Result<Option<WalletAccount>, LedgerError>;

    // Create the account if absent and return the stored one
    // Concurrent callers all receive the same account
    async fn get_or_create_wallet_account(
        &self,
        user: &UserId,
        currency: &str,
    ) -> Result<WalletAccount, LedgerError>;

    // Apply a mutation in a single conditional write
    // A missing account is created with `currency` before the mutation
    async fn update_wallet_account(
        &self,
        user: &UserId,
        currency: &str,
        mutation: AccountMutation,
    ) -> Result<WalletAccount, LedgerError>;

    // Every stored account, in key order
    async fn get_wallet_accounts(&self) -> Result<Vec<WalletAccount>, LedgerError>;
}
