use async_trait::async_trait;
use log::trace;
use meridian_common::{
    account::{AccountMutation, WalletAccount},
    id::UserId,
};

use crate::core::{
    error::LedgerError,
    storage::{
        sled::{Update, WALLET_ACCOUNTS},
        AccountProvider, SledStorage,
    },
};

#[async_trait]
impl AccountProvider for SledStorage {
    async fn get_wallet_account(
        &self,
        user: &UserId,
    ) -> Result<Option<WalletAccount>, LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("get wallet account of {}", user);
        }
        Self::load_optional_from_disk(&self.wallet_accounts, user.as_bytes())
    }

    async fn get_or_create_wallet_account(
        &self,
        user: &UserId,
        currency: &str,
    ) -> Result<WalletAccount, LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("get or create wallet account of {}", user);
        }
        Self::update_with(
            &self.wallet_accounts,
            WALLET_ACCOUNTS,
            user.as_bytes(),
            |current: Option<WalletAccount>| {
                Ok(match current {
                    Some(account) => Update::Keep(account),
                    None => {
                        let account = WalletAccount::new(*user).with_currency(currency);
                        Update::Write(account.clone(), account)
                    }
                })
            },
        )
    }

    async fn update_wallet_account(
        &self,
        user: &UserId,
        currency: &str,
        mutation: AccountMutation,
    ) -> Result<WalletAccount, LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("update wallet account of {} with {:?}", user, mutation);
        }
        Self::update_with(
            &self.wallet_accounts,
            WALLET_ACCOUNTS,
            user.as_bytes(),
            |current: Option<WalletAccount>| {
                let mut account =
                    current.unwrap_or_else(|| WalletAccount::new(*user).with_currency(currency));
                mutation.apply(&mut account)?;
                Ok(Update::Write(account.clone(), account))
            },
        )
    }

    async fn get_wallet_accounts(&self) -> Result<Vec<WalletAccount>, LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("get all wallet accounts");
        }
        Self::scan_tree(&self.wallet_accounts)
    }
}
