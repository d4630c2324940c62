use async_trait::async_trait;
use log::trace;
use meridian_common::{
    account::{HoldingMutation, IcoHolding},
    id::UserId,
};

use crate::core::{
    error::LedgerError,
    storage::{
        sled::{Update, HOLDINGS},
        HoldingProvider, SledStorage,
    },
};

#[async_trait]
impl HoldingProvider for SledStorage {
    async fn get_holding(&self, user: &UserId) -> Result<Option<IcoHolding>, LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("get holding of {}", user);
        }
        Self::load_optional_from_disk(&self.holdings, user.as_bytes())
    }

    async fn update_holding(
        &self,
        user: &UserId,
        mutation: HoldingMutation,
    ) -> Result<IcoHolding, LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("update holding of {} with {:?}", user, mutation);
        }
        Self::update_with(
            &self.holdings,
            HOLDINGS,
            user.as_bytes(),
            |current: Option<IcoHolding>| {
                let mut holding = current.unwrap_or_else(|| IcoHolding::new(*user));
                mutation.apply(&mut holding)?;
                Ok(Update::Write(holding.clone(), holding))
            },
        )
    }

    async fn get_holdings(&self) -> Result<Vec<IcoHolding>, LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("get all holdings");
        }
        Self::scan_tree(&self.holdings)
    }
}
