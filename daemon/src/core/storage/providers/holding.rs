use crate::core::error::LedgerError;
use async_trait::async_trait;
use meridian_common::{
    account::{HoldingMutation, IcoHolding},
    id::UserId,
};

#[async_trait]
pub trait HoldingProvider {
    async fn get_holding(&self, user: &UserId) -> Result<Option<IcoHolding>, LedgerError>;

    // Apply a mutation in a single conditional write, creating an empty holding if needed
    async fn update_holding(
        &self,
        user: &UserId,
        mutation: HoldingMutation,
    ) -> Result<IcoHolding, LedgerError>;

    async fn get_holdings(&self) -> Result<Vec<IcoHolding>, LedgerError>;
}
