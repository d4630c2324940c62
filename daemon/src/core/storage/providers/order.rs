use crate::core::error::LedgerError;
use async_trait::async_trait;
use meridian_common::{
    id::Id,
    transaction::{Order, OrderPaymentStatus, Transition, TransitionDetails},
};

#[async_trait]
pub trait OrderProvider {
    async fn insert_order(&self, order: &Order) -> Result<(), LedgerError>;

    async fn get_order(&self, id: &Id) -> Result<Option<Order>, LedgerError>;

    // Errors with `OrderNotFound` if no order has this id
    async fn transition_order(
        &self,
        id: &Id,
        status: OrderPaymentStatus,
        details: &TransitionDetails,
    ) -> Result<Transition<Order>, LedgerError>;
}
