use async_trait::async_trait;
use log::trace;
use meridian_common::{
    id::Id,
    transaction::{transition, Order, OrderPaymentStatus, Transition, TransitionDetails},
};

use crate::core::{
    error::LedgerError,
    storage::{
        sled::{Update, ORDERS},
        OrderProvider, SledStorage,
    },
};

#[async_trait]
impl OrderProvider for SledStorage {
    async fn insert_order(&self, order: &Order) -> Result<(), LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("insert order {}", order.id);
        }
        Self::insert_into_disk(&self.orders, order.id.as_bytes(), order)
    }

    async fn get_order(&self, id: &Id) -> Result<Option<Order>, LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("get order {}", id);
        }
        Self::load_optional_from_disk(&self.orders, id.as_bytes())
    }

    async fn transition_order(
        &self,
        id: &Id,
        status: OrderPaymentStatus,
        details: &TransitionDetails,
    ) -> Result<Transition<Order>, LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("transition order {} to {}", id, status);
        }
        Self::update_with(&self.orders, ORDERS, id.as_bytes(), |current: Option<Order>| {
            let mut order = current.ok_or(LedgerError::OrderNotFound(*id))?;
            Ok(if transition(&mut order, status, details) {
                Update::Write(order.clone(), Transition::Applied(order))
            } else {
                Update::Keep(Transition::Unchanged(order))
            })
        })
    }
}
