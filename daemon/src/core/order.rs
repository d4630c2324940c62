use log::{info, warn};
use meridian_common::{
    api::{
        daemon::{PlaceOrderParams, PlaceOrderResult},
        PaymentSessionRequest,
    },
    id::{Id, UserId},
    transaction::{Order, OrderPaymentStatus, TransitionDetails},
};

use crate::core::{
    error::LedgerError,
    payment::PaymentBridge,
    storage::{CorrelationTarget, Storage},
    transaction_log::TransactionLog,
};

/// Storefront order payments.
/// The bridge confirms the order and pays commission once the gateway reports it paid.
pub struct OrderService<S: Storage> {
    log: TransactionLog<S>,
    bridge: PaymentBridge<S>,
}

impl<S: Storage> Clone for OrderService<S> {
    fn clone(&self) -> Self {
        Self {
            log: self.log.clone(),
            bridge: self.bridge.clone(),
        }
    }
}

impl<S: Storage> OrderService<S> {
    pub fn new(log: TransactionLog<S>, bridge: PaymentBridge<S>) -> Self {
        Self { log, bridge }
    }

    pub async fn get(&self, id: &Id) -> Result<Order, LedgerError> {
        self.log.get_order(id).await
    }

    pub async fn place_order(
        &self,
        user: &UserId,
        params: PlaceOrderParams,
    ) -> Result<PlaceOrderResult, LedgerError> {
        let order = self.log.record_order(Order::new(*user, params.amount)).await?;

        let request = PaymentSessionRequest::new(&order.id, user, order.amount)
            .with_redirect_url(params.redirect_url);
        let payment_session = match self
            .bridge
            .create_session(CorrelationTarget::order(order.id), &request)
            .await
        {
            Ok(session) => session,
            Err(e) => {
                warn!("could not open a payment session for order {}: {}", order.id, e);
                self.log
                    .transition_order(&order.id, OrderPaymentStatus::Failed, &TransitionDetails::default())
                    .await?;
                return Err(e);
            }
        };

        info!("order {} of {} placed by {}", order.id, order.amount, user);
        Ok(PlaceOrderResult {
            order,
            payment_session,
        })
    }
}
