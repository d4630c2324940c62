use serde::{Deserialize, Serialize};

use crate::{
    id::{Id, UserId},
    time::{get_current_time_in_millis, TimestampMillis},
};

use super::status::{StatusLifecycle, TransitionDetails, Transitional};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderPaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl StatusLifecycle for OrderPaymentStatus {
    fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::Failed)
    }

    fn is_initial(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
}

/// Storefront order, only its payment part is tracked here
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Id,
    pub user: UserId,
    /// Total in fiat minor units
    pub amount: u64,
    pub payment_status: OrderPaymentStatus,
    pub status: OrderStatus,
    pub gateway_transaction_id: Option<String>,
    pub created_at: TimestampMillis,
    pub updated_at: TimestampMillis,
}

impl Order {
    pub fn new(user: UserId, amount: u64) -> Self {
        let now = get_current_time_in_millis();
        Self {
            id: Id::random(),
            user,
            amount,
            payment_status: OrderPaymentStatus::Pending,
            status: OrderStatus::Pending,
            gateway_transaction_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Transitional for Order {
    type Status = OrderPaymentStatus;

    fn status(&self) -> OrderPaymentStatus {
        self.payment_status
    }

    fn apply_status(&mut self, status: OrderPaymentStatus, details: &TransitionDetails) {
        self.payment_status = status;
        // Failed payments leave the order status pending
        if status == OrderPaymentStatus::Paid {
            self.status = OrderStatus::Confirmed;
        }
        if let Some(id) = &details.gateway_transaction_id {
            self.gateway_transaction_id = Some(id.clone());
        }
    }

    fn set_updated_at(&mut self, timestamp: u64) {
        self.updated_at = timestamp;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::transition;

    #[test]
    fn test_paid_confirms_order() {
        let mut order = Order::new(Id::random(), 1000);
        assert!(transition(&mut order, OrderPaymentStatus::Paid, &TransitionDetails::default()));
        assert_eq!(order.status, OrderStatus::Confirmed);
    }

    #[test]
    fn test_failed_keeps_order_pending() {
        let mut order = Order::new(Id::random(), 1000);
        assert!(transition(&mut order, OrderPaymentStatus::Failed, &TransitionDetails::default()));
        assert_eq!(order.payment_status, OrderPaymentStatus::Failed);
        assert_eq!(order.status, OrderStatus::Pending);
    }
}
