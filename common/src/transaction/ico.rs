use serde::{Deserialize, Serialize};

use crate::{
    error::BalanceError,
    id::{Id, UserId},
    time::{get_current_time_in_millis, TimestampMillis},
    utils::fiat_for_tokens,
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
pub enum IcoTransactionType {
    Buy,
    Sell,
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
pub enum IcoTransactionStatus {
    Initiated,
    Pending,
    Completed,
    Failed,
}

impl StatusLifecycle for IcoTransactionStatus {
    fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    fn is_initial(&self) -> bool {
        matches!(self, Self::Initiated)
    }
}

/// Token purchase or sale at a fixed price snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IcoTransaction {
    pub id: Id,
    pub user: UserId,
    #[serde(rename = "type")]
    pub kind: IcoTransactionType,
    /// Token atomic units
    pub token_amount: u64,
    /// Fiat minor units per whole token
    pub price_per_token: u64,
    pub fiat_amount: u64,
    pub status: IcoTransactionStatus,
    pub payment_reference: Option<String>,
    pub gateway_transaction_id: Option<String>,
    pub created_at: TimestampMillis,
    pub updated_at: TimestampMillis,
}

impl IcoTransaction {
    /// Build a record, the fiat amount is derived from the token amount and price
    pub fn new(
        user: UserId,
        kind: IcoTransactionType,
        token_amount: u64,
        price_per_token: u64,
        status: IcoTransactionStatus,
    ) -> Result<Self, BalanceError> {
        if token_amount == 0 || price_per_token == 0 {
            return Err(BalanceError::ZeroAmount);
        }

        let fiat_amount =
            fiat_for_tokens(token_amount, price_per_token).ok_or(BalanceError::Overflow)?;
        let now = get_current_time_in_millis();
        Ok(Self {
            id: Id::random(),
            user,
            kind,
            token_amount,
            price_per_token,
            fiat_amount,
            status,
            payment_reference: None,
            gateway_transaction_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn with_payment_reference(mut self, reference: impl Into<String>) -> Self {
        self.payment_reference = Some(reference.into());
        self
    }
}

impl Transitional for IcoTransaction {
    type Status = IcoTransactionStatus;

    fn status(&self) -> IcoTransactionStatus {
        self.status
    }

    fn apply_status(&mut self, status: IcoTransactionStatus, details: &TransitionDetails) {
        self.status = status;
        if let Some(id) = &details.gateway_transaction_id {
            self.gateway_transaction_id = Some(id.clone());
        }
    }

    fn set_updated_at(&mut self, timestamp: u64) {
        self.updated_at = timestamp;
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IcoTransactionFilter {
    pub user: Option<UserId>,
    pub status: Option<IcoTransactionStatus>,
    #[serde(rename = "type")]
    pub kind: Option<IcoTransactionType>,
}

impl IcoTransactionFilter {
    pub fn for_user(user: UserId) -> Self {
        Self {
            user: Some(user),
            ..Default::default()
        }
    }

    pub fn matches(&self, tx: &IcoTransaction) -> bool {
        self.user.map_or(true, |user| tx.user == user)
            && self.status.map_or(true, |status| tx.status == status)
            && self.kind.map_or(true, |kind| tx.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{FIAT_VALUE, TOKEN_VALUE},
        transaction::transition,
    };

    #[test]
    fn test_fiat_amount_derived() {
        let tx = IcoTransaction::new(
            Id::random(),
            IcoTransactionType::Buy,
            3 * TOKEN_VALUE,
            10 * FIAT_VALUE,
            IcoTransactionStatus::Initiated,
        )
        .unwrap();
        assert_eq!(tx.fiat_amount, 30 * FIAT_VALUE);
    }

    #[test]
    fn test_zero_tokens_rejected() {
        let err = IcoTransaction::new(
            Id::random(),
            IcoTransactionType::Sell,
            0,
            10,
            IcoTransactionStatus::Pending,
        )
        .unwrap_err();
        assert_eq!(err, BalanceError::ZeroAmount);
    }

    #[test]
    fn test_failed_then_completed_is_ignored() {
        let mut tx = IcoTransaction::new(
            Id::random(),
            IcoTransactionType::Buy,
            TOKEN_VALUE,
            FIAT_VALUE,
            IcoTransactionStatus::Initiated,
        )
        .unwrap();
        assert!(transition(&mut tx, IcoTransactionStatus::Failed, &TransitionDetails::default()));
        assert!(!transition(&mut tx, IcoTransactionStatus::Completed, &TransitionDetails::default()));
        assert_eq!(tx.status, IcoTransactionStatus::Failed);
    }
}
