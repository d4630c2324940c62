use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    api::PaymentSession,
    config::DEFAULT_CURRENCY,
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
pub enum TransactionStatus {
    Initiated,
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl StatusLifecycle for TransactionStatus {
    fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    fn is_initial(&self) -> bool {
        matches!(self, Self::Initiated)
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
pub enum TransactionType {
    Credit,
    Debit,
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
pub enum TransactionCategory {
    Topup,
    Purchase,
    Withdrawal,
    Refund,
    Adjustment,
}

/// Entry of the wallet transaction log.
/// Only `status`, `gateway_transaction_id`, `admin_note`
/// and `updated_at` change after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WalletTransaction {
    pub id: Id,
    pub user: UserId,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub category: TransactionCategory,
    pub amount: u64,
    pub currency: String,
    pub status: TransactionStatus,
    pub description: Option<String>,
    pub merchant_transaction_id: Option<String>,
    pub payment_gateway: Option<String>,
    pub gateway_transaction_id: Option<String>,
    /// Session bundle returned by the gateway, never shown to the account owner
    pub gateway_payload: Option<PaymentSession>,
    pub reference_id: Option<String>,
    pub metadata: IndexMap<String, String>,
    pub admin_note: Option<String>,
    pub created_at: TimestampMillis,
    pub updated_at: TimestampMillis,
}

impl WalletTransaction {
    pub fn new(
        user: UserId,
        kind: TransactionType,
        category: TransactionCategory,
        amount: u64,
        status: TransactionStatus,
    ) -> Self {
        let now = get_current_time_in_millis();
        Self {
            id: Id::random(),
            user,
            kind,
            category,
            amount,
            currency: DEFAULT_CURRENCY.to_owned(),
            status,
            description: None,
            merchant_transaction_id: None,
            payment_gateway: None,
            gateway_transaction_id: None,
            gateway_payload: None,
            reference_id: None,
            metadata: IndexMap::new(),
            admin_note: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_payment_gateway(mut self, gateway: impl Into<String>) -> Self {
        self.payment_gateway = Some(gateway.into());
        self
    }

    pub fn with_reference_id(mut self, reference: impl Into<String>) -> Self {
        self.reference_id = Some(reference.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Copy safe to return to the account owner
    pub fn sanitized(&self) -> Self {
        let mut tx = self.clone();
        tx.gateway_payload = None;
        tx
    }
}

impl Transitional for WalletTransaction {
    type Status = TransactionStatus;

    fn status(&self) -> TransactionStatus {
        self.status
    }

    fn apply_status(&mut self, status: TransactionStatus, details: &TransitionDetails) {
        self.status = status;
        if let Some(id) = &details.gateway_transaction_id {
            self.gateway_transaction_id = Some(id.clone());
        }
        if let Some(note) = &details.admin_note {
            self.admin_note = Some(note.clone());
        }
    }

    fn set_updated_at(&mut self, timestamp: u64) {
        self.updated_at = timestamp;
    }
}

/// Listing filter, every `None` field matches everything
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilter {
    pub user: Option<UserId>,
    pub status: Option<TransactionStatus>,
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
    pub category: Option<TransactionCategory>,
}

impl TransactionFilter {
    pub fn for_user(user: UserId) -> Self {
        Self {
            user: Some(user),
            ..Default::default()
        }
    }

    pub fn matches(&self, tx: &WalletTransaction) -> bool {
        self.user.map_or(true, |user| tx.user == user)
            && self.status.map_or(true, |status| tx.status == status)
            && self.kind.map_or(true, |kind| tx.kind == kind)
            && self.category.map_or(true, |category| tx.category == category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::transition;
    use std::str::FromStr;

    fn topup() -> WalletTransaction {
        WalletTransaction::new(
            Id::random(),
            TransactionType::Credit,
            TransactionCategory::Topup,
            500,
            TransactionStatus::Initiated,
        )
    }

    #[test]
    fn test_first_terminal_write_wins() {
        let mut tx = topup();
        let details = TransitionDetails::default().with_gateway_transaction_id("G1");

        assert!(transition(&mut tx, TransactionStatus::Completed, &details));
        assert_eq!(tx.gateway_transaction_id.as_deref(), Some("G1"));

        assert!(!transition(&mut tx, TransactionStatus::Completed, &details));
        assert!(!transition(&mut tx, TransactionStatus::Failed, &TransitionDetails::default()));
        assert_eq!(tx.status, TransactionStatus::Completed);
    }

    #[test]
    fn test_initiated_to_pending_applies() {
        let mut tx = topup();
        assert!(transition(&mut tx, TransactionStatus::Pending, &TransitionDetails::default()));
        assert!(!transition(&mut tx, TransactionStatus::Initiated, &TransitionDetails::default()));
        assert_eq!(tx.status, TransactionStatus::Pending);
    }

    #[test]
    fn test_sanitized_strips_payload() {
        let mut tx = topup();
        tx.gateway_payload = Some(PaymentSession {
            endpoint: "https://pay".into(),
            encoded_payload: "abc".into(),
            checksum: "sum".into(),
        });
        assert!(tx.sanitized().gateway_payload.is_none());
        assert!(tx.gateway_payload.is_some());
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(TransactionStatus::Cancelled.to_string(), "cancelled");
        assert_eq!(
            TransactionCategory::from_str("withdrawal").unwrap(),
            TransactionCategory::Withdrawal
        );
        assert_eq!(
            serde_json::to_string(&TransactionType::Debit).unwrap(),
            "\"debit\""
        );
    }

    #[test]
    fn test_filter() {
        let tx = topup();
        assert!(TransactionFilter::for_user(tx.user).matches(&tx));
        assert!(!TransactionFilter::for_user(Id::random()).matches(&tx));

        let filter = TransactionFilter {
            category: Some(TransactionCategory::Withdrawal),
            ..Default::default()
        };
        assert!(!filter.matches(&tx));
    }
}
