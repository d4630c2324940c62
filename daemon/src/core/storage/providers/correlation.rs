use crate::core::error::LedgerError;
use async_trait::async_trait;
use meridian_common::id::Id;
use serde::{Deserialize, Serialize};

/// Record family a gateway merchant transaction id points to
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
pub enum CorrelationKind {
    Order,
    Ico,
    Wallet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationTarget {
    pub kind: CorrelationKind,
    pub id: Id,
}

impl CorrelationTarget {
    pub fn order(id: Id) -> Self {
        Self {
            kind: CorrelationKind::Order,
            id,
        }
    }

    pub fn ico(id: Id) -> Self {
        Self {
            kind: CorrelationKind::Ico,
            id,
        }
    }

    pub fn wallet(id: Id) -> Self {
        Self {
            kind: CorrelationKind::Wallet,
            id,
        }
    }
}

#[async_trait]
pub trait CorrelationProvider {
    // Bind a merchant transaction id to a record, insert-if-absent
    // Registering the same binding twice is accepted,
    // a different binding fails with `DuplicateCorrelationId`
    async fn register_correlation(
        &self,
        merchant_transaction_id: &str,
        target: &CorrelationTarget,
    ) -> Result<(), LedgerError>;

    async fn get_correlation(
        &self,
        merchant_transaction_id: &str,
    ) -> Result<Option<CorrelationTarget>, LedgerError>;
}
