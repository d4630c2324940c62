use meridian_common::{
    api::PaymentGatewayKind, error::BalanceError, id::Id, referral::ReferralError,
};
use sled::transaction::TransactionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Insufficient funds: need {need}, have {have}")]
    InsufficientFunds { need: u64, have: u64 },
    #[error("Insufficient tokens: need {need}, have {have}")]
    InsufficientTokens { need: u64, have: u64 },
    #[error("Amount must be greater than zero")]
    InvalidAmount,
    #[error("Balance overflow")]
    Overflow,
    #[error("Amount {amount} is outside the allowed range {min}..={max}")]
    AmountOutOfRange { amount: u64, min: u64, max: u64 },
    #[error("tokenAmount or fiatAmount is required")]
    MissingPurchaseAmount,
    #[error("Invalid payment signature")]
    InvalidSignature,
    #[error("merchantTransactionId missing")]
    MissingCorrelationId,
    #[error("No pending record for merchant transaction id {0}")]
    UnresolvedCorrelationId(String),
    #[error("Merchant transaction id {0} is already bound to another record")]
    DuplicateCorrelationId(String),
    #[error("Transaction {0} not found")]
    TransactionNotFound(Id),
    #[error("Order {0} not found")]
    OrderNotFound(Id),
    #[error("Records must be created as initiated or pending, got {0}")]
    InvalidInitialStatus(String),
    #[error("Nothing to update")]
    NothingToUpdate,
    #[error("No referral balance to redeem")]
    NothingToRedeem,
    #[error("Payment gateway {0} is not configured")]
    GatewayNotConfigured(PaymentGatewayKind),
    #[error("Payment gateway error: {0}")]
    Gateway(String),
    #[error(transparent)]
    Referral(#[from] ReferralError),
    #[error("Too many concurrent updates in {0}")]
    Contention(&'static str),
    #[error("Corrupted data in {0}")]
    CorruptedData(&'static str),
    #[error(transparent)]
    Sled(#[from] sled::Error),
    #[error(transparent)]
    Bincode(#[from] bincode::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl LedgerError {
    /// Errors caused by the request itself rather than by the backend
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::InsufficientFunds { .. }
            | Self::InsufficientTokens { .. }
            | Self::InvalidAmount
            | Self::Overflow
            | Self::AmountOutOfRange { .. }
            | Self::MissingPurchaseAmount
            | Self::InvalidSignature
            | Self::MissingCorrelationId
            | Self::UnresolvedCorrelationId(_)
            | Self::DuplicateCorrelationId(_)
            | Self::InvalidInitialStatus(_)
            | Self::NothingToUpdate
            | Self::NothingToRedeem
            | Self::GatewayNotConfigured(_) => true,
            Self::Referral(e) => !matches!(
                e,
                ReferralError::CodeExhausted
                    | ReferralError::UserNotFound
                    | ReferralError::EarningNotFound
            ),
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::TransactionNotFound(_)
                | Self::OrderNotFound(_)
                | Self::Referral(ReferralError::UserNotFound)
                | Self::Referral(ReferralError::EarningNotFound)
        )
    }
}

impl From<BalanceError> for LedgerError {
    fn from(e: BalanceError) -> Self {
        match e {
            BalanceError::Overflow => Self::Overflow,
            BalanceError::ZeroAmount => Self::InvalidAmount,
            BalanceError::InsufficientFunds { need, have } => Self::InsufficientFunds { need, have },
            BalanceError::InsufficientTokens { need, have } => {
                Self::InsufficientTokens { need, have }
            }
        }
    }
}

impl From<TransactionError<LedgerError>> for LedgerError {
    fn from(e: TransactionError<LedgerError>) -> Self {
        match e {
            TransactionError::Abort(e) => e,
            TransactionError::Storage(e) => Self::Sled(e),
        }
    }
}
