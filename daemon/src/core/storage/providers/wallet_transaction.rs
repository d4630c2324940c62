use crate::core::error::LedgerError;
use async_trait::async_trait;
use meridian_common::{
    api::PaymentSession,
    id::Id,
    transaction::{
        Transition, TransactionFilter, TransactionStatus, TransitionDetails, WalletTransaction,
    },
};

#[async_trait]
pub trait WalletTransactionProvider {
    async fn insert_wallet_transaction(&self, tx: &WalletTransaction) -> Result<(), LedgerError>;

    async fn get_wallet_transaction(&self, id: &Id)
        -> Result<Option<WalletTransaction>, LedgerError>;

    // Conditional status write, see `transaction::transition`
    // Errors with `TransactionNotFound` if no record has this id
    async fn transition_wallet_transaction(
        &self,
        id: &Id,
        status: TransactionStatus,
        details: &TransitionDetails,
    ) -> Result<Transition<WalletTransaction>, LedgerError>;

    // Store the gateway merchant id and session bundle of a record
    async fn set_wallet_transaction_session(
        &self,
        id: &Id,
        merchant_transaction_id: &str,
        session: &PaymentSession,
    ) -> Result<WalletTransaction, LedgerError>;

    async fn set_wallet_transaction_note(
        &self,
        id: &Id,
        admin_note: &str,
    ) -> Result<WalletTransaction, LedgerError>;

    // Matching records, newest first
    async fn get_wallet_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<WalletTransaction>, LedgerError>;
}
