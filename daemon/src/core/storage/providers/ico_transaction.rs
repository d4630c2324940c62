use crate::core::error::LedgerError;
use async_trait::async_trait;
use meridian_common::{
    id::Id,
    transaction::{
        IcoTransaction, IcoTransactionFilter, IcoTransactionStatus, Transition,
        TransitionDetails,
    },
};

#[async_trait]
pub trait IcoTransactionProvider {
    async fn insert_ico_transaction(&self, tx: &IcoTransaction) -> Result<(), LedgerError>;

    async fn get_ico_transaction(&self, id: &Id) -> Result<Option<IcoTransaction>, LedgerError>;

    async fn transition_ico_transaction(
        &self,
        id: &Id,
        status: IcoTransactionStatus,
        details: &TransitionDetails,
    ) -> Result<Transition<IcoTransaction>, LedgerError>;

    // Matching records, newest first
    async fn get_ico_transactions(
        &self,
        filter: &IcoTransactionFilter,
    ) -> Result<Vec<IcoTransaction>, LedgerError>;
}
