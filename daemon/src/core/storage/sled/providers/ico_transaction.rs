use async_trait::async_trait;
use log::trace;
use meridian_common::{
    id::Id,
    transaction::{
        transition, IcoTransaction, IcoTransactionFilter, IcoTransactionStatus, Transition,
        TransitionDetails,
    },
};

use crate::core::{
    error::LedgerError,
    storage::{
        sled::{Update, ICO_TRANSACTIONS},
        IcoTransactionProvider, SledStorage,
    },
};

#[async_trait]
impl IcoTransactionProvider for SledStorage {
    async fn insert_ico_transaction(&self, tx: &IcoTransaction) -> Result<(), LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("insert ico transaction {}", tx.id);
        }
        Self::insert_into_disk(&self.ico_transactions, tx.id.as_bytes(), tx)
    }

    async fn get_ico_transaction(&self, id: &Id) -> Result<Option<IcoTransaction>, LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("get ico transaction {}", id);
        }
        Self::load_optional_from_disk(&self.ico_transactions, id.as_bytes())
    }

    async fn transition_ico_transaction(
        &self,
        id: &Id,
        status: IcoTransactionStatus,
        details: &TransitionDetails,
    ) -> Result<Transition<IcoTransaction>, LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("transition ico transaction {} to {}", id, status);
        }
        Self::update_with(
            &self.ico_transactions,
            ICO_TRANSACTIONS,
            id.as_bytes(),
            |current: Option<IcoTransaction>| {
                let mut tx = current.ok_or(LedgerError::TransactionNotFound(*id))?;
                Ok(if transition(&mut tx, status, details) {
                    Update::Write(tx.clone(), Transition::Applied(tx))
                } else {
                    Update::Keep(Transition::Unchanged(tx))
                })
            },
        )
    }

    async fn get_ico_transactions(
        &self,
        filter: &IcoTransactionFilter,
    ) -> Result<Vec<IcoTransaction>, LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("get ico transactions matching {:?}", filter);
        }
        let mut txs: Vec<IcoTransaction> = Self::scan_tree(&self.ico_transactions)?;
        txs.retain(|tx| filter.matches(tx));
        txs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(txs)
    }
}
