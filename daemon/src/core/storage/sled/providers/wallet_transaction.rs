use async_trait::async_trait;
use log::trace;
use meridian_common::{
    api::PaymentSession,
    id::Id,
    time::get_current_time_in_millis,
    transaction::{
        transition, Transition, TransactionFilter, TransactionStatus, TransitionDetails,
        WalletTransaction,
    },
};

use crate::core::{
    error::LedgerError,
    storage::{
        sled::{Update, WALLET_TRANSACTIONS},
        SledStorage, WalletTransactionProvider,
    },
};

impl SledStorage {
    // Rewrite fields of an existing record that never take part in its lifecycle
    fn edit_wallet_transaction<F>(&self, id: &Id, mut edit: F) -> Result<WalletTransaction, LedgerError>
    where
        F: FnMut(&mut WalletTransaction),
    {
        Self::update_with(
            &self.wallet_transactions,
            WALLET_TRANSACTIONS,
            id.as_bytes(),
            |current: Option<WalletTransaction>| {
                let mut tx = current.ok_or(LedgerError::TransactionNotFound(*id))?;
                edit(&mut tx);
                tx.updated_at = get_current_time_in_millis();
                Ok(Update::Write(tx.clone(), tx))
            },
        )
    }
}

#[async_trait]
impl WalletTransactionProvider for SledStorage {
    async fn insert_wallet_transaction(&self, tx: &WalletTransaction) -> Result<(), LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("insert wallet transaction {}", tx.id);
        }
        Self::insert_into_disk(&self.wallet_transactions, tx.id.as_bytes(), tx)
    }

    async fn get_wallet_transaction(
        &self,
        id: &Id,
    ) -> Result<Option<WalletTransaction>, LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("get wallet transaction {}", id);
        }
        Self::load_optional_from_disk(&self.wallet_transactions, id.as_bytes())
    }

    async fn transition_wallet_transaction(
        &self,
        id: &Id,
        status: TransactionStatus,
        details: &TransitionDetails,
    ) -> Result<Transition<WalletTransaction>, LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("transition wallet transaction {} to {}", id, status);
        }
        Self::update_with(
            &self.wallet_transactions,
            WALLET_TRANSACTIONS,
            id.as_bytes(),
            |current: Option<WalletTransaction>| {
                let mut tx = current.ok_or(LedgerError::TransactionNotFound(*id))?;
                Ok(if transition(&mut tx, status, details) {
                    Update::Write(tx.clone(), Transition::Applied(tx))
                } else {
                    Update::Keep(Transition::Unchanged(tx))
                })
            },
        )
    }

    async fn set_wallet_transaction_session(
        &self,
        id: &Id,
        merchant_transaction_id: &str,
        session: &PaymentSession,
    ) -> Result<WalletTransaction, LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("attach payment session to wallet transaction {}", id);
        }
        self.edit_wallet_transaction(id, |tx| {
            tx.merchant_transaction_id = Some(merchant_transaction_id.to_owned());
            tx.gateway_payload = Some(session.clone());
        })
    }

    async fn set_wallet_transaction_note(
        &self,
        id: &Id,
        admin_note: &str,
    ) -> Result<WalletTransaction, LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("set admin note of wallet transaction {}", id);
        }
        self.edit_wallet_transaction(id, |tx| {
            tx.admin_note = Some(admin_note.to_owned());
        })
    }

    async fn get_wallet_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<WalletTransaction>, LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("get wallet transactions matching {:?}", filter);
        }
        let mut txs: Vec<WalletTransaction> = Self::scan_tree(&self.wallet_transactions)?;
        txs.retain(|tx| filter.matches(tx));
        txs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(txs)
    }
}
