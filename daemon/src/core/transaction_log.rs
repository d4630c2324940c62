// Append-only log of wallet, ICO and order records
//
// Records are created in a non-terminal status and only move through
// the conditional transitions below. The correlation table maps the id
// echoed back by a payment gateway to the record it settles.

use std::sync::Arc;

use log::{debug, info, trace};
use meridian_common::{
    api::{Page, Pagination, PaymentSession},
    id::Id,
    transaction::{
        IcoTransaction, IcoTransactionFilter, IcoTransactionStatus, Order, OrderPaymentStatus,
        StatusLifecycle, Transition, TransactionFilter, TransactionStatus, TransitionDetails,
        WalletTransaction,
    },
};

use crate::core::{
    error::LedgerError,
    storage::{CorrelationTarget, Storage},
};

pub struct TransactionLog<S: Storage> {
    storage: Arc<S>,
}

impl<S: Storage> Clone for TransactionLog<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
        }
    }
}

// New records start before any terminal status
fn check_initial_status<T: StatusLifecycle + std::fmt::Display>(
    status: T,
) -> Result<(), LedgerError> {
    if status.is_terminal() {
        return Err(LedgerError::InvalidInitialStatus(status.to_string()));
    }
    Ok(())
}

impl<S: Storage> TransactionLog<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    // ===== Wallet transactions =====

    pub async fn record_wallet(
        &self,
        tx: WalletTransaction,
    ) -> Result<WalletTransaction, LedgerError> {
        check_initial_status(tx.status)?;
        if tx.amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }

        self.storage.insert_wallet_transaction(&tx).await?;
        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "recorded {} {} wallet transaction {} of {} for {}",
                tx.status, tx.category, tx.id, tx.amount, tx.user
            );
        }
        Ok(tx)
    }

    /// Record a transaction whose effect is already applied.
    /// It goes through pending so that completion is a regular transition.
    pub async fn record_completed_wallet(
        &self,
        mut tx: WalletTransaction,
    ) -> Result<WalletTransaction, LedgerError> {
        tx.status = TransactionStatus::Pending;
        let tx = self.record_wallet(tx).await?;
        let transition = self
            .transition_wallet(&tx.id, TransactionStatus::Completed, &TransitionDetails::default())
            .await?;
        Ok(transition.into_record())
    }

    pub async fn get_wallet(&self, id: &Id) -> Result<WalletTransaction, LedgerError> {
        self.storage
            .get_wallet_transaction(id)
            .await?
            .ok_or(LedgerError::TransactionNotFound(*id))
    }

    pub async fn transition_wallet(
        &self,
        id: &Id,
        status: TransactionStatus,
        details: &TransitionDetails,
    ) -> Result<Transition<WalletTransaction>, LedgerError> {
        let transition = self
            .storage
            .transition_wallet_transaction(id, status, details)
            .await?;
        log_transition("wallet transaction", id, status, &transition);
        Ok(transition)
    }

    pub async fn attach_wallet_session(
        &self,
        id: &Id,
        merchant_transaction_id: &str,
        session: &PaymentSession,
    ) -> Result<WalletTransaction, LedgerError> {
        self.storage
            .set_wallet_transaction_session(id, merchant_transaction_id, session)
            .await
    }

    pub async fn annotate_wallet(
        &self,
        id: &Id,
        admin_note: &str,
    ) -> Result<WalletTransaction, LedgerError> {
        self.storage.set_wallet_transaction_note(id, admin_note).await
    }

    pub async fn all_wallet(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<WalletTransaction>, LedgerError> {
        self.storage.get_wallet_transactions(filter).await
    }

    pub async fn list_wallet(
        &self,
        filter: &TransactionFilter,
        pagination: Pagination,
    ) -> Result<Page<WalletTransaction>, LedgerError> {
        let txs = self.storage.get_wallet_transactions(filter).await?;
        Ok(pagination.paginate(txs))
    }

    // ===== ICO transactions =====

    pub async fn record_ico(&self, tx: IcoTransaction) -> Result<IcoTransaction, LedgerError> {
        check_initial_status(tx.status)?;
        if tx.token_amount == 0 || tx.price_per_token == 0 {
            return Err(LedgerError::InvalidAmount);
        }

        self.storage.insert_ico_transaction(&tx).await?;
        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "recorded {} {} ico transaction {} of {} tokens for {}",
                tx.status, tx.kind, tx.id, tx.token_amount, tx.user
            );
        }
        Ok(tx)
    }

    pub async fn get_ico(&self, id: &Id) -> Result<IcoTransaction, LedgerError> {
        self.storage
            .get_ico_transaction(id)
            .await?
            .ok_or(LedgerError::TransactionNotFound(*id))
    }

    pub async fn transition_ico(
        &self,
        id: &Id,
        status: IcoTransactionStatus,
        details: &TransitionDetails,
    ) -> Result<Transition<IcoTransaction>, LedgerError> {
        let transition = self
            .storage
            .transition_ico_transaction(id, status, details)
            .await?;
        log_transition("ico transaction", id, status, &transition);
        Ok(transition)
    }

    pub async fn all_ico(
        &self,
        filter: &IcoTransactionFilter,
    ) -> Result<Vec<IcoTransaction>, LedgerError> {
        self.storage.get_ico_transactions(filter).await
    }

    pub async fn list_ico(
        &self,
        filter: &IcoTransactionFilter,
        pagination: Pagination,
    ) -> Result<Page<IcoTransaction>, LedgerError> {
        let txs = self.storage.get_ico_transactions(filter).await?;
        Ok(pagination.paginate(txs))
    }

    // ===== Orders =====

    pub async fn record_order(&self, order: Order) -> Result<Order, LedgerError> {
        check_initial_status(order.payment_status)?;
        if order.amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }

        self.storage.insert_order(&order).await?;
        if log::log_enabled!(log::Level::Debug) {
            debug!("recorded order {} of {} for {}", order.id, order.amount, order.user);
        }
        Ok(order)
    }

    pub async fn get_order(&self, id: &Id) -> Result<Order, LedgerError> {
        self.storage
            .get_order(id)
            .await?
            .ok_or(LedgerError::OrderNotFound(*id))
    }

    pub async fn transition_order(
        &self,
        id: &Id,
        status: OrderPaymentStatus,
        details: &TransitionDetails,
    ) -> Result<Transition<Order>, LedgerError> {
        let transition = self.storage.transition_order(id, status, details).await?;
        log_transition("order", id, status, &transition);
        Ok(transition)
    }

    // ===== Correlations =====

    pub async fn register_correlation(
        &self,
        merchant_transaction_id: &str,
        target: CorrelationTarget,
    ) -> Result<(), LedgerError> {
        self.storage
            .register_correlation(merchant_transaction_id, &target)
            .await
    }

    /// Record targeted by a gateway merchant transaction id
    pub async fn resolve(&self, merchant_transaction_id: &str) -> Result<CorrelationTarget, LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("resolve merchant transaction id {}", merchant_transaction_id);
        }
        self.storage
            .get_correlation(merchant_transaction_id)
            .await?
            .ok_or_else(|| LedgerError::UnresolvedCorrelationId(merchant_transaction_id.to_owned()))
    }
}

fn log_transition<T, St: std::fmt::Display>(
    kind: &str,
    id: &Id,
    status: St,
    transition: &Transition<T>,
) {
    if transition.is_applied() {
        info!("{} {} moved to {}", kind, id, status);
    } else if log::log_enabled!(log::Level::Debug) {
        debug!("{} {} left unchanged, {} requested", kind, id, status);
    }
}
