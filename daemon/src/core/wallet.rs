use log::{info, warn};
use meridian_common::{
    api::{
        daemon::{
            GetTransactionsParams, TopupParams, TopupResult, UpdateTransactionParams,
            WalletSummary, WithdrawParams, WithdrawResult,
        },
        Page, PaymentSessionRequest,
    },
    config::{MAX_ADMIN_PAGE_LIMIT, MAX_USER_PAGE_LIMIT, RECENT_TRANSACTIONS_COUNT},
    id::{Id, UserId},
    transaction::{
        TransactionCategory, TransactionFilter, TransactionStatus, TransactionType,
        TransitionDetails, WalletTransaction,
    },
    utils::format_fiat,
};

use crate::core::{
    config::LedgerConfig,
    error::LedgerError,
    ledger::AccountLedger,
    payment::PaymentBridge,
    storage::{CorrelationTarget, Storage},
    transaction_log::TransactionLog,
};

pub struct WalletService<S: Storage> {
    ledger: AccountLedger<S>,
    log: TransactionLog<S>,
    bridge: PaymentBridge<S>,
    config: LedgerConfig,
}

impl<S: Storage> Clone for WalletService<S> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
            log: self.log.clone(),
            bridge: self.bridge.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S: Storage> WalletService<S> {
    pub fn new(
        ledger: AccountLedger<S>,
        log: TransactionLog<S>,
        bridge: PaymentBridge<S>,
        config: LedgerConfig,
    ) -> Self {
        Self {
            ledger,
            log,
            bridge,
            config,
        }
    }

    pub async fn summary(&self, user: &UserId) -> Result<WalletSummary, LedgerError> {
        let wallet = self.ledger.get_or_create(user).await?;
        let txs = self.log.all_wallet(&TransactionFilter::for_user(*user)).await?;

        let (pending_topup_amount, pending_topup_count) = txs
            .iter()
            .filter(|tx| {
                tx.category == TransactionCategory::Topup
                    && matches!(
                        tx.status,
                        TransactionStatus::Initiated | TransactionStatus::Pending
                    )
            })
            .fold((0u64, 0u64), |(amount, count), tx| {
                (amount.saturating_add(tx.amount), count + 1)
            });

        Ok(WalletSummary {
            wallet,
            pending_topup_amount,
            pending_topup_count,
            recent_transactions: txs
                .iter()
                .take(RECENT_TRANSACTIONS_COUNT)
                .map(WalletTransaction::sanitized)
                .collect(),
        })
    }

    // Transactions of the caller only, whatever user the params name
    pub async fn list(
        &self,
        user: &UserId,
        params: &GetTransactionsParams,
    ) -> Result<Page<WalletTransaction>, LedgerError> {
        let mut filter = params.filter();
        filter.user = Some(*user);
        let page = self
            .log
            .list_wallet(&filter, params.pagination(MAX_USER_PAGE_LIMIT))
            .await?;
        Ok(page.map(|tx| tx.sanitized()))
    }

    pub async fn initiate_topup(
        &self,
        user: &UserId,
        params: TopupParams,
    ) -> Result<TopupResult, LedgerError> {
        let amount = params.amount;
        if amount < self.config.min_topup_amount || amount > self.config.max_topup_amount {
            return Err(LedgerError::AmountOutOfRange {
                amount,
                min: self.config.min_topup_amount,
                max: self.config.max_topup_amount,
            });
        }

        let wallet = self.ledger.get_or_create(user).await?;
        let description = params.note.clone().unwrap_or_else(|| {
            format!("Wallet top-up of {} {}", self.config.currency, format_fiat(amount))
        });
        let mut tx = WalletTransaction::new(
            *user,
            TransactionType::Credit,
            TransactionCategory::Topup,
            amount,
            TransactionStatus::Initiated,
        )
        .with_currency(&self.config.currency)
        .with_description(description)
        .with_payment_gateway(self.bridge.gateway_kind().to_string());
        if let Some(note) = &params.note {
            tx = tx.with_metadata("note", note);
        }
        if let Some(instrument) = &params.payment_instrument {
            tx = tx.with_metadata("paymentInstrument", instrument);
        }
        let tx = self.log.record_wallet(tx).await?;

        let request = PaymentSessionRequest::new(&tx.id, user, amount)
            .with_redirect_url(params.redirect_url)
            .with_payment_instrument(params.payment_instrument);
        let session = match self
            .bridge
            .create_session(CorrelationTarget::wallet(tx.id), &request)
            .await
        {
            Ok(session) => session,
            Err(e) => {
                warn!("could not open a payment session for top-up {}: {}", tx.id, e);
                self.log
                    .transition_wallet(&tx.id, TransactionStatus::Failed, &TransitionDetails::default())
                    .await?;
                return Err(e);
            }
        };

        let tx = self
            .log
            .attach_wallet_session(&tx.id, &request.merchant_transaction_id, &session)
            .await?;
        info!("top-up {} of {} initiated for {}", tx.id, amount, user);

        Ok(TopupResult {
            wallet,
            transaction: tx.sanitized(),
            payment_session: session,
        })
    }

    /// Reserve the amount then record a pending withdrawal for review
    pub async fn request_withdrawal(
        &self,
        user: &UserId,
        params: WithdrawParams,
    ) -> Result<WithdrawResult, LedgerError> {
        let amount = params.amount;
        if amount < self.config.min_withdraw_amount {
            return Err(LedgerError::AmountOutOfRange {
                amount,
                min: self.config.min_withdraw_amount,
                max: u64::MAX,
            });
        }

        let wallet = self.ledger.reserve_withdrawal(user, amount).await?;

        let mut tx = WalletTransaction::new(
            *user,
            TransactionType::Debit,
            TransactionCategory::Withdrawal,
            amount,
            TransactionStatus::Pending,
        )
        .with_currency(&self.config.currency)
        .with_description("Withdrawal request");
        if let Some(method) = &params.payout_method {
            tx = tx.with_metadata("payoutMethod", method);
        }
        if let Some(note) = &params.note {
            tx = tx.with_metadata("note", note);
        }

        let tx = match self.log.record_wallet(tx).await {
            Ok(tx) => tx,
            Err(e) => {
                warn!("could not record withdrawal of {} for {}: {}", amount, user, e);
                self.ledger.release_withdrawal(user, amount).await?;
                return Err(e);
            }
        };
        info!("withdrawal {} of {} requested by {}", tx.id, amount, user);

        Ok(WithdrawResult {
            wallet,
            transaction: tx.sanitized(),
        })
    }

    pub async fn admin_list(
        &self,
        params: &GetTransactionsParams,
    ) -> Result<Page<WalletTransaction>, LedgerError> {
        let page = self
            .log
            .list_wallet(&params.filter(), params.pagination(MAX_ADMIN_PAGE_LIMIT))
            .await?;
        Ok(page.map(|tx| tx.sanitized()))
    }

    /// Manual status override and note.
    /// Withdrawals leaving pending settle or release the reserved funds.
    pub async fn admin_update_transaction(
        &self,
        id: &Id,
        params: UpdateTransactionParams,
    ) -> Result<WalletTransaction, LedgerError> {
        if params.status.is_none() && params.admin_note.is_none() {
            return Err(LedgerError::NothingToUpdate);
        }

        let mut tx = self.log.get_wallet(id).await?;
        if let Some(status) = params.status {
            let mut details = TransitionDetails::default();
            if let Some(note) = &params.admin_note {
                details = details.with_admin_note(note);
            }

            let transition = self.log.transition_wallet(id, status, &details).await?;
            let applied = transition.is_applied();
            tx = transition.into_record();

            // Withdrawals are created pending, an applied transition leaves that status
            if applied && tx.category == TransactionCategory::Withdrawal {
                match status {
                    TransactionStatus::Completed => {
                        self.ledger.settle_withdrawal(&tx.user, tx.amount).await?;
                    }
                    TransactionStatus::Failed | TransactionStatus::Cancelled => {
                        self.ledger.release_withdrawal(&tx.user, tx.amount).await?;
                    }
                    _ => {}
                }
            }
        }

        if let Some(note) = &params.admin_note {
            if tx.admin_note.as_deref() != Some(note.as_str()) {
                tx = self.log.annotate_wallet(id, note).await?;
            }
        }

        info!("wallet transaction {} updated by admin, status {}", id, tx.status);
        Ok(tx.sanitized())
    }
}
