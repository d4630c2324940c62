// Back-office reporting and earning moderation

use std::sync::Arc;

use log::info;
use meridian_common::{
    api::{
        daemon::{AdminStats, GetEarningsParams, UserDetail},
        Page,
    },
    config::MAX_ADMIN_PAGE_LIMIT,
    id::{Id, UserId},
    referral::{EarningFilter, EarningStatus, ReferralEarning},
    transaction::{
        IcoTransactionFilter, IcoTransactionStatus, IcoTransactionType, TransactionFilter,
        TransactionStatus, TransactionType,
    },
    utils::fiat_for_tokens,
};

use crate::core::{
    config::LedgerConfig, error::LedgerError, ico::IcoService, ledger::AccountLedger,
    referral::ReferralEngine, storage::Storage, transaction_log::TransactionLog,
};

pub struct AdminService<S: Storage> {
    storage: Arc<S>,
    ledger: AccountLedger<S>,
    log: TransactionLog<S>,
    referral: ReferralEngine<S>,
    ico: IcoService<S>,
    config: LedgerConfig,
}

impl<S: Storage> Clone for AdminService<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            ledger: self.ledger.clone(),
            log: self.log.clone(),
            referral: self.referral.clone(),
            ico: self.ico.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S: Storage> AdminService<S> {
    pub fn new(
        storage: Arc<S>,
        ledger: AccountLedger<S>,
        log: TransactionLog<S>,
        referral: ReferralEngine<S>,
        ico: IcoService<S>,
        config: LedgerConfig,
    ) -> Self {
        Self {
            storage,
            ledger,
            log,
            referral,
            ico,
            config,
        }
    }

    /// Totals over every account and completed transaction
    pub async fn stats(&self) -> Result<AdminStats, LedgerError> {
        let price = self.config.effective_token_price();
        let mut stats = AdminStats {
            token_symbol: self.config.token_symbol.clone(),
            token_price: price,
            ..Default::default()
        };

        for holding in self.storage.get_holdings().await? {
            stats.tokens_in_circulation = stats.tokens_in_circulation.saturating_add(holding.balance);
        }
        stats.token_valuation =
            fiat_for_tokens(stats.tokens_in_circulation, price).unwrap_or(u64::MAX);

        let buys = self
            .log
            .all_ico(&IcoTransactionFilter {
                status: Some(IcoTransactionStatus::Completed),
                kind: Some(IcoTransactionType::Buy),
                ..Default::default()
            })
            .await?;
        stats.completed_buy_count = buys.len() as u64;
        stats.completed_buy_volume = buys
            .iter()
            .fold(0u64, |acc, tx| acc.saturating_add(tx.fiat_amount));

        for wallet in self.storage.get_wallet_accounts().await? {
            stats.total_wallet_balance = stats.total_wallet_balance.saturating_add(wallet.balance);
            stats.total_pending_withdrawals = stats
                .total_pending_withdrawals
                .saturating_add(wallet.pending_withdrawals);
        }

        let completed = self
            .log
            .all_wallet(&TransactionFilter {
                status: Some(TransactionStatus::Completed),
                ..Default::default()
            })
            .await?;
        for tx in completed {
            match tx.kind {
                TransactionType::Credit => {
                    stats.wallet_credit_volume = stats.wallet_credit_volume.saturating_add(tx.amount)
                }
                TransactionType::Debit => {
                    stats.wallet_debit_volume = stats.wallet_debit_volume.saturating_add(tx.amount)
                }
            }
        }

        stats.referral_earnings_total = self
            .referral
            .all_earnings(&EarningFilter::default())
            .await?
            .iter()
            .fold(0u64, |acc, earning| acc.saturating_add(earning.amount));

        Ok(stats)
    }

    pub async fn user_detail(&self, user: &UserId) -> Result<UserDetail, LedgerError> {
        let referral = self.referral.profile(user).await?;
        let wallet = self.ledger.get_or_create(user).await?;
        let holding = self.ico.summary(user).await?;

        Ok(UserDetail {
            user: *user,
            referral,
            wallet,
            holding,
        })
    }

    pub async fn earnings(
        &self,
        params: &GetEarningsParams,
    ) -> Result<Page<ReferralEarning>, LedgerError> {
        self.referral
            .list_earnings(&params.filter(), params.pagination(MAX_ADMIN_PAGE_LIMIT))
            .await
    }

    // Bookkeeping only, balances are not touched
    pub async fn update_earning(
        &self,
        id: &Id,
        status: EarningStatus,
    ) -> Result<ReferralEarning, LedgerError> {
        let earning = self.referral.update_earning_status(id, status).await?;
        info!("admin set earning {} of {} to {}", id, earning.earner, status);
        Ok(earning)
    }
}
