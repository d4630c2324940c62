// Token sale at a configured fixed price
//
// Purchases are funded from the cash wallet, settled immediately, or through a
// hosted gateway and settled by the payment bridge. Sales remove the tokens
// from the holding at once and wait for an out-of-band payout.

use log::{error, info, warn};
use meridian_common::{
    account::IcoHolding,
    api::{
        daemon::{
            GetIcoTransactionsParams, HoldingSummary, IcoBuyParams, IcoBuyResult, IcoSellParams,
            IcoSellResult, TokenPrice,
        },
        razorpay_order_id, Page, PaymentMethod, PaymentSessionRequest,
    },
    config::{MAX_ADMIN_PAGE_LIMIT, MAX_USER_PAGE_LIMIT},
    id::{Id, UserId},
    referral::{DistributionReport, SourceType},
    transaction::{
        IcoTransaction, IcoTransactionStatus, IcoTransactionType, TransactionCategory,
        TransactionStatus, TransactionType, TransitionDetails, WalletTransaction,
    },
    utils::{fiat_for_tokens, tokens_for_fiat},
};

use crate::core::{
    config::LedgerConfig,
    error::LedgerError,
    ledger::AccountLedger,
    payment::PaymentBridge,
    referral::ReferralEngine,
    storage::{CorrelationTarget, Storage},
    transaction_log::TransactionLog,
};

pub struct IcoService<S: Storage> {
    ledger: AccountLedger<S>,
    log: TransactionLog<S>,
    bridge: PaymentBridge<S>,
    referral: ReferralEngine<S>,
    config: LedgerConfig,
}

impl<S: Storage> Clone for IcoService<S> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
            log: self.log.clone(),
            bridge: self.bridge.clone(),
            referral: self.referral.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S: Storage> IcoService<S> {
    pub fn new(
        ledger: AccountLedger<S>,
        log: TransactionLog<S>,
        bridge: PaymentBridge<S>,
        referral: ReferralEngine<S>,
        config: LedgerConfig,
    ) -> Self {
        Self {
            ledger,
            log,
            bridge,
            referral,
            config,
        }
    }

    pub fn price(&self) -> TokenPrice {
        TokenPrice {
            symbol: self.config.token_symbol.clone(),
            price: self.config.effective_token_price(),
        }
    }

    pub fn valuate(&self, holding: &IcoHolding) -> HoldingSummary {
        let price = self.config.effective_token_price();
        HoldingSummary {
            balance: holding.balance,
            symbol: self.config.token_symbol.clone(),
            price,
            valuation: fiat_for_tokens(holding.balance, price).unwrap_or(u64::MAX),
        }
    }

    pub async fn summary(&self, user: &UserId) -> Result<HoldingSummary, LedgerError> {
        let holding = self.ledger.get_holding(user).await?;
        Ok(self.valuate(&holding))
    }

    pub async fn list(
        &self,
        user: &UserId,
        params: &GetIcoTransactionsParams,
    ) -> Result<Page<IcoTransaction>, LedgerError> {
        let mut filter = params.filter();
        filter.user = Some(*user);
        self.log
            .list_ico(&filter, params.pagination(MAX_USER_PAGE_LIMIT))
            .await
    }

    pub async fn admin_list(
        &self,
        params: &GetIcoTransactionsParams,
    ) -> Result<Page<IcoTransaction>, LedgerError> {
        self.log
            .list_ico(&params.filter(), params.pagination(MAX_ADMIN_PAGE_LIMIT))
            .await
    }

    // Token amount of a purchase, derived from the fiat amount when not given
    fn purchase_tokens(&self, params: &IcoBuyParams, price: u64) -> Result<u64, LedgerError> {
        match (
            params.token_amount.filter(|&t| t > 0),
            params.fiat_amount.filter(|&f| f > 0),
        ) {
            (Some(tokens), _) => Ok(tokens),
            (None, Some(fiat)) => tokens_for_fiat(fiat, price).ok_or(LedgerError::Overflow),
            (None, None) => Err(LedgerError::MissingPurchaseAmount),
        }
    }

    pub async fn buy(
        &self,
        user: &UserId,
        params: IcoBuyParams,
    ) -> Result<IcoBuyResult, LedgerError> {
        let price = self.config.effective_token_price();
        let tokens = self.purchase_tokens(&params, price)?;
        let tx = IcoTransaction::new(
            *user,
            IcoTransactionType::Buy,
            tokens,
            price,
            IcoTransactionStatus::Initiated,
        )?;
        if tx.fiat_amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }

        match params.payment_method {
            PaymentMethod::Wallet => self.buy_with_wallet(user, tx).await,
            PaymentMethod::PhonePe => self.buy_with_phonepe(user, tx).await,
            PaymentMethod::Razorpay => self.buy_with_razorpay(tx).await,
        }
    }

    async fn buy_with_wallet(
        &self,
        user: &UserId,
        tx: IcoTransaction,
    ) -> Result<IcoBuyResult, LedgerError> {
        let wallet = self.ledger.debit(user, tx.fiat_amount).await?;

        let wallet_tx = WalletTransaction::new(
            *user,
            TransactionType::Debit,
            TransactionCategory::Purchase,
            tx.fiat_amount,
            TransactionStatus::Pending,
        )
        .with_currency(&self.config.currency)
        .with_description(format!("Purchase of {} tokens", self.config.token_symbol))
        .with_reference_id(tx.id.to_hex())
        .with_metadata("tokenAmount", tx.token_amount.to_string())
        .with_metadata("pricePerToken", tx.price_per_token.to_string())
        .with_metadata("tokenSymbol", &self.config.token_symbol)
        .with_metadata("icoTransactionId", tx.id.to_hex());
        let tx = tx.with_payment_reference(wallet_tx.id.to_hex());

        // Both records stay open until the tokens are credited
        let wallet_tx = match self.log.record_wallet(wallet_tx).await {
            Ok(wallet_tx) => wallet_tx,
            Err(e) => {
                self.refund(&tx, &e).await;
                return Err(e);
            }
        };
        let tx = match self.log.record_ico(tx.clone()).await {
            Ok(tx) => tx,
            Err(e) => {
                self.refund(&tx, &e).await;
                self.fail_records(&wallet_tx.id, None).await;
                return Err(e);
            }
        };
        let holding = match self.ledger.increment_holding(user, tx.token_amount).await {
            Ok(holding) => holding,
            Err(e) => {
                self.refund(&tx, &e).await;
                self.fail_records(&wallet_tx.id, Some(&tx.id)).await;
                return Err(e);
            }
        };

        let details = TransitionDetails::default();
        self.log
            .transition_wallet(&wallet_tx.id, TransactionStatus::Completed, &details)
            .await?;
        let tx = self
            .log
            .transition_ico(&tx.id, IcoTransactionStatus::Completed, &details)
            .await?
            .into_record();
        info!(
            "{} bought {} tokens for {} from their wallet",
            user, tx.token_amount, tx.fiat_amount
        );

        let commission = match self
            .referral
            .distribute(user, tx.fiat_amount, SourceType::Ico, &tx.id)
            .await
        {
            Ok(report) => report,
            Err(e) => {
                warn!("commission distribution for ico {} failed: {}", tx.id, e);
                metrics::counter!("meridian_commission_failures_total").increment(1);
                DistributionReport::default()
            }
        };

        Ok(IcoBuyResult::Wallet {
            transaction: tx,
            wallet,
            holding,
            commission,
        })
    }

    async fn buy_with_phonepe(
        &self,
        user: &UserId,
        tx: IcoTransaction,
    ) -> Result<IcoBuyResult, LedgerError> {
        let request = PaymentSessionRequest::new(&tx.id, user, tx.fiat_amount);
        let tx = self
            .log
            .record_ico(tx.with_payment_reference(request.merchant_transaction_id.clone()))
            .await?;

        let payment_session = match self
            .bridge
            .create_session(CorrelationTarget::ico(tx.id), &request)
            .await
        {
            Ok(session) => session,
            Err(e) => {
                self.abandon(&tx, &e).await?;
                return Err(e);
            }
        };

        info!("ico buy {} of {} tokens initiated by {}", tx.id, tx.token_amount, user);
        Ok(IcoBuyResult::PhonePe {
            transaction: tx,
            payment_session,
        })
    }

    async fn buy_with_razorpay(&self, tx: IcoTransaction) -> Result<IcoBuyResult, LedgerError> {
        let order_id = razorpay_order_id(&tx.id);
        let tx = self.log.record_ico(tx.with_payment_reference(order_id)).await?;

        let razorpay = match self
            .bridge
            .create_razorpay_order(CorrelationTarget::ico(tx.id), tx.fiat_amount, &self.config.currency)
            .await
        {
            Ok(checkout) => checkout,
            Err(e) => {
                self.abandon(&tx, &e).await?;
                return Err(e);
            }
        };

        info!(
            "ico buy {} of {} tokens initiated by {} with order {}",
            tx.id, tx.token_amount, tx.user, razorpay.order_id
        );
        Ok(IcoBuyResult::Razorpay {
            transaction: tx,
            razorpay,
        })
    }

    // Give back the wallet debit of a purchase that could not complete
    async fn refund(&self, tx: &IcoTransaction, cause: &LedgerError) {
        warn!(
            "wallet purchase {} by {} failed, refunding {}: {}",
            tx.id, tx.user, tx.fiat_amount, cause
        );
        if let Err(e) = self.ledger.credit(&tx.user, tx.fiat_amount).await {
            error!(
                "refund of {} to {} for purchase {} failed: {}",
                tx.fiat_amount, tx.user, tx.id, e
            );
            metrics::counter!("meridian_ledger_effect_failures_total", "operation" => "refund")
                .increment(1);
        }
    }

    async fn fail_records(&self, wallet_tx: &Id, ico_tx: Option<&Id>) {
        let details = TransitionDetails::default();
        if let Err(e) = self
            .log
            .transition_wallet(wallet_tx, TransactionStatus::Failed, &details)
            .await
        {
            warn!("could not mark wallet transaction {} failed: {}", wallet_tx, e);
        }
        if let Some(id) = ico_tx {
            if let Err(e) = self
                .log
                .transition_ico(id, IcoTransactionStatus::Failed, &details)
                .await
            {
                warn!("could not mark ico transaction {} failed: {}", id, e);
            }
        }
    }

    // No session could be opened, the purchase will never be paid
    async fn abandon(&self, tx: &IcoTransaction, error: &LedgerError) -> Result<(), LedgerError> {
        warn!("could not open a payment for ico buy {}: {}", tx.id, error);
        self.log
            .transition_ico(&tx.id, IcoTransactionStatus::Failed, &TransitionDetails::default())
            .await?;
        Ok(())
    }

    /// Remove the tokens from the holding and record a pending sale
    pub async fn sell(
        &self,
        user: &UserId,
        params: IcoSellParams,
    ) -> Result<IcoSellResult, LedgerError> {
        let tx = IcoTransaction::new(
            *user,
            IcoTransactionType::Sell,
            params.token_amount,
            self.config.effective_token_price(),
            IcoTransactionStatus::Pending,
        )?;

        let holding = self.ledger.decrement_holding(user, tx.token_amount).await?;
        let tx = match self.log.record_ico(tx).await {
            Ok(tx) => tx,
            Err(e) => {
                warn!("could not record sale for {}, restoring holding: {}", user, e);
                self.ledger
                    .increment_holding(user, params.token_amount)
                    .await?;
                return Err(e);
            }
        };

        info!(
            "{} sold {} tokens for {}, pending payout",
            user, tx.token_amount, tx.fiat_amount
        );
        Ok(IcoSellResult {
            transaction: tx,
            holding,
        })
    }
}
