// Payment session bridge
//
// Opens gateway sessions for pending records and settles them when the
// gateway reports back, either through an asynchronous callback or a
// signed client-side verification. Settlement is idempotent: the ledger
// effect and the commission fan-out only run for the delivery that
// moved the record to its terminal status.

mod phonepe;
mod razorpay;

pub use phonepe::PhonePeGateway;
pub use razorpay::RazorpayGateway;

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error, info, warn};
use meridian_common::{
    api::{
        daemon::VerifyPaymentParams, CallbackOutcome, GatewayCallback, PaymentGatewayKind,
        PaymentResult, PaymentSession, PaymentSessionRequest, RazorpayCheckout,
    },
    id::Id,
    referral::{CommissionFailure, SourceType},
    transaction::{
        IcoTransactionStatus, IcoTransactionType, OrderPaymentStatus, TransactionCategory,
        TransactionStatus, TransactionType, TransitionDetails,
    },
};
use serde_json::Value;

use crate::core::{
    error::LedgerError,
    ledger::AccountLedger,
    referral::ReferralEngine,
    storage::{CorrelationKind, CorrelationTarget, Storage},
    transaction_log::TransactionLog,
};

// The record is already terminal, a redelivery will not apply the effect again
fn effect_failed(operation: &'static str, id: &Id, e: LedgerError) -> LedgerError {
    error!(
        "{} {} is settled but its ledger effect failed, manual correction required: {}",
        operation, id, e
    );
    metrics::counter!("meridian_ledger_effect_failures_total", "operation" => operation)
        .increment(1);
    e
}

/// Hosted payment page provider
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn kind(&self) -> PaymentGatewayKind;

    // Build the session the client uses to open the payment page
    async fn create_session(
        &self,
        request: &PaymentSessionRequest,
    ) -> Result<PaymentSession, LedgerError>;

    // Callback codes meaning the payment was captured
    fn success_codes(&self) -> &[&'static str];

    // Check that a callback body was signed by the gateway
    fn verify_callback(&self, body: &[u8], checksum: Option<&str>) -> Result<(), LedgerError>;
}

pub struct PaymentBridge<S: Storage> {
    ledger: AccountLedger<S>,
    log: TransactionLog<S>,
    referral: ReferralEngine<S>,
    gateway: Arc<dyn PaymentGateway>,
    razorpay: Option<Arc<RazorpayGateway>>,
}

impl<S: Storage> Clone for PaymentBridge<S> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
            log: self.log.clone(),
            referral: self.referral.clone(),
            gateway: Arc::clone(&self.gateway),
            razorpay: self.razorpay.clone(),
        }
    }
}

impl<S: Storage> PaymentBridge<S> {
    pub fn new(
        ledger: AccountLedger<S>,
        log: TransactionLog<S>,
        referral: ReferralEngine<S>,
        gateway: Arc<dyn PaymentGateway>,
        razorpay: Option<RazorpayGateway>,
    ) -> Self {
        Self {
            ledger,
            log,
            referral,
            gateway,
            razorpay: razorpay.map(Arc::new),
        }
    }

    pub fn gateway_kind(&self) -> PaymentGatewayKind {
        self.gateway.kind()
    }

    /// Open a gateway session for `target`.
    /// The correlation is registered first so that an early callback always resolves.
    pub async fn create_session(
        &self,
        target: CorrelationTarget,
        request: &PaymentSessionRequest,
    ) -> Result<PaymentSession, LedgerError> {
        self.log
            .register_correlation(&request.merchant_transaction_id, target)
            .await?;
        self.gateway.create_session(request).await
    }

    pub async fn create_razorpay_order(
        &self,
        target: CorrelationTarget,
        amount: u64,
        currency: &str,
    ) -> Result<RazorpayCheckout, LedgerError> {
        let razorpay = self
            .razorpay
            .as_ref()
            .ok_or(LedgerError::GatewayNotConfigured(PaymentGatewayKind::Razorpay))?;

        let checkout = razorpay.create_order(&target.id, amount, currency);
        self.log
            .register_correlation(&checkout.order_id, target)
            .await?;
        Ok(checkout)
    }

    /// Settle the record named by a gateway callback body.
    /// `checksum` is the signature header sent along the body, nothing is
    /// settled unless it matches.
    pub async fn handle_callback(
        &self,
        body: &[u8],
        checksum: Option<&str>,
    ) -> Result<CallbackOutcome, LedgerError> {
        let gateway = self.gateway.kind().to_string();
        metrics::counter!("meridian_callbacks_total", "gateway" => gateway).increment(1);

        if let Err(e) = self.gateway.verify_callback(body, checksum) {
            warn!("rejected {} callback: {}", self.gateway.kind(), e);
            metrics::counter!("meridian_callbacks_rejected").increment(1);
            return Err(e);
        }

        let body: Value =
            serde_json::from_slice(body).map_err(|_| LedgerError::MissingCorrelationId)?;
        let callback = GatewayCallback::from_json(&body).ok_or(LedgerError::MissingCorrelationId)?;
        let result = callback.result(self.gateway.success_codes());
        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "callback for {} with code {:?}: {}",
                callback.merchant_transaction_id, callback.code, result
            );
        }

        self.settle(&callback.merchant_transaction_id, result, callback.transaction_id)
            .await
    }

    /// Check a client-side Razorpay confirmation and settle the order as paid
    pub async fn verify_payment(
        &self,
        params: &VerifyPaymentParams,
    ) -> Result<CallbackOutcome, LedgerError> {
        metrics::counter!("meridian_callbacks_total", "gateway" => "razorpay").increment(1);
        let razorpay = self
            .razorpay
            .as_ref()
            .ok_or(LedgerError::GatewayNotConfigured(PaymentGatewayKind::Razorpay))?;

        razorpay.verify(
            &params.razorpay_order_id,
            &params.razorpay_payment_id,
            &params.razorpay_signature,
        )?;

        self.settle(
            &params.razorpay_order_id,
            PaymentResult::Paid,
            Some(params.razorpay_payment_id.clone()),
        )
        .await
    }

    /// Resolve, transition, apply the ledger effect, then pay commissions.
    /// An unknown id is reported as unhandled rather than as an error.
    pub async fn settle(
        &self,
        merchant_transaction_id: &str,
        result: PaymentResult,
        gateway_transaction_id: Option<String>,
    ) -> Result<CallbackOutcome, LedgerError> {
        let target = match self.log.resolve(merchant_transaction_id).await {
            Ok(target) => target,
            Err(LedgerError::UnresolvedCorrelationId(id)) => {
                warn!("no pending record for merchant transaction id {}", id);
                metrics::counter!("meridian_callbacks_unresolved").increment(1);
                return Ok(CallbackOutcome::unhandled(id, result));
            }
            Err(e) => return Err(e),
        };

        let mut details = TransitionDetails::default();
        if let Some(id) = gateway_transaction_id {
            details = details.with_gateway_transaction_id(id);
        }

        let paid = result == PaymentResult::Paid;
        let (applied, commission_failures) = match target.kind {
            CorrelationKind::Wallet => (self.settle_wallet(&target.id, paid, &details).await?, Vec::new()),
            CorrelationKind::Ico => self.settle_ico(&target.id, paid, &details).await?,
            CorrelationKind::Order => self.settle_order(&target.id, paid, &details).await?,
        };

        Ok(CallbackOutcome {
            handled: true,
            merchant_transaction_id: merchant_transaction_id.to_owned(),
            code: result,
            applied,
            commission_failures,
        })
    }

    async fn settle_wallet(
        &self,
        id: &Id,
        paid: bool,
        details: &TransitionDetails,
    ) -> Result<bool, LedgerError> {
        let status = if paid {
            TransactionStatus::Completed
        } else {
            TransactionStatus::Failed
        };

        let transition = self.log.transition_wallet(id, status, details).await?;
        if !transition.is_applied() {
            return Ok(false);
        }

        let tx = transition.record();
        if paid && tx.kind == TransactionType::Credit && tx.category == TransactionCategory::Topup {
            let wallet = self
                .ledger
                .credit(&tx.user, tx.amount)
                .await
                .map_err(|e| effect_failed("top-up", &tx.id, e))?;
            info!(
                "top-up {} credited {} to {}, balance {}",
                tx.id, tx.amount, tx.user, wallet.balance
            );
        }
        Ok(true)
    }

    async fn settle_ico(
        &self,
        id: &Id,
        paid: bool,
        details: &TransitionDetails,
    ) -> Result<(bool, Vec<CommissionFailure>), LedgerError> {
        let status = if paid {
            IcoTransactionStatus::Completed
        } else {
            IcoTransactionStatus::Failed
        };

        let transition = self.log.transition_ico(id, status, details).await?;
        if !transition.is_applied() {
            return Ok((false, Vec::new()));
        }

        let tx = transition.record();
        if !paid || tx.kind != IcoTransactionType::Buy {
            return Ok((true, Vec::new()));
        }

        let holding = self
            .ledger
            .increment_holding(&tx.user, tx.token_amount)
            .await
            .map_err(|e| effect_failed("ico", &tx.id, e))?;
        info!(
            "ico buy {} credited {} tokens to {}, holding {}",
            tx.id, tx.token_amount, tx.user, holding.balance
        );

        let failures = self
            .commission(&tx.user, tx.fiat_amount, SourceType::Ico, &tx.id)
            .await;
        Ok((true, failures))
    }

    async fn settle_order(
        &self,
        id: &Id,
        paid: bool,
        details: &TransitionDetails,
    ) -> Result<(bool, Vec<CommissionFailure>), LedgerError> {
        let status = if paid {
            OrderPaymentStatus::Paid
        } else {
            OrderPaymentStatus::Failed
        };

        let transition = self.log.transition_order(id, status, details).await?;
        if !transition.is_applied() {
            return Ok((false, Vec::new()));
        }
        if !paid {
            return Ok((true, Vec::new()));
        }

        let order = transition.record();
        let failures = self
            .commission(&order.user, order.amount, SourceType::Order, &order.id)
            .await;
        Ok((true, failures))
    }

    // Commission never fails the payment that triggered it
    async fn commission(
        &self,
        buyer: &Id,
        amount: u64,
        source_type: SourceType,
        source_id: &Id,
    ) -> Vec<CommissionFailure> {
        match self
            .referral
            .distribute(buyer, amount, source_type, source_id)
            .await
        {
            Ok(report) => report.failures,
            Err(e) => {
                warn!(
                    "commission distribution for {} {} failed: {}",
                    source_type, source_id, e
                );
                metrics::counter!("meridian_commission_failures_total").increment(1);
                Vec::new()
            }
        }
    }
}
