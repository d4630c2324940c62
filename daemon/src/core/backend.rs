use std::sync::Arc;

use log::info;

use crate::core::{
    admin::AdminService,
    config::{LedgerConfig, PhonePeConfig, RazorpayConfig},
    error::LedgerError,
    ico::IcoService,
    ledger::AccountLedger,
    order::OrderService,
    payment::{PaymentBridge, PaymentGateway, PhonePeGateway, RazorpayGateway},
    referral::ReferralEngine,
    storage::Storage,
    transaction_log::TransactionLog,
    wallet::WalletService,
};

/// Every service wired over one shared storage handle
pub struct Backend<S: Storage> {
    pub storage: Arc<S>,
    pub ledger: AccountLedger<S>,
    pub log: TransactionLog<S>,
    pub referral: ReferralEngine<S>,
    pub bridge: PaymentBridge<S>,
    pub wallet: WalletService<S>,
    pub ico: IcoService<S>,
    pub orders: OrderService<S>,
    pub admin: AdminService<S>,
    pub config: LedgerConfig,
}

impl<S: Storage> Backend<S> {
    pub fn new(
        storage: Arc<S>,
        config: LedgerConfig,
        phonepe: &PhonePeConfig,
        razorpay: &RazorpayConfig,
    ) -> Result<Self, LedgerError> {
        let razorpay = RazorpayGateway::from_config(razorpay);
        if razorpay.is_none() {
            info!("Razorpay keys not set, Razorpay payments are disabled");
        }

        let gateway = Arc::new(PhonePeGateway::new(phonepe.clone()));
        Self::with_gateway(storage, config, gateway, razorpay)
    }

    pub fn with_gateway(
        storage: Arc<S>,
        config: LedgerConfig,
        gateway: Arc<dyn PaymentGateway>,
        razorpay: Option<RazorpayGateway>,
    ) -> Result<Self, LedgerError> {
        let ledger = AccountLedger::new(Arc::clone(&storage), config.currency.clone());
        let log = TransactionLog::new(Arc::clone(&storage));
        let referral = ReferralEngine::new(
            Arc::clone(&storage),
            ledger.clone(),
            log.clone(),
            config.referral_rates(),
            config.effective_referral_depth(),
        )?;
        let bridge = PaymentBridge::new(
            ledger.clone(),
            log.clone(),
            referral.clone(),
            gateway,
            razorpay,
        );

        let wallet = WalletService::new(ledger.clone(), log.clone(), bridge.clone(), config.clone());
        let ico = IcoService::new(
            ledger.clone(),
            log.clone(),
            bridge.clone(),
            referral.clone(),
            config.clone(),
        );
        let orders = OrderService::new(log.clone(), bridge.clone());
        let admin = AdminService::new(
            Arc::clone(&storage),
            ledger.clone(),
            log.clone(),
            referral.clone(),
            ico.clone(),
            config.clone(),
        );

        Ok(Self {
            storage,
            ledger,
            log,
            referral,
            bridge,
            wallet,
            ico,
            orders,
            admin,
            config,
        })
    }

    pub async fn flush(&self) -> Result<usize, LedgerError> {
        self.storage.flush().await
    }
}
