// Request and response bodies of the daemon RPC server

use serde::{Deserialize, Serialize};

use crate::{
    account::{IcoHolding, WalletAccount},
    api::{Pagination, PaymentMethod, PaymentSession, RazorpayCheckout},
    id::{Id, UserId},
    referral::{
        DistributionReport, EarningFilter, EarningStatus, ReferralProfile, SourceType,
    },
    transaction::{
        IcoTransaction, IcoTransactionFilter, IcoTransactionStatus, IcoTransactionType, Order,
        TransactionCategory, TransactionFilter, TransactionStatus, TransactionType,
        WalletTransaction,
    },
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopupParams {
    /// Fiat minor units
    pub amount: u64,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub redirect_url: Option<String>,
    #[serde(default)]
    pub payment_instrument: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopupResult {
    pub wallet: WalletAccount,
    pub transaction: WalletTransaction,
    pub payment_session: PaymentSession,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawParams {
    /// Fiat minor units
    pub amount: u64,
    #[serde(default)]
    pub payout_method: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawResult {
    pub wallet: WalletAccount,
    pub transaction: WalletTransaction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSummary {
    pub wallet: WalletAccount,
    /// Sum of top-ups still waiting for the gateway
    pub pending_topup_amount: u64,
    pub pending_topup_count: u64,
    pub recent_transactions: Vec<WalletTransaction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemResult {
    /// Amount moved from the referral balance to the wallet
    pub amount: u64,
    pub wallet: WalletAccount,
    pub transaction: WalletTransaction,
    pub redeemed_earnings: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenPrice {
    pub symbol: String,
    /// Fiat minor units per whole token
    pub price: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingSummary {
    pub balance: u64,
    pub symbol: String,
    pub price: u64,
    /// Fiat value of the balance at the current price
    pub valuation: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IcoBuyParams {
    /// Token atomic units, takes precedence over `fiat_amount`
    #[serde(default)]
    pub token_amount: Option<u64>,
    /// Fiat minor units
    #[serde(default)]
    pub fiat_amount: Option<u64>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum IcoBuyResult {
    /// Settled immediately from the wallet balance
    #[serde(rename_all = "camelCase")]
    Wallet {
        transaction: IcoTransaction,
        wallet: WalletAccount,
        holding: IcoHolding,
        commission: DistributionReport,
    },
    /// Waiting for the PhonePe callback
    #[serde(rename = "phonepe", rename_all = "camelCase")]
    PhonePe {
        transaction: IcoTransaction,
        payment_session: PaymentSession,
    },
    /// Waiting for the Razorpay signed confirmation
    #[serde(rename_all = "camelCase")]
    Razorpay {
        transaction: IcoTransaction,
        razorpay: RazorpayCheckout,
    },
}

impl IcoBuyResult {
    pub fn transaction(&self) -> &IcoTransaction {
        match self {
            Self::Wallet { transaction, .. }
            | Self::PhonePe { transaction, .. }
            | Self::Razorpay { transaction, .. } => transaction,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IcoSellParams {
    /// Token atomic units
    pub token_amount: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IcoSellResult {
    pub transaction: IcoTransaction,
    pub holding: IcoHolding,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderParams {
    /// Fiat minor units
    pub amount: u64,
    #[serde(default)]
    pub redirect_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderResult {
    pub order: Order,
    pub payment_session: PaymentSession,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterReferralParams {
    #[serde(default)]
    pub referral_code: Option<String>,
}

/// Signed confirmation posted by the Razorpay checkout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPaymentParams {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransactionParams {
    #[serde(default)]
    pub status: Option<TransactionStatus>,
    #[serde(default)]
    pub admin_note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateEarningParams {
    pub status: EarningStatus,
}

/// Query string of wallet transaction listings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTransactionsParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Admin listings only
    pub user: Option<UserId>,
    pub status: Option<TransactionStatus>,
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
    pub category: Option<TransactionCategory>,
}

impl GetTransactionsParams {
    pub fn pagination(&self, max_limit: u32) -> Pagination {
        Pagination::new(self.page, self.limit, max_limit)
    }

    pub fn filter(&self) -> TransactionFilter {
        TransactionFilter {
            user: self.user,
            status: self.status,
            kind: self.kind,
            category: self.category,
        }
    }
}

/// Query string of ICO transaction listings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetIcoTransactionsParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub user: Option<UserId>,
    pub status: Option<IcoTransactionStatus>,
    #[serde(rename = "type")]
    pub kind: Option<IcoTransactionType>,
}

impl GetIcoTransactionsParams {
    pub fn pagination(&self, max_limit: u32) -> Pagination {
        Pagination::new(self.page, self.limit, max_limit)
    }

    pub fn filter(&self) -> IcoTransactionFilter {
        IcoTransactionFilter {
            user: self.user,
            status: self.status,
            kind: self.kind,
        }
    }
}

/// Query string of referral earning listings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetEarningsParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub earner: Option<UserId>,
    pub source_user: Option<UserId>,
    pub status: Option<EarningStatus>,
    pub source_type: Option<SourceType>,
    pub depth: Option<u8>,
}

impl GetEarningsParams {
    pub fn pagination(&self, max_limit: u32) -> Pagination {
        Pagination::new(self.page, self.limit, max_limit)
    }

    pub fn filter(&self) -> EarningFilter {
        EarningFilter {
            earner: self.earner,
            source_user: self.source_user,
            status: self.status,
            source_type: self.source_type,
            depth: self.depth,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub token_symbol: String,
    pub token_price: u64,
    /// Sum of all holdings, token atomic units
    pub tokens_in_circulation: u64,
    /// Fiat value of the circulating tokens at the current price
    pub token_valuation: u64,
    pub completed_buy_count: u64,
    /// Fiat received for completed token purchases
    pub completed_buy_volume: u64,
    pub total_wallet_balance: u64,
    pub total_pending_withdrawals: u64,
    /// Completed credit transactions
    pub wallet_credit_volume: u64,
    /// Completed debit transactions
    pub wallet_debit_volume: u64,
    pub referral_earnings_total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetail {
    pub user: Id,
    pub referral: Option<ReferralProfile>,
    pub wallet: WalletAccount,
    pub holding: HoldingSummary,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_ADMIN_PAGE_LIMIT;

    #[test]
    fn test_buy_params_defaults() {
        let params: IcoBuyParams = serde_json::from_str(r#"{"tokenAmount": 5}"#).unwrap();
        assert_eq!(params.token_amount, Some(5));
        assert_eq!(params.fiat_amount, None);
        assert_eq!(params.payment_method, PaymentMethod::PhonePe);
    }

    #[test]
    fn test_transactions_params() {
        let params: GetTransactionsParams = serde_json::from_str(
            r#"{"page": 2, "limit": 1000, "status": "pending", "type": "debit"}"#,
        )
        .unwrap();

        let pagination = params.pagination(MAX_ADMIN_PAGE_LIMIT);
        assert_eq!(pagination.page, 2);
        assert_eq!(pagination.limit, MAX_ADMIN_PAGE_LIMIT);

        let filter = params.filter();
        assert_eq!(filter.status, Some(TransactionStatus::Pending));
        assert_eq!(filter.kind, Some(TransactionType::Debit));
        assert_eq!(filter.category, None);
    }
}
