use clap::Parser;
use meridian_common::{
    config::{
        DEFAULT_CURRENCY, DEFAULT_MAX_TOPUP_AMOUNT, DEFAULT_MIN_TOPUP_AMOUNT,
        DEFAULT_MIN_WITHDRAW_AMOUNT, DEFAULT_TOKEN_PRICE, DEFAULT_TOKEN_SYMBOL,
        MAX_REFERRAL_DEPTH, VERSION,
    },
    referral::{ReferralRates, ReferralResult},
};
use serde::{Deserialize, Serialize};

use crate::config::{
    DEFAULT_DIR_PATH, DEFAULT_PHONEPE_CALLBACK_URL, DEFAULT_PHONEPE_ENDPOINT,
    DEFAULT_PHONEPE_MERCHANT_ID, DEFAULT_PHONEPE_REDIRECT_URL, DEFAULT_PHONEPE_SALT_INDEX,
    DEFAULT_PROMETHEUS_ROUTE, DEFAULT_RPC_BIND_ADDRESS,
};

// Functions Helpers
fn default_currency() -> String {
    DEFAULT_CURRENCY.to_owned()
}

fn default_token_price() -> u64 {
    DEFAULT_TOKEN_PRICE
}

fn default_token_symbol() -> String {
    DEFAULT_TOKEN_SYMBOL.to_owned()
}

fn default_min_topup_amount() -> u64 {
    DEFAULT_MIN_TOPUP_AMOUNT
}

fn default_max_topup_amount() -> u64 {
    DEFAULT_MAX_TOPUP_AMOUNT
}

fn default_min_withdraw_amount() -> u64 {
    DEFAULT_MIN_WITHDRAW_AMOUNT
}

fn default_referral_rates() -> Vec<u16> {
    ReferralRates::default().ratios
}

fn default_max_referral_depth() -> u8 {
    MAX_REFERRAL_DEPTH
}

fn default_phonepe_merchant_id() -> String {
    DEFAULT_PHONEPE_MERCHANT_ID.to_owned()
}

fn default_phonepe_salt_index() -> u32 {
    DEFAULT_PHONEPE_SALT_INDEX
}

fn default_phonepe_endpoint() -> String {
    DEFAULT_PHONEPE_ENDPOINT.to_owned()
}

fn default_phonepe_callback_url() -> String {
    DEFAULT_PHONEPE_CALLBACK_URL.to_owned()
}

fn default_phonepe_redirect_url() -> String {
    DEFAULT_PHONEPE_REDIRECT_URL.to_owned()
}

fn default_rpc_bind_address() -> String {
    DEFAULT_RPC_BIND_ADDRESS.to_owned()
}

fn default_rpc_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn default_prometheus_route() -> String {
    DEFAULT_PROMETHEUS_ROUTE.to_owned()
}

fn default_dir_path() -> String {
    DEFAULT_DIR_PATH.to_owned()
}

/// Business rules of the ledger
#[derive(Debug, Clone, clap::Args, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Currency of every wallet account
    #[clap(long, default_value_t = default_currency())]
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Price of one whole token in fiat minor units
    /// Zero falls back to the default price
    #[clap(long, default_value_t = default_token_price())]
    #[serde(default = "default_token_price")]
    pub token_price: u64,
    /// Display symbol of the token
    #[clap(long, default_value_t = default_token_symbol())]
    #[serde(default = "default_token_symbol")]
    pub token_symbol: String,
    /// Minimum wallet top-up in fiat minor units
    #[clap(long, default_value_t = default_min_topup_amount())]
    #[serde(default = "default_min_topup_amount")]
    pub min_topup_amount: u64,
    /// Maximum wallet top-up in fiat minor units
    #[clap(long, default_value_t = default_max_topup_amount())]
    #[serde(default = "default_max_topup_amount")]
    pub max_topup_amount: u64,
    /// Minimum withdrawal in fiat minor units
    #[clap(long, default_value_t = default_min_withdraw_amount())]
    #[serde(default = "default_min_withdraw_amount")]
    pub min_withdraw_amount: u64,
    /// Commission rate for each referral depth in basis points
    /// First value is paid to the direct referrer
    #[clap(long, value_delimiter = ',', default_values_t = default_referral_rates())]
    #[serde(default = "default_referral_rates")]
    pub referral_rates: Vec<u16>,
    /// Number of ancestors paid on each purchase
    #[clap(long, default_value_t = default_max_referral_depth())]
    #[serde(default = "default_max_referral_depth")]
    pub max_referral_depth: u8,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            token_price: default_token_price(),
            token_symbol: default_token_symbol(),
            min_topup_amount: default_min_topup_amount(),
            max_topup_amount: default_max_topup_amount(),
            min_withdraw_amount: default_min_withdraw_amount(),
            referral_rates: default_referral_rates(),
            max_referral_depth: default_max_referral_depth(),
        }
    }
}

impl LedgerConfig {
    /// Token price used for new transactions
    pub fn effective_token_price(&self) -> u64 {
        if self.token_price == 0 {
            DEFAULT_TOKEN_PRICE
        } else {
            self.token_price
        }
    }

    pub fn referral_rates(&self) -> ReferralRates {
        ReferralRates::new(self.referral_rates.clone())
    }

    /// Depth walked for commissions, never above the tracked path length
    pub fn effective_referral_depth(&self) -> u8 {
        self.max_referral_depth.min(MAX_REFERRAL_DEPTH)
    }

    pub fn validate(&self) -> ReferralResult<()> {
        self.referral_rates().validate()
    }
}

/// PhonePe pay page credentials
#[derive(Debug, Clone, clap::Args, Serialize, Deserialize)]
pub struct PhonePeConfig {
    #[clap(long, default_value_t = default_phonepe_merchant_id())]
    #[serde(default = "default_phonepe_merchant_id")]
    pub phonepe_merchant_id: String,
    /// Salt key used in the request checksum
    #[clap(long, default_value_t)]
    #[serde(default)]
    pub phonepe_salt_key: String,
    #[clap(long, default_value_t = default_phonepe_salt_index())]
    #[serde(default = "default_phonepe_salt_index")]
    pub phonepe_salt_index: u32,
    /// Pay API endpoint
    #[clap(long, default_value_t = default_phonepe_endpoint())]
    #[serde(default = "default_phonepe_endpoint")]
    pub phonepe_endpoint: String,
    /// Public URL of the callback route
    #[clap(long, default_value_t = default_phonepe_callback_url())]
    #[serde(default = "default_phonepe_callback_url")]
    pub phonepe_callback_url: String,
    /// Where the customer lands after paying, when the client gives none
    #[clap(long, default_value_t = default_phonepe_redirect_url())]
    #[serde(default = "default_phonepe_redirect_url")]
    pub phonepe_redirect_url: String,
}

impl Default for PhonePeConfig {
    fn default() -> Self {
        Self {
            phonepe_merchant_id: default_phonepe_merchant_id(),
            phonepe_salt_key: String::new(),
            phonepe_salt_index: default_phonepe_salt_index(),
            phonepe_endpoint: default_phonepe_endpoint(),
            phonepe_callback_url: default_phonepe_callback_url(),
            phonepe_redirect_url: default_phonepe_redirect_url(),
        }
    }
}

/// Razorpay checkout credentials
#[derive(Debug, Clone, Default, clap::Args, Serialize, Deserialize)]
pub struct RazorpayConfig {
    /// Public key id returned to the checkout
    #[clap(long)]
    pub razorpay_key_id: Option<String>,
    /// Secret used to verify payment signatures
    #[clap(long)]
    pub razorpay_key_secret: Option<String>,
}

#[derive(Debug, Clone, clap::Args, Serialize, Deserialize)]
pub struct PrometheusConfig {
    /// Enable Prometheus metrics
    #[clap(name = "prometheus-enable", long = "prometheus-enable")]
    #[serde(default)]
    pub enable: bool,
    /// Route for the Prometheus metrics export
    #[clap(name = "prometheus-route", long = "prometheus-route", default_value_t = default_prometheus_route())]
    #[serde(default = "default_prometheus_route")]
    pub route: String,
}

#[derive(Debug, Clone, clap::Args, Serialize, Deserialize)]
pub struct RPCConfig {
    /// RPC bind address to listen for HTTP requests
    #[clap(long, default_value_t = default_rpc_bind_address())]
    #[serde(default = "default_rpc_bind_address")]
    pub rpc_bind_address: String,
    /// Number of workers to spawn for the HTTP server
    #[clap(long, default_value_t = default_rpc_threads())]
    #[serde(default = "default_rpc_threads")]
    pub rpc_threads: usize,
    /// Prometheus configuration
    #[clap(flatten)]
    pub prometheus: PrometheusConfig,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => Self::Off,
            LogLevel::Error => Self::Error,
            LogLevel::Warn => Self::Warn,
            LogLevel::Info => Self::Info,
            LogLevel::Debug => Self::Debug,
            LogLevel::Trace => Self::Trace,
        }
    }
}

#[derive(Debug, Clone, clap::Args, Serialize, Deserialize)]
pub struct LogConfig {
    /// Set log level
    #[clap(long, value_enum, default_value_t)]
    #[serde(default)]
    pub log_level: LogLevel,
    /// Extra filter directives, `env_logger` syntax
    /// Example: "meridian_daemon::core::payment=trace,sled=warn"
    #[clap(long)]
    #[serde(default)]
    pub log_filters: Option<String>,
}

#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[clap(
    version = VERSION,
    about = "Meridian - wallet, token sale and referral commission ledger"
)]
#[command(styles = clap::builder::Styles::styled())]
pub struct Config {
    /// Ledger rules
    #[clap(flatten)]
    pub ledger: LedgerConfig,
    /// PhonePe configuration
    #[clap(flatten)]
    pub phonepe: PhonePeConfig,
    /// Razorpay configuration
    #[clap(flatten)]
    pub razorpay: RazorpayConfig,
    /// RPC configuration
    #[clap(flatten)]
    pub rpc: RPCConfig,
    /// Log configuration
    #[clap(flatten)]
    pub log: LogConfig,
    /// Set the path to use for the database
    #[clap(long, default_value_t = default_dir_path())]
    #[serde(default = "default_dir_path")]
    pub dir_path: String,
    /// JSON File to load the configuration from
    #[clap(long)]
    #[serde(skip)]
    #[serde(default)]
    pub config_file: Option<String>,
    /// Generate the template at the `config_file` path
    #[clap(long)]
    #[serde(skip)]
    #[serde(default)]
    pub generate_config_template: bool,
}
