pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Fiat amounts are stored in minor units
// 2 decimals: 1 INR = 100 paise
pub const FIAT_DECIMALS: u8 = 2;
pub const FIAT_VALUE: u64 = 10u64.pow(FIAT_DECIMALS as u32);

// 8 decimals numbers for token holdings
pub const TOKEN_DECIMALS: u8 = 8;
// 100 000 000 to represent 1 token
pub const TOKEN_VALUE: u64 = 10u64.pow(TOKEN_DECIMALS as u32);

// Currency used for every wallet account
pub const DEFAULT_CURRENCY: &str = "INR";

// ===== ICO DEFAULTS =====
// Price of one whole token in fiat minor units (10 INR)
pub const DEFAULT_TOKEN_PRICE: u64 = 10 * FIAT_VALUE;
pub const DEFAULT_TOKEN_SYMBOL: &str = "ICOX";

// ===== WALLET LIMITS =====
// Minimum top-up amount (10 INR)
pub const DEFAULT_MIN_TOPUP_AMOUNT: u64 = 10 * FIAT_VALUE;
// Maximum top-up amount (200 000 INR)
pub const DEFAULT_MAX_TOPUP_AMOUNT: u64 = 200_000 * FIAT_VALUE;
// Minimum withdrawal amount (100 INR)
pub const DEFAULT_MIN_WITHDRAW_AMOUNT: u64 = 100 * FIAT_VALUE;

// ===== REFERRAL RULES =====
// Maximum depth of the referral tree walked for commissions
pub const MAX_REFERRAL_DEPTH: u8 = 8;
// Downline counters are indexed by relative depth 0..=MAX_REFERRAL_DEPTH
pub const DOWNLINE_COUNTS_SIZE: usize = MAX_REFERRAL_DEPTH as usize + 1;
// 10000 basis points = 100%
pub const BASIS_POINTS: u32 = 10_000;
// Referral codes are uppercase alphanumeric
pub const REFERRAL_CODE_LENGTH: usize = 8;

// ===== PAGINATION =====
pub const DEFAULT_PAGE_LIMIT: u32 = 50;
pub const MAX_USER_PAGE_LIMIT: u32 = 100;
pub const MAX_ADMIN_PAGE_LIMIT: u32 = 200;

// Number of transactions shown in a wallet summary
pub const RECENT_TRANSACTIONS_COUNT: usize = 5;
