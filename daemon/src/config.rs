// bind addresses
// Admin routes have no authentication of their own, keep it on loopback
pub const DEFAULT_RPC_BIND_ADDRESS: &str = "127.0.0.1:8080";

// Default folder of the sled database
pub const DEFAULT_DIR_PATH: &str = "meridian-db/";

// Route used to expose Prometheus metrics
pub const DEFAULT_PROMETHEUS_ROUTE: &str = "/metrics";

// Header set by the authentication layer with the caller user id
pub const USER_ID_HEADER: &str = "X-User-Id";

// Maximum attempts of a compare-and-swap loop before giving up
// Each retry means another writer updated the same record in between
pub const MAX_CAS_RETRIES: usize = 1024;

// Attempts to allocate a referral code not used by another profile
pub const MAX_REFERRAL_CODE_ATTEMPTS: usize = 16;

// ===== PHONEPE =====
pub const DEFAULT_PHONEPE_MERCHANT_ID: &str = "MERCHANTUAT";
pub const DEFAULT_PHONEPE_SALT_INDEX: u32 = 1;
pub const DEFAULT_PHONEPE_ENDPOINT: &str =
    "https://api-preprod.phonepe.com/apis/pg-sandbox/pg/v1/pay";
pub const DEFAULT_PHONEPE_CALLBACK_URL: &str =
    "http://127.0.0.1:8080/payments/phonepe/callback";
pub const DEFAULT_PHONEPE_REDIRECT_URL: &str = "http://127.0.0.1:3000/payment/status";
