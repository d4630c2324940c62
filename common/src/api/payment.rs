// Payment session types for the hosted gateways

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::id::Id;

/// Header carrying the checksum of PhonePe requests and callbacks
pub const PHONEPE_VERIFY_HEADER: &str = "X-VERIFY";

/// API path signed into every PhonePe pay request checksum
pub const PHONEPE_PAY_PATH: &str = "/pg/v1/pay";

/// Callback codes PhonePe uses for a captured payment
pub const PHONEPE_SUCCESS_CODES: [&str; 2] = ["PAYMENT_SUCCESS", "SUCCESS"];

/// Redirect mode sent to the PhonePe pay page
pub const PHONEPE_REDIRECT_MODE: &str = "POST";

/// Default payment instrument when the client does not pick one
pub const PHONEPE_PAY_PAGE: &str = "PAY_PAGE";

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentGatewayKind {
    PhonePe,
    Razorpay,
}

/// How a token purchase is funded
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PaymentMethod {
    Wallet,
    #[default]
    PhonePe,
    Razorpay,
}

/// Everything a gateway needs to open a payment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSessionRequest {
    /// Internal record id, echoed back by the gateway callback
    pub merchant_transaction_id: String,
    pub merchant_user_id: String,
    /// Fiat minor units
    pub amount: u64,
    pub redirect_url: Option<String>,
    pub payment_instrument: Option<String>,
}

impl PaymentSessionRequest {
    pub fn new(merchant_transaction_id: &Id, merchant_user_id: &Id, amount: u64) -> Self {
        Self {
            merchant_transaction_id: merchant_transaction_id.to_hex(),
            merchant_user_id: merchant_user_id.to_hex(),
            amount,
            redirect_url: None,
            payment_instrument: None,
        }
    }

    pub fn with_redirect_url(mut self, redirect_url: Option<String>) -> Self {
        self.redirect_url = redirect_url;
        self
    }

    pub fn with_payment_instrument(mut self, instrument: Option<String>) -> Self {
        self.payment_instrument = instrument;
        self
    }
}

/// Opaque bundle handed to the client to open the gateway page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSession {
    pub endpoint: String,
    pub encoded_payload: String,
    pub checksum: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentInstrument {
    #[serde(rename = "type")]
    pub kind: String,
}

/// JSON body of a PhonePe pay request, sent base64 encoded
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PhonePePayPayload {
    pub merchant_id: String,
    pub merchant_transaction_id: String,
    pub merchant_user_id: String,
    /// Paise
    pub amount: u64,
    pub redirect_url: String,
    pub redirect_mode: String,
    pub callback_url: String,
    pub payment_instrument: PaymentInstrument,
}

impl PhonePePayPayload {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_vec(self)?;
        Ok(STANDARD.encode(json))
    }
}

/// X-VERIFY header value: sha256(payload + path + salt key) in hex, then "###" and the salt index
pub fn phonepe_checksum(encoded_payload: &str, path: &str, salt_key: &str, salt_index: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(encoded_payload.as_bytes());
    hasher.update(path.as_bytes());
    hasher.update(salt_key.as_bytes());
    format!("{}###{}", hex::encode(hasher.finalize()), salt_index)
}

/// Checksum of a callback body: sha256(body + salt key) in hex, then "###" and the salt index
pub fn phonepe_callback_checksum(body: &[u8], salt_key: &str, salt_index: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body);
    hasher.update(salt_key.as_bytes());
    format!("{}###{}", hex::encode(hasher.finalize()), salt_index)
}

/// Verify the X-VERIFY header of a callback in constant time
pub fn verify_phonepe_callback(body: &[u8], checksum: &str, salt_key: &str, salt_index: u32) -> bool {
    let expected = phonepe_callback_checksum(body, salt_key, salt_index);
    expected.as_bytes().ct_eq(checksum.trim().as_bytes()).into()
}

/// Check a callback code against the gateway success list
pub fn is_phonepe_success(code: &str) -> bool {
    PHONEPE_SUCCESS_CODES.contains(&code)
}

/// Razorpay order id derived from the internal record id
pub fn razorpay_order_id(id: &Id) -> String {
    format!("order_{}", id.to_hex())
}

/// Checkout parameters returned to the client for a Razorpay order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RazorpayCheckout {
    pub order_id: String,
    /// Fiat minor units
    pub amount: u64,
    pub currency: String,
    pub key_id: String,
    /// Internal record id
    pub receipt: String,
}
