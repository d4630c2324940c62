// Inbound gateway confirmations: asynchronous callbacks and signed verifications

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::referral::CommissionFailure;

// HMAC-SHA256 type alias
type HmacSha256 = Hmac<Sha256>;

/// Payment result reported by a gateway
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentResult {
    Paid,
    Failed,
}

/// Fields extracted from a gateway callback body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayCallback {
    /// Internal record id echoed back by the gateway
    pub merchant_transaction_id: String,
    /// Gateway status code
    pub code: Option<String>,
    /// Transaction id assigned by the gateway
    pub transaction_id: Option<String>,
}

impl GatewayCallback {
    /// Extract the callback fields.
    /// The fields may be nested under `data`, the merchant id may be sent as `orderId`.
    /// Returns None when no merchant transaction id is present.
    pub fn from_json(body: &Value) -> Option<Self> {
        let payload = match body.get("data") {
            Some(data) if data.is_object() => data,
            _ => body,
        };

        let field = |name: &str| {
            payload
                .get(name)
                .and_then(Value::as_str)
                .filter(|value| !value.is_empty())
                .map(str::to_owned)
        };

        let merchant_transaction_id =
            field("merchantTransactionId").or_else(|| field("orderId"))?;

        Some(Self {
            merchant_transaction_id,
            code: field("code"),
            transaction_id: field("transactionId"),
        })
    }

    /// Map the gateway code through a success list, anything else is a failure
    pub fn result(&self, success_codes: &[&str]) -> PaymentResult {
        match &self.code {
            Some(code) if success_codes.contains(&code.as_str()) => PaymentResult::Paid,
            _ => PaymentResult::Failed,
        }
    }
}

/// Result of settling one delivery.
/// `applied` and `commission_failures` describe this delivery only, a duplicate
/// reports `applied = false` and no failures. The gateway only sees the
/// `CallbackAck` built from it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CallbackOutcome {
    /// False when the id did not match any pending record
    pub handled: bool,
    pub merchant_transaction_id: String,
    pub code: PaymentResult,
    /// Whether this delivery performed the status change
    pub applied: bool,
    #[serde(default)]
    pub commission_failures: Vec<CommissionFailure>,
}

impl CallbackOutcome {
    pub fn unhandled(merchant_transaction_id: String, code: PaymentResult) -> Self {
        Self {
            handled: false,
            merchant_transaction_id,
            code,
            applied: false,
            commission_failures: Vec::new(),
        }
    }
}

/// Acknowledgement returned to the gateway, identical for every delivery of a callback
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CallbackAck {
    pub handled: bool,
    pub merchant_transaction_id: String,
    pub code: PaymentResult,
}

impl From<CallbackOutcome> for CallbackAck {
    fn from(outcome: CallbackOutcome) -> Self {
        Self {
            handled: outcome.handled,
            merchant_transaction_id: outcome.merchant_transaction_id,
            code: outcome.code,
        }
    }
}

/// Generate the Razorpay payment signature
///
/// Signature format:
/// 1. Concatenate: order_id + "|" + payment_id
/// 2. Compute HMAC-SHA256 with the key secret
/// 3. Encode as lowercase hex
pub fn generate_payment_signature(key_secret: &[u8], order_id: &str, payment_id: &str) -> String {
    let payload = format!("{}|{}", order_id, payment_id);

    let mut mac = HmacSha256::new_from_slice(key_secret).expect("HMAC can take key of any size");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a Razorpay payment signature in constant time
pub fn verify_payment_signature(
    key_secret: &[u8],
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> bool {
    let expected = generate_payment_signature(key_secret, order_id, payment_id);
    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}
