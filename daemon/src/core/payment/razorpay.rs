use log::{debug, warn};
use meridian_common::{
    api::{razorpay_order_id, verify_payment_signature, RazorpayCheckout},
    id::Id,
};

use crate::core::{config::RazorpayConfig, error::LedgerError};

/// Checkout orders and signature checks for Razorpay.
/// Order ids are derived from the internal record id.
pub struct RazorpayGateway {
    key_id: String,
    key_secret: String,
}

impl RazorpayGateway {
    pub fn new(key_id: String, key_secret: String) -> Self {
        Self { key_id, key_secret }
    }

    // None unless both the key id and secret are set
    pub fn from_config(config: &RazorpayConfig) -> Option<Self> {
        match (&config.razorpay_key_id, &config.razorpay_key_secret) {
            (Some(key_id), Some(key_secret)) if !key_id.is_empty() && !key_secret.is_empty() => {
                Some(Self::new(key_id.clone(), key_secret.clone()))
            }
            _ => None,
        }
    }

    pub fn create_order(&self, receipt: &Id, amount: u64, currency: &str) -> RazorpayCheckout {
        let order_id = razorpay_order_id(receipt);
        if log::log_enabled!(log::Level::Debug) {
            debug!("created Razorpay order {} for {}", order_id, receipt);
        }
        RazorpayCheckout {
            order_id,
            amount,
            currency: currency.to_owned(),
            key_id: self.key_id.clone(),
            receipt: receipt.to_hex(),
        }
    }

    pub fn verify(&self, order_id: &str, payment_id: &str, signature: &str) -> Result<(), LedgerError> {
        if verify_payment_signature(self.key_secret.as_bytes(), order_id, payment_id, signature) {
            Ok(())
        } else {
            warn!("invalid Razorpay signature for order {}", order_id);
            Err(LedgerError::InvalidSignature)
        }
    }
}
