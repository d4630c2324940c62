//! Shared fixtures of the daemon integration tests
//!
//! Every test opens its own sled database inside a `TempDir` and wires the
//! services with a mock hosted gateway, so no network is involved.

#![allow(dead_code)]
#![allow(clippy::disallowed_methods)]

use std::sync::Arc;

use async_trait::async_trait;
use meridian_common::{
    api::{
        phonepe_callback_checksum, verify_phonepe_callback, CallbackOutcome, PaymentGatewayKind,
        PaymentSession, PaymentSessionRequest,
    },
    config::FIAT_VALUE,
    id::{Id, UserId},
    referral::ReferralProfile,
};
use meridian_daemon::core::{
    backend::Backend,
    config::LedgerConfig,
    error::LedgerError,
    payment::{PaymentBridge, PaymentGateway, RazorpayGateway},
    storage::SledStorage,
};
use serde_json::{json, Value};
use tempdir::TempDir;

pub const RAZORPAY_KEY_ID: &str = "rzp_test_key";
pub const RAZORPAY_SECRET: &str = "rzp_test_secret";
pub const SUCCESS_CODE: &str = "PAYMENT_SUCCESS";
pub const SALT_KEY: &str = "test-salt-key";
pub const SALT_INDEX: u32 = 1;

/// Hosted gateway answering without any network call
pub struct MockGateway {
    pub fail: bool,
}

#[async_trait]
impl PaymentGateway for MockGateway {
    fn kind(&self) -> PaymentGatewayKind {
        PaymentGatewayKind::PhonePe
    }

    async fn create_session(
        &self,
        request: &PaymentSessionRequest,
    ) -> Result<PaymentSession, LedgerError> {
        if self.fail {
            return Err(LedgerError::Gateway("gateway unavailable".to_owned()));
        }
        Ok(PaymentSession {
            endpoint: "https://pay.invalid/pg/v1/pay".to_owned(),
            encoded_payload: request.merchant_transaction_id.clone(),
            checksum: "checksum###1".to_owned(),
        })
    }

    fn success_codes(&self) -> &[&'static str] {
        &[SUCCESS_CODE]
    }

    fn verify_callback(&self, body: &[u8], checksum: Option<&str>) -> Result<(), LedgerError> {
        match checksum {
            Some(checksum) if verify_phonepe_callback(body, checksum, SALT_KEY, SALT_INDEX) => {
                Ok(())
            }
            _ => Err(LedgerError::InvalidSignature),
        }
    }
}

/// 10% to the direct referrer, 5% to the next one
pub fn test_ledger_config() -> LedgerConfig {
    LedgerConfig {
        referral_rates: vec![1000, 500],
        max_referral_depth: 2,
        min_topup_amount: 10 * FIAT_VALUE,
        min_withdraw_amount: 100 * FIAT_VALUE,
        ..Default::default()
    }
}

pub fn create_test_storage(temp_dir: &TempDir) -> Arc<SledStorage> {
    let path = temp_dir.path().to_str().unwrap().to_owned();
    Arc::new(SledStorage::new(path, None).unwrap())
}

pub fn create_backend_with(
    temp_dir: &TempDir,
    config: LedgerConfig,
    fail: bool,
) -> Backend<SledStorage> {
    Backend::with_gateway(
        create_test_storage(temp_dir),
        config,
        Arc::new(MockGateway { fail }),
        Some(RazorpayGateway::new(
            RAZORPAY_KEY_ID.to_owned(),
            RAZORPAY_SECRET.to_owned(),
        )),
    )
    .unwrap()
}

pub fn create_test_backend(temp_dir: &TempDir) -> Backend<SledStorage> {
    create_backend_with(temp_dir, test_ledger_config(), false)
}

pub fn callback_body(merchant_transaction_id: &str, code: &str) -> Value {
    json!({
        "merchantTransactionId": merchant_transaction_id,
        "code": code,
        "transactionId": format!("T{}", merchant_transaction_id),
    })
}

/// X-VERIFY value the gateway would send with `body`
pub fn sign_callback(body: &[u8]) -> String {
    phonepe_callback_checksum(body, SALT_KEY, SALT_INDEX)
}

/// Deliver a signed callback, as the gateway does
pub async fn deliver(
    bridge: &PaymentBridge<SledStorage>,
    body: &Value,
) -> Result<CallbackOutcome, LedgerError> {
    let bytes = serde_json::to_vec(body).unwrap();
    let checksum = sign_callback(&bytes);
    bridge.handle_callback(&bytes, Some(&checksum)).await
}

pub async fn fund(backend: &Backend<SledStorage>, user: &UserId, amount: u64) {
    backend.ledger.credit(user, amount).await.unwrap();
}

/// Register `user`, below the owner of `referrer` when given
pub async fn register(
    backend: &Backend<SledStorage>,
    referrer: Option<&ReferralProfile>,
) -> ReferralProfile {
    let user = Id::random();
    backend
        .referral
        .register_profile(&user, referrer.map(|p| p.referral_code.as_str()))
        .await
        .unwrap()
}

/// root <- a <- b <- buyer, returns [root, a, b, buyer]
pub async fn referral_chain(backend: &Backend<SledStorage>) -> Vec<ReferralProfile> {
    let root = register(backend, None).await;
    let a = register(backend, Some(&root)).await;
    let b = register(backend, Some(&a)).await;
    let buyer = register(backend, Some(&b)).await;
    vec![root, a, b, buyer]
}

pub async fn referral_balance(backend: &Backend<SledStorage>, user: &UserId) -> u64 {
    backend
        .referral
        .profile(user)
        .await
        .unwrap()
        .map(|p| p.referral_wallet_balance)
        .unwrap_or(0)
}
