use async_trait::async_trait;
use log::debug;
use meridian_common::api::{
    phonepe_checksum, verify_phonepe_callback, PaymentGatewayKind, PaymentInstrument, PaymentSession,
    PaymentSessionRequest, PhonePePayPayload, PHONEPE_PAY_PAGE, PHONEPE_PAY_PATH,
    PHONEPE_REDIRECT_MODE, PHONEPE_SUCCESS_CODES,
};

use crate::core::{config::PhonePeConfig, error::LedgerError};

use super::PaymentGateway;

/// Pay page sessions signed with the merchant salt key.
/// The client posts the session to the endpoint itself.
pub struct PhonePeGateway {
    config: PhonePeConfig,
}

impl PhonePeGateway {
    pub fn new(config: PhonePeConfig) -> Self {
        Self { config }
    }

    pub fn payload(&self, request: &PaymentSessionRequest) -> PhonePePayPayload {
        PhonePePayPayload {
            merchant_id: self.config.phonepe_merchant_id.clone(),
            merchant_transaction_id: request.merchant_transaction_id.clone(),
            merchant_user_id: request.merchant_user_id.clone(),
            amount: request.amount,
            redirect_url: request
                .redirect_url
                .clone()
                .unwrap_or_else(|| self.config.phonepe_redirect_url.clone()),
            redirect_mode: PHONEPE_REDIRECT_MODE.to_owned(),
            callback_url: self.config.phonepe_callback_url.clone(),
            payment_instrument: PaymentInstrument {
                kind: request
                    .payment_instrument
                    .clone()
                    .unwrap_or_else(|| PHONEPE_PAY_PAGE.to_owned()),
            },
        }
    }
}

#[async_trait]
impl PaymentGateway for PhonePeGateway {
    fn kind(&self) -> PaymentGatewayKind {
        PaymentGatewayKind::PhonePe
    }

    async fn create_session(
        &self,
        request: &PaymentSessionRequest,
    ) -> Result<PaymentSession, LedgerError> {
        if self.config.phonepe_salt_key.is_empty() {
            return Err(LedgerError::GatewayNotConfigured(self.kind()));
        }

        let encoded_payload = self.payload(request).encode()?;
        let checksum = phonepe_checksum(
            &encoded_payload,
            PHONEPE_PAY_PATH,
            &self.config.phonepe_salt_key,
            self.config.phonepe_salt_index,
        );

        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "created PhonePe session for {} ({} paise)",
                request.merchant_transaction_id, request.amount
            );
        }
        Ok(PaymentSession {
            endpoint: self.config.phonepe_endpoint.clone(),
            encoded_payload,
            checksum,
        })
    }

    fn success_codes(&self) -> &[&'static str] {
        &PHONEPE_SUCCESS_CODES
    }

    fn verify_callback(&self, body: &[u8], checksum: Option<&str>) -> Result<(), LedgerError> {
        if self.config.phonepe_salt_key.is_empty() {
            return Err(LedgerError::GatewayNotConfigured(self.kind()));
        }

        let checksum = checksum.ok_or(LedgerError::InvalidSignature)?;
        if !verify_phonepe_callback(
            body,
            checksum,
            &self.config.phonepe_salt_key,
            self.config.phonepe_salt_index,
        ) {
            return Err(LedgerError::InvalidSignature);
        }
        Ok(())
    }
}
