use async_trait::async_trait;
use log::trace;

use crate::core::{
    error::LedgerError,
    storage::{
        sled::{Update, CORRELATIONS},
        CorrelationProvider, CorrelationTarget, SledStorage,
    },
};

#[async_trait]
impl CorrelationProvider for SledStorage {
    async fn register_correlation(
        &self,
        merchant_transaction_id: &str,
        target: &CorrelationTarget,
    ) -> Result<(), LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!(
                "register correlation {} => {} {}",
                merchant_transaction_id,
                target.kind,
                target.id
            );
        }
        Self::update_with(
            &self.correlations,
            CORRELATIONS,
            merchant_transaction_id.as_bytes(),
            |current: Option<CorrelationTarget>| match current {
                Some(existing) if existing == *target => Ok(Update::Keep(())),
                Some(_) => Err(LedgerError::DuplicateCorrelationId(
                    merchant_transaction_id.to_owned(),
                )),
                None => Ok(Update::Write(*target, ())),
            },
        )
    }

    async fn get_correlation(
        &self,
        merchant_transaction_id: &str,
    ) -> Result<Option<CorrelationTarget>, LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("get correlation of {}", merchant_transaction_id);
        }
        Self::load_optional_from_disk(&self.correlations, merchant_transaction_id.as_bytes())
    }
}
