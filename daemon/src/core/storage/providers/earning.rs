use crate::core::error::LedgerError;
use async_trait::async_trait;
use meridian_common::{
    id::{Id, UserId},
    referral::{EarningFilter, EarningStatus, ReferralEarning},
    time::TimestampMillis,
};

#[async_trait]
pub trait EarningProvider {
    // Insert the earning and credit it to the referral balance of its earner
    // in a single atomic write, both or neither are stored
    // Returns false if an earning already exists for (source_id, earner)
    async fn record_earning(&self, earning: &ReferralEarning) -> Result<bool, LedgerError>;

    async fn get_earning(&self, id: &Id) -> Result<Option<ReferralEarning>, LedgerError>;

    async fn get_earning_for_source(
        &self,
        source_id: &Id,
        earner: &UserId,
    ) -> Result<Option<ReferralEarning>, LedgerError>;

    // Errors with `EarningNotFound` if no earning has this id
    async fn set_earning_status(
        &self,
        id: &Id,
        status: EarningStatus,
    ) -> Result<ReferralEarning, LedgerError>;

    // Move credited earnings of `earner` created up to `until` to redeemed
    // Returns the number of earnings changed
    async fn mark_earnings_redeemed(
        &self,
        earner: &UserId,
        until: TimestampMillis,
    ) -> Result<u64, LedgerError>;

    // Matching earnings, newest first
    async fn get_earnings(
        &self,
        filter: &EarningFilter,
    ) -> Result<Vec<ReferralEarning>, LedgerError>;
}
