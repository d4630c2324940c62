use async_trait::async_trait;
use log::{debug, trace};
use meridian_common::{
    id::{Id, UserId, ID_SIZE},
    referral::{
        EarningFilter, EarningStatus, ProfileMutation, ReferralEarning, ReferralError,
        ReferralProfile,
    },
    time::{get_current_time_in_millis, TimestampMillis},
};
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError, Transactional,
};

use crate::core::{
    error::LedgerError,
    storage::{
        sled::{Update, REFERRAL_EARNINGS},
        EarningProvider, SledStorage,
    },
};

// Key of an earning: source id followed by earner id
fn earning_key(source_id: &Id, earner: &UserId) -> [u8; ID_SIZE * 2] {
    let mut key = [0u8; ID_SIZE * 2];
    key[..ID_SIZE].copy_from_slice(source_id.as_bytes());
    key[ID_SIZE..].copy_from_slice(earner.as_bytes());
    key
}

// Abort a sled transaction with a ledger error
fn abort<E: Into<LedgerError>>(e: E) -> ConflictableTransactionError<LedgerError> {
    ConflictableTransactionError::Abort(e.into())
}

impl SledStorage {
    fn set_earning_status_at(
        &self,
        key: &[u8],
        status: EarningStatus,
        only_from: Option<EarningStatus>,
    ) -> Result<Option<ReferralEarning>, LedgerError> {
        Self::update_with(
            &self.referral_earnings,
            REFERRAL_EARNINGS,
            key,
            |current: Option<ReferralEarning>| {
                let mut earning = current.ok_or(ReferralError::EarningNotFound)?;
                if only_from.is_some_and(|from| earning.status != from) {
                    return Ok(Update::Keep(None));
                }
                if earning.status == status {
                    return Ok(Update::Keep(Some(earning)));
                }
                earning.status = status;
                earning.updated_at = get_current_time_in_millis();
                Ok(Update::Write(earning.clone(), Some(earning)))
            },
        )
    }
}

#[async_trait]
impl EarningProvider for SledStorage {
    async fn record_earning(&self, earning: &ReferralEarning) -> Result<bool, LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!(
                "record earning {} of {} for source {}",
                earning.id,
                earning.earner,
                earning.source_id
            );
        }
        let key = earning_key(&earning.source_id, &earning.earner);
        let value = bincode::serialize(earning)?;
        let mutation = ProfileMutation::CreditCommission(earning.amount);

        let result = (
            &self.referral_earnings,
            &self.referral_earning_ids,
            &self.referral_profiles,
        )
            .transaction(
                |(earnings, ids, profiles)| -> ConflictableTransactionResult<bool, LedgerError> {
                    if earnings.get(&key[..])?.is_some() {
                        return Ok(false);
                    }

                    let bytes = profiles
                        .get(earning.earner.as_bytes().as_slice())?
                        .ok_or_else(|| abort(ReferralError::UserNotFound))?;
                    let mut profile: ReferralProfile = bincode::deserialize(&bytes).map_err(abort)?;
                    mutation.apply(&mut profile).map_err(abort)?;

                    profiles.insert(
                        earning.earner.as_bytes().as_slice(),
                        bincode::serialize(&profile).map_err(abort)?,
                    )?;
                    earnings.insert(&key[..], value.clone())?;
                    ids.insert(earning.id.as_bytes().as_slice(), &key[..])?;
                    Ok(true)
                },
            );

        if let Err(TransactionError::Abort(e)) = &result {
            if log::log_enabled!(log::Level::Debug) {
                debug!("earning {} rolled back: {}", earning.id, e);
            }
        }
        Ok(result?)
    }

    async fn get_earning(&self, id: &Id) -> Result<Option<ReferralEarning>, LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("get earning {}", id);
        }
        match self.referral_earning_ids.get(id.as_bytes())? {
            Some(key) => Self::load_optional_from_disk(&self.referral_earnings, &key),
            None => Ok(None),
        }
    }

    async fn get_earning_for_source(
        &self,
        source_id: &Id,
        earner: &UserId,
    ) -> Result<Option<ReferralEarning>, LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("get earning of {} for source {}", earner, source_id);
        }
        Self::load_optional_from_disk(&self.referral_earnings, &earning_key(source_id, earner))
    }

    async fn set_earning_status(
        &self,
        id: &Id,
        status: EarningStatus,
    ) -> Result<ReferralEarning, LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("set status of earning {} to {}", id, status);
        }
        let key = self
            .referral_earning_ids
            .get(id.as_bytes())?
            .ok_or(ReferralError::EarningNotFound)?;

        self.set_earning_status_at(&key, status, None)?
            .ok_or(LedgerError::CorruptedData(REFERRAL_EARNINGS))
    }

    async fn mark_earnings_redeemed(
        &self,
        earner: &UserId,
        until: TimestampMillis,
    ) -> Result<u64, LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("mark earnings of {} until {} as redeemed", earner, until);
        }
        let candidates: Vec<ReferralEarning> = Self::scan_tree(&self.referral_earnings)?;
        let mut count = 0;
        for earning in candidates.iter().filter(|e| {
            e.earner == *earner && e.status == EarningStatus::Credited && e.created_at <= until
        }) {
            let key = earning_key(&earning.source_id, &earning.earner);
            if self
                .set_earning_status_at(&key, EarningStatus::Redeemed, Some(EarningStatus::Credited))?
                .is_some()
            {
                count += 1;
            }
        }
        Ok(count)
    }

    async fn get_earnings(
        &self,
        filter: &EarningFilter,
    ) -> Result<Vec<ReferralEarning>, LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("get earnings matching {:?}", filter);
        }
        let mut earnings: Vec<ReferralEarning> = Self::scan_tree(&self.referral_earnings)?;
        earnings.retain(|earning| filter.matches(earning));
        earnings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(earnings)
    }
}
