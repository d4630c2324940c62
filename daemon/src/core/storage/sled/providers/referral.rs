use async_trait::async_trait;
use log::{debug, trace};
use meridian_common::{
    id::{Id, UserId},
    referral::{ProfileMutation, ReferralError, ReferralProfile},
};

use crate::core::{
    error::LedgerError,
    storage::{
        sled::{Update, REFERRAL_CODES, REFERRAL_PROFILES},
        ReferralProvider, SledStorage,
    },
};

#[async_trait]
impl ReferralProvider for SledStorage {
    async fn get_referral_profile(
        &self,
        user: &UserId,
    ) -> Result<Option<ReferralProfile>, LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("get referral profile of {}", user);
        }
        Self::load_optional_from_disk(&self.referral_profiles, user.as_bytes())
    }

    async fn insert_referral_profile(
        &self,
        profile: &ReferralProfile,
    ) -> Result<bool, LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("insert referral profile of {}", profile.user);
        }
        Self::update_with(
            &self.referral_profiles,
            REFERRAL_PROFILES,
            profile.user.as_bytes(),
            |current: Option<ReferralProfile>| {
                Ok(match current {
                    Some(_) => {
                        debug!("referral profile of {} already exists", profile.user);
                        Update::Keep(false)
                    }
                    None => Update::Write(profile.clone(), true),
                })
            },
        )
    }

    async fn update_referral_profile(
        &self,
        user: &UserId,
        mutation: ProfileMutation,
    ) -> Result<ReferralProfile, LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("update referral profile of {} with {:?}", user, mutation);
        }
        Self::update_with(
            &self.referral_profiles,
            REFERRAL_PROFILES,
            user.as_bytes(),
            |current: Option<ReferralProfile>| {
                let mut profile = current.ok_or(ReferralError::UserNotFound)?;
                mutation.apply(&mut profile)?;
                Ok(Update::Write(profile.clone(), profile))
            },
        )
    }

    async fn reserve_referral_code(&self, code: &str, user: &UserId) -> Result<bool, LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("reserve referral code {} for {}", code, user);
        }
        let swap = self.referral_codes.compare_and_swap(
            code.as_bytes(),
            None as Option<&[u8]>,
            Some(user.as_bytes().as_slice()),
        )?;
        if swap.is_err() {
            metrics::counter!("meridian_ledger_conflicts_total", "tree" => REFERRAL_CODES)
                .increment(1);
        }
        Ok(swap.is_ok())
    }

    async fn release_referral_code(&self, code: &str) -> Result<(), LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("release referral code {}", code);
        }
        self.referral_codes.remove(code.as_bytes())?;
        Ok(())
    }

    async fn get_user_by_referral_code(&self, code: &str) -> Result<Option<UserId>, LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("get user by referral code {}", code);
        }
        match self.referral_codes.get(code.as_bytes())? {
            Some(bytes) => Id::from_bytes(&bytes)
                .map(Some)
                .ok_or(LedgerError::CorruptedData(REFERRAL_CODES)),
            None => Ok(None),
        }
    }
}
