// Referral profile storage provider trait

use crate::core::error::LedgerError;
use async_trait::async_trait;
use meridian_common::{
    id::UserId,
    referral::{ProfileMutation, ReferralProfile},
};

/// Storage provider for referral profiles and their codes
#[async_trait]
pub trait ReferralProvider {
    /// Get the referral profile of a user
    /// Returns None if the user never registered
    async fn get_referral_profile(
        &self,
        user: &UserId,
    ) -> Result<Option<ReferralProfile>, LedgerError>;

    /// Insert a new profile if the user has none yet
    /// Returns false when a profile already exists, nothing is written then
    async fn insert_referral_profile(&self, profile: &ReferralProfile)
        -> Result<bool, LedgerError>;

    /// Apply a mutation to a stored profile in a single conditional write
    ///
    /// # Errors
    /// * `UserNotFound` - No profile for this user
    async fn update_referral_profile(
        &self,
        user: &UserId,
        mutation: ProfileMutation,
    ) -> Result<ReferralProfile, LedgerError>;

    // ===== Referral codes =====

    /// Bind an unused code to a user
    /// Returns false if the code already belongs to someone
    async fn reserve_referral_code(&self, code: &str, user: &UserId) -> Result<bool, LedgerError>;

    /// Remove a code reservation
    async fn release_referral_code(&self, code: &str) -> Result<(), LedgerError>;

    /// Owner of a normalized referral code
    async fn get_user_by_referral_code(&self, code: &str) -> Result<Option<UserId>, LedgerError>;
}
