// Referral program error types

use thiserror::Error;

/// Errors that can occur in the referral program
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReferralError {
    /// User already has a referral profile
    #[error("User is already registered in the referral program")]
    AlreadyRegistered,

    /// No profile owns the given referral code
    #[error("Referrer not found")]
    ReferrerNotFound,

    /// Referral code has the wrong length or characters
    #[error("Invalid referral code '{0}'")]
    InvalidCode(String),

    /// Could not generate an unused referral code
    #[error("Unable to allocate a unique referral code")]
    CodeExhausted,

    /// Requested level exceeds maximum allowed
    #[error("Requested {requested} levels exceeds maximum {max}")]
    LevelsTooDeep { max: u8, requested: u8 },

    /// Total reward ratio exceeds 100%
    #[error("Total reward ratio {total} exceeds 10000 (100%)")]
    RatiosTooHigh { total: u32 },

    /// A deeper level pays more than the level above it
    #[error("Reward ratio at depth {depth} is higher than the previous depth")]
    RatiosIncreasing { depth: u8 },

    /// User not found in referral program
    #[error("User not found in referral program")]
    UserNotFound,

    /// Referral earning not found
    #[error("Referral earning not found")]
    EarningNotFound,
}

/// Result type for referral operations
pub type ReferralResult<T> = Result<T, ReferralError>;
