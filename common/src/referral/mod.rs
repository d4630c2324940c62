// Multi-level referral program
//
// Key Features:
// - One-time referrer binding at registration (immutable afterwards)
// - Ancestor path cached on every profile, nearest ancestor first
// - Downline counters per relative depth
// - Per-depth commission rates in basis points

mod error;
mod record;

pub use error::*;
pub use record::*;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{BASIS_POINTS, MAX_REFERRAL_DEPTH, REFERRAL_CODE_LENGTH};

const REFERRAL_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Commission rates by depth (in basis points, 100 = 1%)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReferralRates {
    /// Rate for each depth (index 0 = direct referrer)
    pub ratios: Vec<u16>,
}

impl Default for ReferralRates {
    fn default() -> Self {
        // 10%, 5%, 3%, 2%, 1%, 1%, 0.5%, 0.5% for 8 levels
        Self {
            ratios: vec![1000, 500, 300, 200, 100, 100, 50, 50],
        }
    }
}

impl ReferralRates {
    pub fn new(ratios: Vec<u16>) -> Self {
        Self { ratios }
    }

    /// Number of depths paying a commission
    pub fn levels(&self) -> u8 {
        self.ratios.len().min(u8::MAX as usize) as u8
    }

    /// Rate for a 1-indexed depth
    pub fn rate(&self, depth: u8) -> Option<u16> {
        if depth == 0 {
            return None;
        }
        self.ratios.get(depth as usize - 1).copied()
    }

    pub fn total_ratio(&self) -> u32 {
        self.ratios.iter().map(|&r| r as u32).sum()
    }

    /// Check the table: at most `MAX_REFERRAL_DEPTH` levels,
    /// total below 100% and never increasing with depth
    pub fn validate(&self) -> ReferralResult<()> {
        if self.ratios.len() > MAX_REFERRAL_DEPTH as usize {
            return Err(ReferralError::LevelsTooDeep {
                max: MAX_REFERRAL_DEPTH,
                requested: self.levels(),
            });
        }

        let total = self.total_ratio();
        if total > BASIS_POINTS {
            return Err(ReferralError::RatiosTooHigh { total });
        }

        if let Some(position) = self.ratios.windows(2).position(|w| w[1] > w[0]) {
            return Err(ReferralError::RatiosIncreasing {
                depth: position as u8 + 2,
            });
        }

        Ok(())
    }
}

/// Generate a random uppercase alphanumeric referral code
pub fn generate_referral_code() -> String {
    let mut rng = rand::thread_rng();
    (0..REFERRAL_CODE_LENGTH)
        .map(|_| REFERRAL_CODE_CHARSET[rng.gen_range(0..REFERRAL_CODE_CHARSET.len())] as char)
        .collect()
}

/// Normalize a user supplied referral code.
/// Codes are case insensitive and stored uppercase.
pub fn normalize_referral_code(code: &str) -> ReferralResult<String> {
    let code = code.trim().to_ascii_uppercase();
    if code.len() != REFERRAL_CODE_LENGTH
        || !code.bytes().all(|b| REFERRAL_CODE_CHARSET.contains(&b))
    {
        return Err(ReferralError::InvalidCode(code));
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rates() {
        let rates = ReferralRates::default();
        assert_eq!(rates.levels(), 8);
        assert_eq!(rates.rate(1), Some(1000)); // 10%
        assert_eq!(rates.rate(2), Some(500)); // 5%
        assert_eq!(rates.rate(0), None);
        assert_eq!(rates.rate(9), None);
        assert_eq!(rates.total_ratio(), 2300);
        assert!(rates.validate().is_ok());
    }

    #[test]
    fn test_invalid_rates() {
        let rates = ReferralRates::new(vec![5000, 3000, 3000]);
        assert_eq!(
            rates.validate(),
            Err(ReferralError::RatiosTooHigh { total: 11000 })
        );

        let rates = ReferralRates::new(vec![100, 200]);
        assert_eq!(
            rates.validate(),
            Err(ReferralError::RatiosIncreasing { depth: 2 })
        );

        let rates = ReferralRates::new(vec![10; 9]);
        assert!(matches!(
            rates.validate(),
            Err(ReferralError::LevelsTooDeep { max: 8, requested: 9 })
        ));
    }

    #[test]
    fn test_referral_code() {
        let code = generate_referral_code();
        assert_eq!(code.len(), REFERRAL_CODE_LENGTH);
        assert_eq!(normalize_referral_code(&code.to_lowercase()).unwrap(), code);
        assert!(normalize_referral_code("abc").is_err());
        assert!(normalize_referral_code("ABCD-123").is_err());
    }
}
