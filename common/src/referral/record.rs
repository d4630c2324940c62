// Referral record data structures

use serde::{Deserialize, Serialize};

use crate::{
    config::{DOWNLINE_COUNTS_SIZE, MAX_REFERRAL_DEPTH},
    error::BalanceError,
    id::{Id, UserId},
    time::{get_current_time_in_millis, TimestampMillis},
};

/// Referral part of a user account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReferralProfile {
    pub user: UserId,

    /// Unique uppercase code shared with invitees
    pub referral_code: String,

    /// Direct referrer (None = top-level user)
    pub referred_by: Option<UserId>,

    /// Ancestors ordered from the direct referrer to higher levels
    pub referral_path: Vec<UserId>,

    /// Depth in the tree, equal to the path length
    pub referral_level: u8,

    /// Descendant counts indexed by relative depth, index 0 is unused
    pub referral_downline_counts: [u64; DOWNLINE_COUNTS_SIZE],

    /// Redeemable commission total
    pub referral_wallet_balance: u64,

    /// Lifetime commission total
    pub referral_total_earned: u64,

    pub created_at: TimestampMillis,
}

impl ReferralProfile {
    /// Create a top-level profile
    pub fn new(user: UserId, referral_code: String) -> Self {
        Self {
            user,
            referral_code,
            referred_by: None,
            referral_path: Vec::new(),
            referral_level: 0,
            referral_downline_counts: [0; DOWNLINE_COUNTS_SIZE],
            referral_wallet_balance: 0,
            referral_total_earned: 0,
            created_at: get_current_time_in_millis(),
        }
    }

    /// Create a profile below `referrer`, inheriting its path
    pub fn with_referrer(user: UserId, referral_code: String, referrer: &ReferralProfile) -> Self {
        let mut referral_path = Vec::with_capacity(MAX_REFERRAL_DEPTH as usize);
        referral_path.push(referrer.user);
        referral_path.extend(referrer.referral_path.iter().copied());
        referral_path.truncate(MAX_REFERRAL_DEPTH as usize);

        let mut profile = Self::new(user, referral_code);
        profile.referred_by = Some(referrer.user);
        profile.referral_level = referral_path.len() as u8;
        profile.referral_path = referral_path;
        profile
    }

    /// Check if this user has a referrer
    pub fn has_referrer(&self) -> bool {
        self.referred_by.is_some()
    }

    /// Ancestors paired with their 1-indexed relative depth, nearest first
    pub fn ancestors(&self) -> impl Iterator<Item = (u8, &UserId)> {
        self.referral_path
            .iter()
            .enumerate()
            .map(|(i, user)| (i as u8 + 1, user))
    }

    /// Total number of descendants within the tracked depth
    pub fn total_downline(&self) -> u64 {
        self.referral_downline_counts.iter().skip(1).sum()
    }
}

/// Every way a stored profile changes after registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileMutation {
    /// A new descendant registered at this relative depth
    AddDownline(u8),
    /// Commission earned: balance and lifetime total grow
    CreditCommission(u64),
    /// Balance moved to the cash wallet
    Redeem(u64),
    /// Redeemed balance given back when the wallet could not receive it
    Restore(u64),
}

impl ProfileMutation {
    pub fn apply(&self, profile: &mut ReferralProfile) -> Result<(), BalanceError> {
        match *self {
            Self::AddDownline(0) => return Err(BalanceError::ZeroAmount),
            Self::AddDownline(depth) => {
                // Descendants deeper than the tracked depth are not counted
                if let Some(counter) = profile.referral_downline_counts.get_mut(depth as usize) {
                    *counter = counter.saturating_add(1);
                }
            }
            Self::CreditCommission(0) | Self::Redeem(0) | Self::Restore(0) => {
                return Err(BalanceError::ZeroAmount)
            }
            Self::CreditCommission(amount) => {
                let balance = profile
                    .referral_wallet_balance
                    .checked_add(amount)
                    .ok_or(BalanceError::Overflow)?;
                let total = profile
                    .referral_total_earned
                    .checked_add(amount)
                    .ok_or(BalanceError::Overflow)?;
                profile.referral_wallet_balance = balance;
                profile.referral_total_earned = total;
            }
            Self::Redeem(amount) => {
                profile.referral_wallet_balance = profile
                    .referral_wallet_balance
                    .checked_sub(amount)
                    .ok_or(BalanceError::InsufficientFunds {
                        need: amount,
                        have: profile.referral_wallet_balance,
                    })?;
            }
            Self::Restore(amount) => {
                profile.referral_wallet_balance = profile
                    .referral_wallet_balance
                    .checked_add(amount)
                    .ok_or(BalanceError::Overflow)?;
            }
        }
        Ok(())
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SourceType {
    Order,
    Ico,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EarningStatus {
    Credited,
    Redeemed,
    Cancelled,
}

/// Commission paid to one ancestor for one triggering purchase.
/// At most one exists per (source_id, earner).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReferralEarning {
    pub id: Id,
    pub earner: UserId,
    /// Buyer whose purchase produced the commission
    pub source_user: UserId,
    pub source_type: SourceType,
    pub source_id: Id,
    /// 1 = direct referrer
    pub depth: u8,
    pub amount: u64,
    pub status: EarningStatus,
    pub created_at: TimestampMillis,
    pub updated_at: TimestampMillis,
}

impl ReferralEarning {
    pub fn new(
        earner: UserId,
        source_user: UserId,
        source_type: SourceType,
        source_id: Id,
        depth: u8,
        amount: u64,
    ) -> Self {
        let now = get_current_time_in_millis();
        Self {
            id: Id::random(),
            earner,
            source_user,
            source_type,
            source_id,
            depth,
            amount,
            status: EarningStatus::Credited,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Listing filter for earnings, every `None` field matches everything
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningFilter {
    pub earner: Option<UserId>,
    pub source_user: Option<UserId>,
    pub status: Option<EarningStatus>,
    pub source_type: Option<SourceType>,
    pub depth: Option<u8>,
}

impl EarningFilter {
    pub fn for_earner(earner: UserId) -> Self {
        Self {
            earner: Some(earner),
            ..Default::default()
        }
    }

    pub fn matches(&self, earning: &ReferralEarning) -> bool {
        self.earner.map_or(true, |earner| earning.earner == earner)
            && self.source_user.map_or(true, |user| earning.source_user == user)
            && self.status.map_or(true, |status| earning.status == status)
            && self.source_type.map_or(true, |kind| earning.source_type == kind)
            && self.depth.map_or(true, |depth| earning.depth == depth)
    }
}

/// Reward distribution entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RewardDistribution {
    pub earning_id: Id,
    pub recipient: UserId,
    pub amount: u64,
    /// 1 = immediate referrer, 2 = referrer's referrer, etc.
    pub depth: u8,
}

/// Commission that could not be credited to one ancestor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommissionFailure {
    pub earner: UserId,
    pub depth: u8,
    pub error: String,
}

/// Result of a commission fan-out
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DistributionReport {
    /// Earnings created by this call
    pub distributions: Vec<RewardDistribution>,
    /// Ancestors already paid for this source
    pub skipped: Vec<UserId>,
    pub failures: Vec<CommissionFailure>,
    pub total_distributed: u64,
}

impl DistributionReport {
    pub fn push_distribution(&mut self, distribution: RewardDistribution) {
        self.total_distributed = self.total_distributed.saturating_add(distribution.amount);
        self.distributions.push(distribution);
    }

    /// Number of levels that received rewards
    pub fn levels_rewarded(&self) -> u8 {
        self.distributions.len() as u8
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Referral overview returned to the profile owner
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReferralSummary {
    pub referral_code: String,
    pub referred_by: Option<UserId>,
    pub referral_level: u8,
    pub downline_counts: [u64; DOWNLINE_COUNTS_SIZE],
    pub total_downline: u64,
    pub wallet_balance: u64,
    pub total_earned: u64,
}

impl From<&ReferralProfile> for ReferralSummary {
    fn from(profile: &ReferralProfile) -> Self {
        Self {
            referral_code: profile.referral_code.clone(),
            referred_by: profile.referred_by,
            referral_level: profile.referral_level,
            downline_counts: profile.referral_downline_counts,
            total_downline: profile.total_downline(),
            wallet_balance: profile.referral_wallet_balance,
            total_earned: profile.referral_total_earned,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> ReferralProfile {
        ReferralProfile::new(Id::random(), "ROOT0001".to_owned())
    }

    #[test]
    fn test_profile_no_referrer() {
        let root = profile();
        assert!(!root.has_referrer());
        assert_eq!(root.referral_level, 0);
        assert_eq!(root.ancestors().count(), 0);
    }

    #[test]
    fn test_path_nearest_first() {
        let root = profile();
        let child = ReferralProfile::with_referrer(Id::random(), "CHILD001".into(), &root);
        let grandchild = ReferralProfile::with_referrer(Id::random(), "GRAND001".into(), &child);

        assert_eq!(grandchild.referred_by, Some(child.user));
        assert_eq!(grandchild.referral_path, vec![child.user, root.user]);
        assert_eq!(grandchild.referral_level, 2);

        let ancestors: Vec<_> = grandchild.ancestors().collect();
        assert_eq!(ancestors, vec![(1, &child.user), (2, &root.user)]);
    }

    #[test]
    fn test_path_truncated_at_max_depth() {
        let mut current = profile();
        for i in 0..12 {
            current = ReferralProfile::with_referrer(Id::random(), format!("CODE{:04}", i), &current);
        }
        assert_eq!(current.referral_path.len(), MAX_REFERRAL_DEPTH as usize);
        assert_eq!(current.referral_level, MAX_REFERRAL_DEPTH);
    }

    #[test]
    fn test_profile_mutations() {
        let mut root = profile();
        ProfileMutation::AddDownline(1).apply(&mut root).unwrap();
        ProfileMutation::AddDownline(3).apply(&mut root).unwrap();
        assert_eq!(root.total_downline(), 2);
        assert!(ProfileMutation::AddDownline(0).apply(&mut root).is_err());

        ProfileMutation::CreditCommission(150).apply(&mut root).unwrap();
        ProfileMutation::Redeem(100).apply(&mut root).unwrap();
        assert_eq!(root.referral_wallet_balance, 50);
        assert_eq!(root.referral_total_earned, 150);

        assert_eq!(
            ProfileMutation::Redeem(51).apply(&mut root),
            Err(BalanceError::InsufficientFunds { need: 51, have: 50 })
        );

        ProfileMutation::Restore(100).apply(&mut root).unwrap();
        assert_eq!(root.referral_wallet_balance, 150);
        assert_eq!(root.referral_total_earned, 150);
    }

    #[test]
    fn test_distribution_report() {
        let mut report = DistributionReport::default();
        report.push_distribution(RewardDistribution {
            earning_id: Id::random(),
            recipient: Id::random(),
            amount: 100,
            depth: 1,
        });
        report.push_distribution(RewardDistribution {
            earning_id: Id::random(),
            recipient: Id::random(),
            amount: 50,
            depth: 2,
        });
        assert_eq!(report.total_distributed, 150);
        assert_eq!(report.levels_rewarded(), 2);
        assert!(!report.has_failures());
    }
}
