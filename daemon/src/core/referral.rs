// Multi-level referral commission engine
//
// Registration binds a user below a referrer once and caches the ancestor
// path on the profile. Each paid purchase pays every ancestor up to the
// configured depth a share of the gross amount. An earning is unique per
// (source, earner), so repeated or concurrent deliveries pay each ancestor once.

use std::sync::Arc;

use log::{debug, error, info, trace, warn};
use meridian_common::{
    api::{daemon::RedeemResult, Page, Pagination},
    config::MAX_REFERRAL_DEPTH,
    id::{Id, UserId},
    referral::{
        generate_referral_code, normalize_referral_code, CommissionFailure, DistributionReport,
        EarningFilter, EarningStatus, ProfileMutation, ReferralEarning, ReferralError,
        ReferralProfile, ReferralRates, ReferralSummary, RewardDistribution, SourceType,
    },
    time::get_current_time_in_millis,
    transaction::{TransactionCategory, TransactionStatus, TransactionType, WalletTransaction},
    utils::apply_basis_points,
};

use crate::{
    config::MAX_REFERRAL_CODE_ATTEMPTS,
    core::{
        error::LedgerError, ledger::AccountLedger, storage::Storage,
        transaction_log::TransactionLog,
    },
};

pub struct ReferralEngine<S: Storage> {
    storage: Arc<S>,
    ledger: AccountLedger<S>,
    log: TransactionLog<S>,
    rates: ReferralRates,
    max_depth: u8,
}

impl<S: Storage> Clone for ReferralEngine<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            ledger: self.ledger.clone(),
            log: self.log.clone(),
            rates: self.rates.clone(),
            max_depth: self.max_depth,
        }
    }
}

impl<S: Storage> ReferralEngine<S> {
    pub fn new(
        storage: Arc<S>,
        ledger: AccountLedger<S>,
        log: TransactionLog<S>,
        rates: ReferralRates,
        max_depth: u8,
    ) -> Result<Self, LedgerError> {
        rates.validate()?;
        Ok(Self {
            storage,
            ledger,
            log,
            rates,
            max_depth: max_depth.min(MAX_REFERRAL_DEPTH),
        })
    }

    pub fn rates(&self) -> &ReferralRates {
        &self.rates
    }

    // Deepest ancestor paid
    fn depth_limit(&self) -> u8 {
        self.max_depth.min(self.rates.levels())
    }

    /// Pay the ancestors of `buyer` their share of `gross_amount`.
    ///
    /// Failures on one ancestor do not stop the others, they are reported
    /// in the returned distribution report.
    pub async fn distribute(
        &self,
        buyer: &UserId,
        gross_amount: u64,
        source_type: SourceType,
        source_id: &Id,
    ) -> Result<DistributionReport, LedgerError> {
        let mut report = DistributionReport::default();
        if gross_amount == 0 {
            return Ok(report);
        }

        let Some(profile) = self.storage.get_referral_profile(buyer).await? else {
            if log::log_enabled!(log::Level::Trace) {
                trace!("{} has no referral profile, no commission", buyer);
            }
            return Ok(report);
        };

        let limit = self.depth_limit();
        for (depth, earner) in profile.ancestors().take_while(|(depth, _)| *depth <= limit) {
            let Some(rate) = self.rates.rate(depth) else {
                break;
            };
            let amount = apply_basis_points(gross_amount, rate);
            if amount == 0 {
                continue;
            }

            let earning =
                ReferralEarning::new(*earner, *buyer, source_type, *source_id, depth, amount);
            match self.pay(&earning).await {
                Ok(true) => report.push_distribution(RewardDistribution {
                    earning_id: earning.id,
                    recipient: *earner,
                    amount,
                    depth,
                }),
                Ok(false) => {
                    if log::log_enabled!(log::Level::Debug) {
                        debug!(
                            "{} already paid for {} {}, skipping",
                            earner, source_type, source_id
                        );
                    }
                    report.skipped.push(*earner);
                }
                Err(e) => {
                    warn!(
                        "commission of {} for {} at depth {} on {} {} failed: {}",
                        amount, earner, depth, source_type, source_id, e
                    );
                    metrics::counter!("meridian_commission_failures_total").increment(1);
                    report.failures.push(CommissionFailure {
                        earner: *earner,
                        depth,
                        error: e.to_string(),
                    });
                }
            }
        }

        if !report.distributions.is_empty() {
            info!(
                "distributed {} to {} ancestors of {} for {} {}",
                report.total_distributed,
                report.levels_rewarded(),
                buyer,
                source_type,
                source_id
            );
        }
        Ok(report)
    }

    // Store the earning together with the credit to its earner
    // Returns false if this earner was already paid for the source
    async fn pay(&self, earning: &ReferralEarning) -> Result<bool, LedgerError> {
        self.storage.record_earning(earning).await
    }

    /// Create the referral profile of `user`, optionally below the owner of `referral_code`.
    pub async fn register_profile(
        &self,
        user: &UserId,
        referral_code: Option<&str>,
    ) -> Result<ReferralProfile, LedgerError> {
        if self.storage.get_referral_profile(user).await?.is_some() {
            return Err(ReferralError::AlreadyRegistered.into());
        }

        let referrer = match referral_code.map(str::trim).filter(|code| !code.is_empty()) {
            Some(code) => Some(self.find_referrer(code).await?),
            None => None,
        };

        let code = self.allocate_code(user).await?;
        let profile = match &referrer {
            Some(referrer) => ReferralProfile::with_referrer(*user, code.clone(), referrer),
            None => ReferralProfile::new(*user, code.clone()),
        };

        if !self.storage.insert_referral_profile(&profile).await? {
            self.storage.release_referral_code(&code).await?;
            return Err(ReferralError::AlreadyRegistered.into());
        }

        for (depth, ancestor) in profile.ancestors() {
            if let Err(e) = self
                .storage
                .update_referral_profile(ancestor, ProfileMutation::AddDownline(depth))
                .await
            {
                warn!(
                    "could not count {} in the downline of {} at depth {}: {}",
                    user, ancestor, depth, e
                );
            }
        }

        info!(
            "registered {} with code {} at level {}",
            user, profile.referral_code, profile.referral_level
        );
        Ok(profile)
    }

    async fn find_referrer(&self, code: &str) -> Result<ReferralProfile, LedgerError> {
        let code = normalize_referral_code(code)?;
        let referrer = self
            .storage
            .get_user_by_referral_code(&code)
            .await?
            .ok_or(ReferralError::ReferrerNotFound)?;

        Ok(self
            .storage
            .get_referral_profile(&referrer)
            .await?
            .ok_or(ReferralError::ReferrerNotFound)?)
    }

    async fn allocate_code(&self, user: &UserId) -> Result<String, LedgerError> {
        for _ in 0..MAX_REFERRAL_CODE_ATTEMPTS {
            let code = generate_referral_code();
            if self.storage.reserve_referral_code(&code, user).await? {
                return Ok(code);
            }
        }
        Err(ReferralError::CodeExhausted.into())
    }

    pub async fn profile(&self, user: &UserId) -> Result<Option<ReferralProfile>, LedgerError> {
        self.storage.get_referral_profile(user).await
    }

    pub async fn summary(&self, user: &UserId) -> Result<ReferralSummary, LedgerError> {
        let profile = self
            .storage
            .get_referral_profile(user)
            .await?
            .ok_or(ReferralError::UserNotFound)?;
        Ok(ReferralSummary::from(&profile))
    }

    pub async fn all_earnings(
        &self,
        filter: &EarningFilter,
    ) -> Result<Vec<ReferralEarning>, LedgerError> {
        self.storage.get_earnings(filter).await
    }

    pub async fn list_earnings(
        &self,
        filter: &EarningFilter,
        pagination: Pagination,
    ) -> Result<Page<ReferralEarning>, LedgerError> {
        let earnings = self.storage.get_earnings(filter).await?;
        Ok(pagination.paginate(earnings))
    }

    pub async fn update_earning_status(
        &self,
        id: &Id,
        status: EarningStatus,
    ) -> Result<ReferralEarning, LedgerError> {
        let earning = self.storage.set_earning_status(id, status).await?;
        info!("earning {} set to {}", id, status);
        Ok(earning)
    }

    /// Move the whole referral balance of `user` to their cash wallet.
    pub async fn redeem(&self, user: &UserId) -> Result<RedeemResult, LedgerError> {
        let profile = self
            .storage
            .get_referral_profile(user)
            .await?
            .ok_or(ReferralError::UserNotFound)?;

        let amount = profile.referral_wallet_balance;
        if amount == 0 {
            return Err(LedgerError::NothingToRedeem);
        }

        let cutoff = get_current_time_in_millis();
        // A concurrent redemption already emptied the balance
        match self
            .storage
            .update_referral_profile(user, ProfileMutation::Redeem(amount))
            .await
        {
            Err(LedgerError::InsufficientFunds { .. }) => return Err(LedgerError::NothingToRedeem),
            res => res?,
        };

        let wallet = match self.ledger.credit(user, amount).await {
            Ok(wallet) => wallet,
            Err(e) => {
                warn!("could not credit redemption of {} to {}, restoring: {}", amount, user, e);
                if let Err(restore) = self
                    .storage
                    .update_referral_profile(user, ProfileMutation::Restore(amount))
                    .await
                {
                    error!(
                        "referral balance {} of {} could not be restored: {}",
                        amount, user, restore
                    );
                    metrics::counter!("meridian_ledger_effect_failures_total", "operation" => "redeem")
                        .increment(1);
                }
                return Err(e);
            }
        };
        let tx = WalletTransaction::new(
            *user,
            TransactionType::Credit,
            TransactionCategory::Adjustment,
            amount,
            TransactionStatus::Pending,
        )
        .with_currency(self.ledger.currency())
        .with_description("Referral earnings redemption")
        .with_metadata("source", "referral");
        let transaction = self.log.record_completed_wallet(tx).await?;
        let redeemed_earnings = self.storage.mark_earnings_redeemed(user, cutoff).await?;

        info!(
            "{} redeemed {} of referral earnings ({} earnings)",
            user, amount, redeemed_earnings
        );
        Ok(RedeemResult {
            amount,
            wallet,
            transaction: transaction.sanitized(),
            redeemed_earnings,
        })
    }
}
