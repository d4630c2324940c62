use serde::{Deserialize, Serialize};

use crate::{
    config::DEFAULT_CURRENCY,
    error::BalanceError,
    id::UserId,
    time::{get_current_time_in_millis, TimestampMillis},
};

/// Cash account of a user, exactly one per user.
///
/// All counters are unsigned: `balance` and `pending_withdrawals`
/// can never go negative, a mutation that would underflow is rejected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WalletAccount {
    pub user: UserId,
    /// Spendable balance in fiat minor units
    pub balance: u64,
    /// Lifetime credited amount
    pub total_credited: u64,
    /// Lifetime debited amount
    pub total_debited: u64,
    /// Funds removed from the balance for withdrawals not yet settled
    pub pending_withdrawals: u64,
    pub currency: String,
    pub created_at: TimestampMillis,
    pub updated_at: TimestampMillis,
}

impl WalletAccount {
    /// Create an empty account for a user
    pub fn new(user: UserId) -> Self {
        let now = get_current_time_in_millis();
        Self {
            user,
            balance: 0,
            total_credited: 0,
            total_debited: 0,
            pending_withdrawals: 0,
            currency: DEFAULT_CURRENCY.to_owned(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }
}

/// Every way a wallet account can change.
/// The storage layer applies one mutation per atomic conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountMutation {
    /// balance += amount, total_credited += amount
    Credit(u64),
    /// balance -= amount, total_debited += amount
    Debit(u64),
    /// balance -= amount, pending_withdrawals += amount
    ReserveWithdrawal(u64),
    /// pending_withdrawals -= amount, total_debited += amount
    SettleWithdrawal(u64),
    /// pending_withdrawals -= amount, balance += amount
    ReleaseWithdrawal(u64),
}

impl AccountMutation {
    pub fn amount(&self) -> u64 {
        match self {
            Self::Credit(amount)
            | Self::Debit(amount)
            | Self::ReserveWithdrawal(amount)
            | Self::SettleWithdrawal(amount)
            | Self::ReleaseWithdrawal(amount) => *amount,
        }
    }

    /// Apply the mutation in place.
    /// On error the account is left exactly as it was.
    pub fn apply(&self, account: &mut WalletAccount) -> Result<(), BalanceError> {
        let amount = self.amount();
        if amount == 0 {
            return Err(BalanceError::ZeroAmount);
        }

        match self {
            Self::Credit(_) => {
                let balance = account
                    .balance
                    .checked_add(amount)
                    .ok_or(BalanceError::Overflow)?;
                let total_credited = account
                    .total_credited
                    .checked_add(amount)
                    .ok_or(BalanceError::Overflow)?;
                account.balance = balance;
                account.total_credited = total_credited;
            }
            Self::Debit(_) => {
                let balance = account.balance.checked_sub(amount).ok_or(
                    BalanceError::InsufficientFunds {
                        need: amount,
                        have: account.balance,
                    },
                )?;
                let total_debited = account
                    .total_debited
                    .checked_add(amount)
                    .ok_or(BalanceError::Overflow)?;
                account.balance = balance;
                account.total_debited = total_debited;
            }
            Self::ReserveWithdrawal(_) => {
                let balance = account.balance.checked_sub(amount).ok_or(
                    BalanceError::InsufficientFunds {
                        need: amount,
                        have: account.balance,
                    },
                )?;
                let pending = account
                    .pending_withdrawals
                    .checked_add(amount)
                    .ok_or(BalanceError::Overflow)?;
                account.balance = balance;
                account.pending_withdrawals = pending;
            }
            Self::SettleWithdrawal(_) => {
                let total_debited = account
                    .total_debited
                    .checked_add(amount)
                    .ok_or(BalanceError::Overflow)?;
                account.pending_withdrawals = account.pending_withdrawals.saturating_sub(amount);
                account.total_debited = total_debited;
            }
            Self::ReleaseWithdrawal(_) => {
                let balance = account
                    .balance
                    .checked_add(amount)
                    .ok_or(BalanceError::Overflow)?;
                account.pending_withdrawals = account.pending_withdrawals.saturating_sub(amount);
                account.balance = balance;
            }
        }

        account.updated_at = get_current_time_in_millis();
        Ok(())
    }
}
