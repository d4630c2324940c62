use serde::{Deserialize, Serialize};

use crate::{
    error::BalanceError,
    id::UserId,
    time::{get_current_time_in_millis, TimestampMillis},
};

/// Token holding of a user, in token atomic units
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IcoHolding {
    pub user: UserId,
    pub balance: u64,
    pub updated_at: TimestampMillis,
}

impl IcoHolding {
    pub fn new(user: UserId) -> Self {
        Self {
            user,
            balance: 0,
            updated_at: get_current_time_in_millis(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldingMutation {
    Increment(u64),
    Decrement(u64),
}

impl HoldingMutation {
    pub fn apply(&self, holding: &mut IcoHolding) -> Result<(), BalanceError> {
        match *self {
            Self::Increment(0) | Self::Decrement(0) => return Err(BalanceError::ZeroAmount),
            Self::Increment(tokens) => {
                holding.balance = holding
                    .balance
                    .checked_add(tokens)
                    .ok_or(BalanceError::Overflow)?;
            }
            Self::Decrement(tokens) => {
                holding.balance =
                    holding
                        .balance
                        .checked_sub(tokens)
                        .ok_or(BalanceError::InsufficientTokens {
                            need: tokens,
                            have: holding.balance,
                        })?;
            }
        }

        holding.updated_at = get_current_time_in_millis();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::Id;

    #[test]
    fn test_increment_then_decrement() {
        let mut holding = IcoHolding::new(Id::random());
        HoldingMutation::Increment(50).apply(&mut holding).unwrap();
        HoldingMutation::Decrement(20).apply(&mut holding).unwrap();
        assert_eq!(holding.balance, 30);
    }

    #[test]
    fn test_decrement_insufficient() {
        let mut holding = IcoHolding::new(Id::random());
        HoldingMutation::Increment(5).apply(&mut holding).unwrap();

        let err = HoldingMutation::Decrement(6).apply(&mut holding).unwrap_err();
        assert_eq!(err, BalanceError::InsufficientTokens { need: 6, have: 5 });
        assert_eq!(holding.balance, 5);
    }
}
