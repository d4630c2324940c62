use thiserror::Error;

/// Pure arithmetic failures raised while mutating a balance record.
/// No record is written when one of these is returned.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum BalanceError {
    #[error("Balance overflow")]
    Overflow,

    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Insufficient funds: need {need}, have {have}")]
    InsufficientFunds { need: u64, have: u64 },

    #[error("Insufficient tokens: need {need}, have {have}")]
    InsufficientTokens { need: u64, have: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BalanceError::InsufficientFunds { need: 500, have: 20 };
        assert_eq!(err.to_string(), "Insufficient funds: need 500, have 20");

        let err = BalanceError::InsufficientTokens { need: 7, have: 1 };
        assert_eq!(err.to_string(), "Insufficient tokens: need 7, have 1");
    }
}
