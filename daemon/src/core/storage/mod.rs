mod providers;

pub mod sled;

pub use self::{providers::*, sled::SledStorage};

use crate::core::error::LedgerError;
use async_trait::async_trait;

#[async_trait]
pub trait Storage:
    AccountProvider
    + HoldingProvider
    + WalletTransactionProvider
    + IcoTransactionProvider
    + OrderProvider
    + ReferralProvider
    + EarningProvider
    + CorrelationProvider
    + Sync
    + Send
    + 'static
{
    // Flush pending writes to disk, returns the number of bytes flushed
    async fn flush(&self) -> Result<usize, LedgerError>;
}
