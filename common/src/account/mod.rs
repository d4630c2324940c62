mod holding;
mod wallet;

pub use holding::{HoldingMutation, IcoHolding};
pub use wallet::{AccountMutation, WalletAccount};
