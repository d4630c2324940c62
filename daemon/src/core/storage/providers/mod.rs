mod account;
mod correlation;
mod earning;
mod holding;
mod ico_transaction;
mod order;
mod referral;
mod wallet_transaction;

pub use account::*;
pub use correlation::*;
pub use earning::*;
pub use holding::*;
pub use ico_transaction::*;
pub use order::*;
pub use referral::*;
pub use wallet_transaction::*;
