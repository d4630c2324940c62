mod account;
mod correlation;
mod earning;
mod holding;
mod ico_transaction;
mod order;
mod referral;
mod wallet_transaction;
