pub mod admin;
pub mod backend;
pub mod config;
pub mod error;
pub mod ico;
pub mod ledger;
pub mod order;
pub mod payment;
pub mod referral;
pub mod storage;
pub mod transaction_log;
pub mod wallet;
