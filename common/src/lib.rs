// Allow some clippy lints kept consistent with the daemon crate
#![allow(clippy::module_inception)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::upper_case_acronyms)]

pub mod account;
pub mod api;
pub mod config;
pub mod error;
pub mod id;
pub mod referral;
pub mod time;
pub mod transaction;
pub mod utils;
