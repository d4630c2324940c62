mod providers;

use crate::{
    config::MAX_CAS_RETRIES,
    core::{error::LedgerError, storage::Storage},
};
use async_trait::async_trait;
use log::{debug, info, trace};
use serde::{de::DeserializeOwned, Serialize};
use sled::{Db, Tree};

// Tree names, also used as labels in logs and metrics
pub(crate) const WALLET_ACCOUNTS: &str = "wallet_accounts";
pub(crate) const HOLDINGS: &str = "holdings";
pub(crate) const WALLET_TRANSACTIONS: &str = "wallet_transactions";
pub(crate) const ICO_TRANSACTIONS: &str = "ico_transactions";
pub(crate) const ORDERS: &str = "orders";
pub(crate) const REFERRAL_PROFILES: &str = "referral_profiles";
pub(crate) const REFERRAL_CODES: &str = "referral_codes";
pub(crate) const REFERRAL_EARNINGS: &str = "referral_earnings";
pub(crate) const REFERRAL_EARNING_IDS: &str = "referral_earning_ids";
pub(crate) const CORRELATIONS: &str = "correlations";

/// Outcome of the closure given to `SledStorage::update_with`
pub(crate) enum Update<T, R> {
    // Write the new value, then return R
    Write(T, R),
    // Leave the stored value as is
    Keep(R),
}

pub struct SledStorage {
    db: Db,
    // wallet account per user id
    wallet_accounts: Tree,
    // token holding per user id
    holdings: Tree,
    wallet_transactions: Tree,
    ico_transactions: Tree,
    orders: Tree,
    // referral profile per user id
    referral_profiles: Tree,
    // referral code => user id
    referral_codes: Tree,
    // source id ++ earner id => earning
    referral_earnings: Tree,
    // earning id => key in referral_earnings
    referral_earning_ids: Tree,
    // merchant transaction id => correlation target
    correlations: Tree,
}

impl SledStorage {
    pub fn new(dir_path: String, cache_size: Option<u64>) -> Result<Self, LedgerError> {
        info!("Opening database at {}", dir_path);
        let mut config = sled::Config::new().path(&dir_path);
        if let Some(size) = cache_size {
            config = config.cache_capacity(size);
        }

        let db = config.open()?;
        Self::from_db(db)
    }

    // Database living only as long as this instance
    pub fn temporary() -> Result<Self, LedgerError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> Result<Self, LedgerError> {
        Ok(Self {
            wallet_accounts: db.open_tree(WALLET_ACCOUNTS)?,
            holdings: db.open_tree(HOLDINGS)?,
            wallet_transactions: db.open_tree(WALLET_TRANSACTIONS)?,
            ico_transactions: db.open_tree(ICO_TRANSACTIONS)?,
            orders: db.open_tree(ORDERS)?,
            referral_profiles: db.open_tree(REFERRAL_PROFILES)?,
            referral_codes: db.open_tree(REFERRAL_CODES)?,
            referral_earnings: db.open_tree(REFERRAL_EARNINGS)?,
            referral_earning_ids: db.open_tree(REFERRAL_EARNING_IDS)?,
            correlations: db.open_tree(CORRELATIONS)?,
            db,
        })
    }

    pub(crate) fn load_optional_from_disk<T: DeserializeOwned>(
        tree: &Tree,
        key: &[u8],
    ) -> Result<Option<T>, LedgerError> {
        match tree.get(key)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    pub(crate) fn insert_into_disk<T: Serialize>(
        tree: &Tree,
        key: &[u8],
        value: &T,
    ) -> Result<(), LedgerError> {
        tree.insert(key, bincode::serialize(value)?)?;
        Ok(())
    }

    // Decode every value of a tree
    pub(crate) fn scan_tree<T: DeserializeOwned>(tree: &Tree) -> Result<Vec<T>, LedgerError> {
        tree.iter()
            .values()
            .map(|res| -> Result<T, LedgerError> {
                let bytes = res?;
                Ok(bincode::deserialize(&bytes)?)
            })
            .collect()
    }

    /// Read-modify-write loop over a single key.
    ///
    /// `f` receives the decoded current value and decides what to write.
    /// The write only succeeds if the stored bytes are still those that were read,
    /// otherwise `f` is called again with the fresh value.
    pub(crate) fn update_with<T, R, F>(
        tree: &Tree,
        name: &'static str,
        key: &[u8],
        mut f: F,
    ) -> Result<R, LedgerError>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut(Option<T>) -> Result<Update<T, R>, LedgerError>,
    {
        for attempt in 0..MAX_CAS_RETRIES {
            let current = tree.get(key)?;
            let value = match &current {
                Some(bytes) => Some(bincode::deserialize(bytes)?),
                None => None,
            };

            let (value, result) = match f(value)? {
                Update::Keep(result) => return Ok(result),
                Update::Write(value, result) => (value, result),
            };

            let encoded = bincode::serialize(&value)?;
            match tree.compare_and_swap(key, current.as_ref(), Some(encoded))? {
                Ok(()) => return Ok(result),
                Err(_) => {
                    metrics::counter!("meridian_ledger_conflicts_total", "tree" => name)
                        .increment(1);
                    if log::log_enabled!(log::Level::Trace) {
                        trace!(
                            "conflicting write in {} for key {}, attempt {}",
                            name,
                            hex::encode(key),
                            attempt
                        );
                    }
                }
            }
        }

        debug!("giving up on {} after {} attempts", name, MAX_CAS_RETRIES);
        Err(LedgerError::Contention(name))
    }
}

#[async_trait]
impl Storage for SledStorage {
    async fn flush(&self) -> Result<usize, LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("flush sled database");
        }
        Ok(self.db.flush_async().await?)
    }
}
